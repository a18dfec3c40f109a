use log::{debug, info, warn};

use crate::config::{Config, LANE_SPACING, LANE_WIDTH, MISS_WINDOW_MS, NOTE_HEIGHT, PLAYFIELD_CENTER_X, SCREEN_HEIGHT};
use crate::core::skin::{GeneratedSkin, SkinFlags, SkinProvider};
use crate::core::sprite::SpriteHost;
use crate::game::chart::Chart;
use crate::game::hit_object::{HitObject, NoteState};
use crate::game::note::HitObjectInfo;
use crate::game::position::FieldLayout;
use crate::game::scroll::ScrollState;
use crate::game::timing::TrackClock;

/// One judgement lane and the hit objects that travel down it, in start order.
#[derive(Debug)]
pub struct Lane {
    pub index: usize,
    pub x: f32,
    objects: Vec<HitObject>,
}

impl Lane {
    pub fn objects(&self) -> &[HitObject] {
        &self.objects
    }

    /// Earliest pending object whose window has not closed at `time`.
    fn next_pending(&mut self, time: f64) -> Option<&mut HitObject> {
        self.objects
            .iter_mut()
            .find(|o| o.state() == NoteState::Pending && o.info().start_time + MISS_WINDOW_MS >= time)
    }

    fn held(&mut self) -> Option<&mut HitObject> {
        self.objects.iter_mut().find(|o| o.state() == NoteState::Held)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayfieldStats {
    pub pending: usize,
    pub held: usize,
    pub hit: usize,
    pub missed: usize,
    pub let_go: usize,
}

impl PlayfieldStats {
    pub fn total(&self) -> usize {
        self.pending + self.held + self.hit + self.missed + self.let_go
    }
}

/// Left edge X of every lane, centred on the playfield.
pub fn lane_positions(key_count: usize) -> Vec<f32> {
    let total = key_count as f32 * LANE_WIDTH + key_count.saturating_sub(1) as f32 * LANE_SPACING;
    let left = PLAYFIELD_CENTER_X - total / 2.0;
    (0..key_count).map(|i| left + i as f32 * (LANE_WIDTH + LANE_SPACING)).collect()
}

/// Creates one hit object per note. On failure every sprite created so far is
/// released before the error is returned.
fn spawn_objects(
    lanes: &mut [Lane],
    notes: &[HitObjectInfo],
    skin: &dyn SkinProvider,
    fallback: &GeneratedSkin,
    host: &mut dyn SpriteHost,
) -> Result<(), String> {
    for info in notes {
        let Some(x) = lanes.get(info.lane).map(|l| l.x) else {
            warn!("Skipping note in lane {} of a {}K field", info.lane, lanes.len());
            continue;
        };
        match HitObject::new(*info, x, LANE_WIDTH, skin, fallback, host) {
            Ok(obj) => lanes[info.lane].objects.push(obj),
            Err(e) => {
                for obj in lanes.iter_mut().flat_map(|l| l.objects.iter_mut()) {
                    obj.destroy(host);
                }
                return Err(e);
            }
        }
    }
    Ok(())
}

#[derive(Debug)]
pub struct Playfield {
    key_count: usize,
    lanes: Vec<Lane>,
    scroll: ScrollState,
    layout: FieldLayout,
    flags: SkinFlags,
    current_ms: f64,
    end_ms: f64,
    destroyed: bool,
}

impl Playfield {
    /// Builds lanes and one hit object per chart note.
    pub fn load(chart: &Chart, config: &Config, skin: &dyn SkinProvider, host: &mut dyn SpriteHost) -> Result<Self, String> {
        let key_count = chart.key_count;
        let direction = config.scroll_direction_for(key_count);
        let scroll = ScrollState::from_setting(config.scroll_speed_for(key_count), config.audio_rate, direction);
        let layout = FieldLayout::for_direction(direction, SCREEN_HEIGHT);
        let fallback = GeneratedSkin::new(key_count, LANE_WIDTH, NOTE_HEIGHT);

        let mut lanes: Vec<Lane> = lane_positions(key_count)
            .into_iter()
            .enumerate()
            .map(|(index, x)| Lane { index, x, objects: Vec::new() })
            .collect();

        spawn_objects(&mut lanes, &chart.hit_objects, skin, &fallback, host)?;

        info!(
            "Playfield ready: {}K, {} objects, speed {:.3}px/ms ({:.0}ms on screen), {}scroll",
            key_count,
            chart.hit_objects.len(),
            scroll.speed,
            scroll.travel_time_ms(layout.screen_height),
            direction
        );

        Ok(Self {
            key_count,
            lanes,
            scroll,
            layout,
            flags: skin.flags(),
            current_ms: f64::NEG_INFINITY,
            end_ms: chart.length_ms(),
            destroyed: false,
        })
    }

    pub fn key_count(&self) -> usize {
        self.key_count
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    pub fn current_ms(&self) -> f64 {
        self.current_ms
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn objects_mut(&mut self) -> impl Iterator<Item = &mut HitObject> {
        self.lanes.iter_mut().flat_map(|l| l.objects.iter_mut())
    }

    /// Per-frame update: judges notes whose windows have closed, then
    /// repositions every object for the clock's current time.
    pub fn update(&mut self, clock: &dyn TrackClock, host: &mut dyn SpriteHost) {
        if self.destroyed {
            return;
        }
        let now = clock.position_ms();
        self.current_ms = now;

        for obj in self.objects_mut() {
            let info = *obj.info();
            match obj.state() {
                NoteState::Pending if now > info.start_time + MISS_WINDOW_MS => obj.set_state(NoteState::Missed),
                // Held through the end without releasing.
                NoteState::Held if now > info.end_time + MISS_WINDOW_MS => obj.set_state(NoteState::Hit),
                _ => {}
            }
        }

        let (scroll, layout, flags) = (self.scroll, self.layout, self.flags);
        for obj in self.objects_mut() {
            obj.update(now, &scroll, &layout, flags, host);
        }
    }

    /// Handles a lane key press at `time`. Returns the new state of the note it
    /// landed on, if any.
    pub fn press(&mut self, lane: usize, time: f64) -> Option<NoteState> {
        let obj = self.lanes.get_mut(lane)?.next_pending(time)?;
        if (time - obj.info().start_time).abs() > MISS_WINDOW_MS {
            return None;
        }
        let state = if obj.is_long_note() { NoteState::Held } else { NoteState::Hit };
        obj.set_state(state);
        Some(state)
    }

    /// Handles a lane key release at `time`.
    pub fn release(&mut self, lane: usize, time: f64) -> Option<NoteState> {
        let obj = self.lanes.get_mut(lane)?.held()?;
        let state = if time >= obj.info().end_time - MISS_WINDOW_MS {
            NoteState::Hit
        } else {
            NoteState::LetGo
        };
        obj.set_state(state);
        Some(state)
    }

    /// Plays every note perfectly up to `time`: presses on start, releases on end.
    pub fn autoplay(&mut self, time: f64) {
        for lane in 0..self.lanes.len() {
            loop {
                if let Some(end) = self.lanes[lane].held().map(|o| o.info().end_time) {
                    if end > time {
                        break;
                    }
                    self.release(lane, end);
                    continue;
                }
                let next_start = self.lanes[lane]
                    .next_pending(time)
                    .map(|o| o.info().start_time)
                    .filter(|start| *start <= time);
                match next_start {
                    Some(start) => {
                        self.press(lane, start);
                    }
                    None => break,
                }
            }
        }
    }

    pub fn stats(&self) -> PlayfieldStats {
        let mut stats = PlayfieldStats::default();
        for obj in self.lanes.iter().flat_map(|l| l.objects.iter()) {
            match obj.state() {
                NoteState::Pending => stats.pending += 1,
                NoteState::Held => stats.held += 1,
                NoteState::Hit => stats.hit += 1,
                NoteState::Missed => stats.missed += 1,
                NoteState::LetGo => stats.let_go += 1,
            }
        }
        stats
    }

    /// True once the clock is past the last note and nothing awaits judgement.
    pub fn is_finished(&self) -> bool {
        let stats = self.stats();
        stats.pending == 0 && stats.held == 0 && self.current_ms > self.end_ms + MISS_WINDOW_MS
    }

    /// Releases every sprite. Called when the gameplay screen ends.
    pub fn destroy(&mut self, host: &mut dyn SpriteHost) {
        if self.destroyed {
            return;
        }
        let mut count = 0;
        for obj in self.objects_mut() {
            obj.destroy(host);
            count += 1;
        }
        debug!("Destroyed {} hit objects", count);
        self.destroyed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sprite::RecordingHost;
    use crate::game::chart;
    use crate::game::scroll::ScrollDirection;
    use crate::game::timing::ManualClock;

    const CHART: &str = r#"{
        "title": "Test",
        "keyCount": 4,
        "timingPoints": [{ "startTime": 0, "bpm": 120 }],
        "hitObjects": [
            { "startTime": 1000, "lane": 1 },
            { "startTime": 1000, "lane": 2, "endTime": 2000 },
            { "startTime": 1500, "lane": 1 },
            { "startTime": 3000, "lane": 4, "endTime": 3500 }
        ]
    }"#;

    fn setup(config: Config) -> (Playfield, RecordingHost) {
        let chart = chart::parse(CHART).unwrap();
        let mut host = RecordingHost::new();
        let skin = GeneratedSkin::new(4, LANE_WIDTH, NOTE_HEIGHT);
        let pf = Playfield::load(&chart, &config, &skin, &mut host).unwrap();
        (pf, host)
    }

    #[test]
    fn load_creates_sprites_per_object() {
        let (pf, host) = setup(Config::default());
        // Two taps (1 sprite each) and two LNs (3 each).
        assert_eq!(host.live_count(), 8);
        assert_eq!(pf.lanes().len(), 4);
        assert_eq!(pf.lanes()[0].objects().len(), 2);
        assert_eq!(pf.stats().pending, 4);
    }

    #[test]
    fn lanes_are_centred() {
        let xs = lane_positions(4);
        assert_eq!(xs.len(), 4);
        let right = xs[3] + LANE_WIDTH;
        assert!(((xs[0] + right) / 2.0 - PLAYFIELD_CENTER_X).abs() < 1e-3);
        assert!(xs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn press_and_release_judge_notes() {
        let (mut pf, _host) = setup(Config::default());
        assert_eq!(pf.press(0, 500.0), None);
        assert_eq!(pf.press(0, 1010.0), Some(NoteState::Hit));
        assert_eq!(pf.press(1, 990.0), Some(NoteState::Held));
        assert_eq!(pf.release(1, 1200.0), Some(NoteState::LetGo));
        assert_eq!(pf.release(1, 1300.0), None);
        assert_eq!(pf.press(9, 1000.0), None);
    }

    #[test]
    fn late_release_counts_as_hit() {
        let (mut pf, _host) = setup(Config::default());
        pf.press(1, 1000.0);
        assert_eq!(pf.release(1, 1950.0), Some(NoteState::Hit));
    }

    #[test]
    fn update_misses_expired_notes() {
        let (mut pf, mut host) = setup(Config::default());
        let clock = ManualClock::new(1000.0 + MISS_WINDOW_MS + 1.0);
        pf.update(&clock, &mut host);
        let stats = pf.stats();
        assert_eq!(stats.missed, 2);
        assert_eq!(stats.pending, 2);
    }

    #[test]
    fn held_note_completes_after_end() {
        let (mut pf, mut host) = setup(Config::default());
        pf.press(1, 1000.0);
        let clock = ManualClock::new(1500.0);
        pf.update(&clock, &mut host);
        assert_eq!(pf.lanes()[1].objects()[0].state(), NoteState::Held);
        clock.set(2000.0 + MISS_WINDOW_MS + 1.0);
        pf.update(&clock, &mut host);
        assert_eq!(pf.lanes()[1].objects()[0].state(), NoteState::Hit);
    }

    #[test]
    fn held_body_shrinks_over_frames() {
        let (mut pf, mut host) = setup(Config::default());
        pf.press(1, 1000.0);
        let clock = ManualClock::new(1000.0);
        let mut last = f32::INFINITY;
        while clock.position_ms() < 2000.0 {
            pf.update(&clock, &mut host);
            let len = pf.lanes()[1].objects()[0].body_length();
            assert!(len <= last);
            last = len;
            clock.advance(16.0);
        }
    }

    #[test]
    fn autoplay_hits_everything() {
        let (mut pf, mut host) = setup(Config::default());
        let clock = ManualClock::new(0.0);
        while !pf.is_finished() {
            clock.advance(16.0);
            pf.autoplay(clock.position_ms());
            pf.update(&clock, &mut host);
            assert!(clock.position_ms() < 10_000.0);
        }
        let stats = pf.stats();
        assert_eq!(stats.hit, 4);
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn upscroll_config_moves_receptor() {
        let config = Config { scroll_direction_4k: ScrollDirection::Up, ..Config::default() };
        let (pf, _host) = setup(config);
        assert_eq!(pf.scroll().direction, ScrollDirection::Up);
        assert!(pf.layout().receptor_offset < SCREEN_HEIGHT / 2.0);
    }

    #[test]
    fn destroy_releases_all_sprites() {
        let (mut pf, mut host) = setup(Config::default());
        pf.destroy(&mut host);
        pf.destroy(&mut host);
        assert_eq!(host.live_count(), 0);
        assert_eq!(host.released().len(), 8);
        assert!(pf.is_destroyed());

        let clock = ManualClock::new(1000.0);
        pf.update(&clock, &mut host);
        assert_eq!(host.live_count(), 0);
    }

    #[test]
    fn failed_spawn_releases_partial_sprites() {
        let mut host = RecordingHost::new();
        let mut lanes: Vec<Lane> = lane_positions(4)
            .into_iter()
            .enumerate()
            .map(|(index, x)| Lane { index, x, objects: Vec::new() })
            .collect();
        // Skin only covers two lanes, so the lane 3 note cannot be built.
        let narrow = GeneratedSkin::new(2, LANE_WIDTH, NOTE_HEIGHT);
        let notes = [
            HitObjectInfo::tap(0, 500.0),
            HitObjectInfo::long_note(1, 600.0, 900.0),
            HitObjectInfo::tap(3, 700.0),
        ];
        let err = spawn_objects(&mut lanes, &notes, &narrow, &narrow, &mut host).unwrap_err();
        assert!(err.contains("lane 3"));
        assert_eq!(host.live_count(), 0);
        assert_eq!(host.released().len(), 4);
    }
}
