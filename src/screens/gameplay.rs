use log::info;
use winit::event::KeyEvent;
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::config::Config;
use crate::core::input::{self, KeyPress, LaneEdge};
use crate::core::skin::SkinProvider;
use crate::core::sprite::SpriteHost;
use crate::game::chart::Chart;
use crate::game::playfield::{Playfield, PlayfieldStats};
use crate::game::timing::TrackClock;
use crate::screens::ScreenAction;

pub struct State {
    pub playfield: Playfield,
    pub autoplay: bool,
    pub title: String,
    finished: bool,
}

pub fn init(chart: &Chart, config: &Config, skin: &dyn SkinProvider, host: &mut dyn SpriteHost) -> Result<State, String> {
    let playfield = Playfield::load(chart, config, skin, host)?;
    info!("Gameplay screen: '{}' by {} (autoplay: {})", chart.title, chart.artist, config.autoplay);
    Ok(State {
        playfield,
        autoplay: config.autoplay,
        title: chart.title.clone(),
        finished: false,
    })
}

/// Feeds a lane press/release to the playfield. Ignored under autoplay.
pub fn handle_lane_edge(state: &mut State, edge: LaneEdge, time_ms: f64) {
    if state.autoplay {
        return;
    }
    if edge.pressed {
        state.playfield.press(edge.lane, time_ms);
    } else {
        state.playfield.release(edge.lane, time_ms);
    }
}

pub fn handle_raw_key_event(state: &mut State, key: &KeyEvent, time_ms: f64) -> ScreenAction {
    handle_key_press(state, &KeyPress::from(key), time_ms)
}

pub fn handle_key_press(state: &mut State, key: &KeyPress, time_ms: f64) -> ScreenAction {
    if let PhysicalKey::Code(KeyCode::Escape) = key.physical_key {
        return if key.is_fresh_press() { ScreenAction::Exit } else { ScreenAction::None };
    }
    if let Some(edge) = input::lane_edge(key, state.playfield.key_count()) {
        handle_lane_edge(state, edge, time_ms);
    }
    ScreenAction::None
}

/// One frame. Returns `Finished` exactly once, when the chart has been played out.
pub fn update(state: &mut State, clock: &dyn TrackClock, host: &mut dyn SpriteHost) -> ScreenAction {
    if state.autoplay {
        state.playfield.autoplay(clock.position_ms());
    }
    state.playfield.update(clock, host);

    if !state.finished && state.playfield.is_finished() {
        state.finished = true;
        let stats = state.playfield.stats();
        info!(
            "'{}' finished: {}/{} hit, {} missed, {} let go",
            state.title,
            stats.hit,
            stats.total(),
            stats.missed,
            stats.let_go
        );
        return ScreenAction::Finished;
    }
    ScreenAction::None
}

/// Tears the screen down, releasing every sprite the playfield owns.
pub fn on_exit(state: &mut State, host: &mut dyn SpriteHost) -> PlayfieldStats {
    let stats = state.playfield.stats();
    state.playfield.destroy(host);
    stats
}
