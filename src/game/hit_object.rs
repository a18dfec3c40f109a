use log::debug;

use crate::config::{DEAD_NOTE_TINT, NOTE_TINT};
use crate::core::skin::{GeneratedSkin, SkinFlags, SkinProvider, Texture, resolve};
use crate::core::sprite::{Sprite, SpriteHost, SpriteId};
use crate::game::note::HitObjectInfo;
use crate::game::position::{self, FieldLayout, NoteGeometry, NoteInput};
use crate::game::scroll::ScrollState;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NoteState {
    /// Not yet judged.
    Pending,
    /// Long note currently held down.
    Held,
    /// Judged successfully; no longer drawn.
    Hit,
    Missed,
    /// Long note released too early.
    LetGo,
}

impl NoteState {
    /// Missed and let-go notes keep scrolling past the receptor, dimmed.
    #[inline(always)]
    pub const fn is_dead(self) -> bool {
        matches!(self, NoteState::Missed | NoteState::LetGo)
    }

    #[inline(always)]
    pub const fn is_judged(self) -> bool {
        !matches!(self, NoteState::Pending | NoteState::Held)
    }
}

#[derive(Clone, Debug)]
struct SpriteSlot {
    id: SpriteId,
    sprite: Sprite,
}

impl SpriteSlot {
    fn create(host: &mut dyn SpriteHost, texture: Texture, x: f32, width: f32) -> Self {
        let mut sprite = Sprite::new(texture.id, width, texture.height_at_width(width));
        sprite.x = x;
        sprite.visible = false;
        let id = host.create(&sprite);
        Self { id, sprite }
    }
}

/// A note on screen: immutable chart data plus the sprites that draw it.
#[derive(Debug)]
pub struct HitObject {
    info: HitObjectInfo,
    state: NoteState,
    head: SpriteSlot,
    body: Option<SpriteSlot>,
    end: Option<SpriteSlot>,
    position_y: f32,
    body_length: f32,
    destroyed: bool,
}

impl HitObject {
    /// Creates the object's sprites. Textures missing from `skin` come from
    /// `fallback`; if neither has one, the object cannot be built.
    pub fn new(
        info: HitObjectInfo,
        x: f32,
        width: f32,
        skin: &dyn SkinProvider,
        fallback: &GeneratedSkin,
        host: &mut dyn SpriteHost,
    ) -> Result<Self, String> {
        let lane = info.lane;
        let missing = |what: &str| format!("No {} texture for lane {}", what, lane);

        let head_tex = if info.is_long_note() {
            resolve(skin.hold_head(lane, info.snap), || fallback.hold_head(lane, info.snap))
        } else {
            resolve(skin.note(lane, info.snap), || fallback.note(lane, info.snap))
        }
        .ok_or_else(|| missing("note"))?;

        let (body_tex, end_tex) = if info.is_long_note() {
            let body = resolve(skin.hold_body(lane), || fallback.hold_body(lane)).ok_or_else(|| missing("hold body"))?;
            let end = resolve(skin.hold_end(lane), || fallback.hold_end(lane)).ok_or_else(|| missing("hold end"))?;
            (Some(body), Some(end))
        } else {
            (None, None)
        };

        let head = SpriteSlot::create(host, head_tex, x, width);
        let body = body_tex.map(|t| SpriteSlot::create(host, t, x, width));
        let end = end_tex.map(|t| SpriteSlot::create(host, t, x, width));

        Ok(Self {
            info,
            state: NoteState::Pending,
            head,
            body,
            end,
            position_y: 0.0,
            body_length: 0.0,
            destroyed: false,
        })
    }

    #[inline(always)]
    pub fn info(&self) -> &HitObjectInfo {
        &self.info
    }

    #[inline(always)]
    pub fn lane(&self) -> usize {
        self.info.lane
    }

    #[inline(always)]
    pub fn is_long_note(&self) -> bool {
        self.info.is_long_note()
    }

    #[inline(always)]
    pub fn state(&self) -> NoteState {
        self.state
    }

    pub fn set_state(&mut self, state: NoteState) {
        if self.state != state {
            debug!("lane {} note @{}ms: {:?} -> {:?}", self.info.lane, self.info.start_time, self.state, state);
            self.state = state;
        }
    }

    /// Head Y as of the last update.
    #[inline(always)]
    pub fn position_y(&self) -> f32 {
        self.position_y
    }

    /// Long note body length in pixels as of the last update.
    #[inline(always)]
    pub fn body_length(&self) -> f32 {
        self.body_length
    }

    #[inline(always)]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn head_sprite(&self) -> &Sprite {
        &self.head.sprite
    }

    pub fn body_sprite(&self) -> Option<&Sprite> {
        self.body.as_ref().map(|s| &s.sprite)
    }

    pub fn end_sprite(&self) -> Option<&Sprite> {
        self.end.as_ref().map(|s| &s.sprite)
    }

    fn note_input(&self) -> NoteInput {
        NoteInput {
            start: self.info.start_time,
            end: self.info.end_time,
            is_long_note: self.info.is_long_note(),
            held: self.state == NoteState::Held,
            head_height: self.head.sprite.height,
            end_height: self.end.as_ref().map_or(0.0, |s| s.sprite.height),
        }
    }

    /// Recomputes geometry for `current_ms` and pushes the sprites to the host.
    pub fn update(
        &mut self,
        current_ms: f64,
        scroll: &ScrollState,
        layout: &FieldLayout,
        flags: SkinFlags,
        host: &mut dyn SpriteHost,
    ) {
        if self.destroyed {
            return;
        }
        let geo = position::compute(&self.note_input(), current_ms, layout, scroll, flags);
        self.apply(&geo, layout);

        host.update(self.head.id, &self.head.sprite);
        for slot in [self.body.as_ref(), self.end.as_ref()].into_iter().flatten() {
            host.update(slot.id, &slot.sprite);
        }
    }

    fn apply(&mut self, geo: &NoteGeometry, layout: &FieldLayout) {
        self.position_y = geo.head_y;
        self.body_length = geo.body_length;

        let drawn = self.state != NoteState::Hit;
        let tint = if self.state.is_dead() { DEAD_NOTE_TINT } else { NOTE_TINT };
        let (top, bottom) = (0.0, layout.screen_height);

        let head = &mut self.head.sprite;
        head.y = geo.head_y;
        head.flip_v = geo.flip_head;
        head.tint = tint;
        let on_screen = head.overlaps_span(top, bottom);
        head.visible = drawn && on_screen;

        if let Some(body) = self.body.as_mut() {
            let s = &mut body.sprite;
            s.y = geo.body_y;
            s.height = geo.body_length;
            s.tint = tint;
            let on_screen = s.overlaps_span(top, bottom);
            s.visible = drawn && geo.body_visible && on_screen;
        }
        if let Some(end) = self.end.as_mut() {
            let s = &mut end.sprite;
            s.y = geo.end_y;
            s.flip_v = geo.flip_end;
            s.tint = tint;
            let on_screen = s.overlaps_span(top, bottom);
            s.visible = drawn && geo.body_visible && on_screen;
        }
    }

    /// Releases every sprite this object owns. Safe to call more than once.
    pub fn destroy(&mut self, host: &mut dyn SpriteHost) {
        if self.destroyed {
            return;
        }
        host.release(self.head.id);
        if let Some(body) = self.body.take() {
            host.release(body.id);
        }
        if let Some(end) = self.end.take() {
            host.release(end.id);
        }
        self.destroyed = true;
    }
}
