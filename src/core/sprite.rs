use log::{debug, warn};
use std::collections::HashMap;

use crate::core::skin::TextureId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(pub u32);

/// Everything the host needs to draw one sprite for the current frame.
/// Positions are top-left, in playfield pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub texture: TextureId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub visible: bool,
    pub flip_v: bool,
    pub tint: [f32; 4],
}

impl Sprite {
    pub fn new(texture: TextureId, width: f32, height: f32) -> Self {
        Self {
            texture,
            x: 0.0,
            y: 0.0,
            width,
            height,
            visible: true,
            flip_v: false,
            tint: [1.0, 1.0, 1.0, 1.0],
        }
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True if any part of the sprite lies inside `[top, bottom]`.
    #[inline(always)]
    pub fn overlaps_span(&self, top: f32, bottom: f32) -> bool {
        self.bottom() >= top && self.y <= bottom
    }
}

/// Sprite storage owned by the host engine.
pub trait SpriteHost {
    fn create(&mut self, sprite: &Sprite) -> SpriteId;
    fn update(&mut self, id: SpriteId, sprite: &Sprite);
    fn release(&mut self, id: SpriteId);
}

/// Host that keeps sprites in memory. Used for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    next_id: u32,
    sprites: HashMap<SpriteId, Sprite>,
    released: Vec<SpriteId>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.get(&id)
    }

    pub fn live_count(&self) -> usize {
        self.sprites.len()
    }

    pub fn released(&self) -> &[SpriteId] {
        &self.released
    }

    pub fn visible_count(&self) -> usize {
        self.sprites.values().filter(|s| s.visible).count()
    }
}

impl SpriteHost for RecordingHost {
    fn create(&mut self, sprite: &Sprite) -> SpriteId {
        let id = SpriteId(self.next_id);
        self.next_id += 1;
        self.sprites.insert(id, *sprite);
        id
    }

    fn update(&mut self, id: SpriteId, sprite: &Sprite) {
        match self.sprites.get_mut(&id) {
            Some(slot) => *slot = *sprite,
            None => warn!("Update for unknown sprite {:?}", id),
        }
    }

    fn release(&mut self, id: SpriteId) {
        if self.sprites.remove(&id).is_some() {
            self.released.push(id);
        } else {
            debug!("Release for unknown sprite {:?}", id);
        }
    }
}
