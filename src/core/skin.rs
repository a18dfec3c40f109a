use crate::game::note::{NUM_SNAPS, Snap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// A texture handle plus its natural size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Texture {
    pub id: TextureId,
    pub width: f32,
    pub height: f32,
}

impl Texture {
    /// Height after scaling the texture to `width`, preserving aspect ratio.
    pub fn height_at_width(&self, width: f32) -> f32 {
        if self.width <= 0.0 { self.height } else { self.height * width / self.width }
    }
}

/// Skin behaviour flags that affect layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinFlags {
    pub flip_note_on_upscroll: bool,
    pub flip_note_end_on_upscroll: bool,
    /// Colour notes by snap instead of by lane.
    pub color_by_snap: bool,
}

impl Default for SkinFlags {
    fn default() -> Self {
        Self {
            flip_note_on_upscroll: false,
            flip_note_end_on_upscroll: true,
            color_by_snap: true,
        }
    }
}

/// Texture lookup provided by the host's skin manager.
pub trait SkinProvider {
    fn flags(&self) -> SkinFlags;
    fn note(&self, lane: usize, snap: Snap) -> Option<Texture>;
    fn hold_head(&self, lane: usize, snap: Snap) -> Option<Texture>;
    fn hold_body(&self, lane: usize) -> Option<Texture>;
    fn hold_end(&self, lane: usize) -> Option<Texture>;
}

/// Procedural skin that hands out stable ids for every lane/snap pair.
/// Also used as the fallback when a host skin is missing a texture.
#[derive(Debug, Clone)]
pub struct GeneratedSkin {
    key_count: usize,
    note_size: (f32, f32),
    flags: SkinFlags,
}

impl GeneratedSkin {
    // Texture id layout: [notes | hold heads | hold bodies | hold ends]
    pub fn new(key_count: usize, note_width: f32, note_height: f32) -> Self {
        Self {
            key_count: key_count.max(1),
            note_size: (note_width, note_height),
            flags: SkinFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: SkinFlags) -> Self {
        self.flags = flags;
        self
    }

    fn colored_index(&self, lane: usize, snap: Snap) -> usize {
        if self.flags.color_by_snap {
            lane * NUM_SNAPS + snap.index()
        } else {
            lane * NUM_SNAPS
        }
    }

    fn texture(&self, id: usize) -> Texture {
        Texture {
            id: TextureId(id as u32),
            width: self.note_size.0,
            height: self.note_size.1,
        }
    }

    fn lane_ok(&self, lane: usize) -> bool {
        lane < self.key_count
    }
}

impl SkinProvider for GeneratedSkin {
    fn flags(&self) -> SkinFlags {
        self.flags
    }

    fn note(&self, lane: usize, snap: Snap) -> Option<Texture> {
        self.lane_ok(lane).then(|| self.texture(self.colored_index(lane, snap)))
    }

    fn hold_head(&self, lane: usize, snap: Snap) -> Option<Texture> {
        let base = self.key_count * NUM_SNAPS;
        self.lane_ok(lane).then(|| self.texture(base + self.colored_index(lane, snap)))
    }

    fn hold_body(&self, lane: usize) -> Option<Texture> {
        let base = 2 * self.key_count * NUM_SNAPS;
        self.lane_ok(lane).then(|| self.texture(base + lane))
    }

    fn hold_end(&self, lane: usize) -> Option<Texture> {
        let base = 2 * self.key_count * NUM_SNAPS + self.key_count;
        self.lane_ok(lane).then(|| self.texture(base + lane))
    }
}

/// Looks a texture up in `primary`, falling back to `fallback` when missing.
pub fn resolve(primary: Option<Texture>, fallback: impl FnOnce() -> Option<Texture>) -> Option<Texture> {
    primary.or_else(fallback)
}
