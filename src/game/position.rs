//! Per-frame position and size of a hit object.
//!
//! Everything here is a closed-form function of the current track time, the
//! note's fixed offsets and the scroll configuration. Nothing is cached between
//! frames, so rewinding or seeking the clock needs no special handling.

use crate::config::{RECEPTOR_PADDING_DOWN, RECEPTOR_PADDING_UP, SCREEN_HEIGHT};
use crate::core::skin::SkinFlags;
use crate::game::scroll::{ScrollDirection, ScrollState};

/// Vertical layout of the playfield.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLayout {
    /// Y of the judgement line.
    pub receptor_offset: f32,
    pub screen_height: f32,
}

impl FieldLayout {
    pub fn for_direction(direction: ScrollDirection, screen_height: f32) -> Self {
        let receptor_offset = match direction {
            ScrollDirection::Down => screen_height - RECEPTOR_PADDING_DOWN,
            ScrollDirection::Up => RECEPTOR_PADDING_UP,
        };
        Self { receptor_offset, screen_height }
    }
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self::for_direction(ScrollDirection::Down, SCREEN_HEIGHT)
    }
}

/// Top-left Y of a note sprite that is not being held.
#[inline(always)]
pub fn note_y(note_offset: f64, current_offset: f64, receptor_offset: f32, scroll: &ScrollState, sprite_height: f32) -> f32 {
    receptor_offset + (note_offset - current_offset) as f32 * scroll.signed_speed() - sprite_height
}

/// Full body length of a long note in pixels.
#[inline(always)]
pub fn initial_body_length(start: f64, end: f64, scroll: &ScrollState) -> f32 {
    ((end - start) as f32 * scroll.speed).max(0.0)
}

/// Body length of a long note that is currently held. Never exceeds the
/// initial length and bottoms out at zero once the end has passed.
#[inline(always)]
pub fn held_body_length(end: f64, current_offset: f64, initial_length: f32, scroll: &ScrollState) -> f32 {
    ((end - current_offset) as f32 * scroll.speed).clamp(0.0, initial_length.max(0.0))
}

/// Inputs for one note's geometry calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteInput {
    pub start: f64,
    pub end: f64,
    pub is_long_note: bool,
    pub held: bool,
    pub head_height: f32,
    pub end_height: f32,
}

/// Resolved geometry for one note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteGeometry {
    pub head_y: f32,
    pub body_y: f32,
    pub body_length: f32,
    pub end_y: f32,
    /// False when the long note has no length left; hides body and end cap.
    pub body_visible: bool,
    pub flip_head: bool,
    pub flip_end: bool,
}

pub fn compute(note: &NoteInput, current_offset: f64, layout: &FieldLayout, scroll: &ScrollState, flags: SkinFlags) -> NoteGeometry {
    let held = note.is_long_note && note.held;
    let head_offset = if held { current_offset } else { note.start };
    let head_y = note_y(head_offset, current_offset, layout.receptor_offset, scroll, note.head_height);

    let upscroll = !scroll.is_downscroll();
    let flip_head = upscroll && flags.flip_note_on_upscroll;
    let flip_end = upscroll && flags.flip_note_end_on_upscroll;

    if !note.is_long_note {
        return NoteGeometry {
            head_y,
            body_y: head_y,
            body_length: 0.0,
            end_y: head_y,
            body_visible: false,
            flip_head,
            flip_end,
        };
    }

    let initial = initial_body_length(note.start, note.end, scroll);
    let body_length = if held {
        held_body_length(note.end, current_offset, initial, scroll)
    } else {
        initial
    };

    // Body grows from the centre of the head away from the receptor.
    let head_center = head_y + note.head_height / 2.0;
    let (body_y, far_end) = match scroll.direction {
        ScrollDirection::Down => (head_center - body_length, head_center - body_length),
        ScrollDirection::Up => (head_center, head_center + body_length),
    };

    NoteGeometry {
        head_y,
        body_y,
        body_length,
        end_y: far_end - note.end_height / 2.0,
        body_visible: body_length > 0.0,
        flip_head,
        flip_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn layout() -> FieldLayout {
        FieldLayout { receptor_offset: 600.0, screen_height: 720.0 }
    }

    fn ln(start: f64, end: f64, held: bool) -> NoteInput {
        NoteInput { start, end, is_long_note: true, held, head_height: 40.0, end_height: 20.0 }
    }

    #[test]
    fn tap_position_formula() {
        let scroll = ScrollState::new(0.5, ScrollDirection::Down);
        // 600 + (1000 - 800) * -0.5 - 40
        assert!((note_y(1000.0, 800.0, 600.0, &scroll, 40.0) - 460.0).abs() < EPS);
        let up = ScrollState::new(0.5, ScrollDirection::Up);
        assert!((note_y(1000.0, 800.0, 100.0, &up, 40.0) - 160.0).abs() < EPS);
    }

    #[test]
    fn position_is_deterministic() {
        let scroll = ScrollState::new(0.75, ScrollDirection::Down);
        let note = ln(1000.0, 2000.0, false);
        let flags = SkinFlags::default();
        for t in [0.0, 250.0, 999.0, 1500.0, 4000.0] {
            let a = compute(&note, t, &layout(), &scroll, flags);
            let b = compute(&note, t, &layout(), &scroll, flags);
            assert_eq!(a, b);
        }
        // Visiting other times in between does not change the result.
        let before = compute(&note, 700.0, &layout(), &scroll, flags);
        let _ = compute(&note, 1900.0, &layout(), &scroll, flags);
        assert_eq!(compute(&note, 700.0, &layout(), &scroll, flags), before);
    }

    #[test]
    fn held_long_note_is_pinned_at_receptor() {
        let scroll = ScrollState::new(0.5, ScrollDirection::Down);
        let g = compute(&ln(1000.0, 2000.0, true), 1400.0, &layout(), &scroll, SkinFlags::default());
        assert!((g.head_y - (600.0 - 40.0)).abs() < EPS);
        assert!((g.body_length - 300.0).abs() < EPS);
        assert!(g.body_visible);
    }

    #[test]
    fn held_length_never_exceeds_initial() {
        let scroll = ScrollState::new(0.5, ScrollDirection::Down);
        // Pressed early: (end - current) would be longer than the note itself.
        let g = compute(&ln(1000.0, 2000.0, true), 900.0, &layout(), &scroll, SkinFlags::default());
        assert!((g.body_length - 500.0).abs() < EPS);
    }

    #[test]
    fn held_length_is_monotonic_then_zero() {
        let scroll = ScrollState::new(0.6, ScrollDirection::Up);
        let note = ln(1000.0, 2000.0, true);
        let mut last = f32::INFINITY;
        let mut t = 1000.0;
        while t <= 2600.0 {
            let g = compute(&note, t, &layout(), &scroll, SkinFlags::default());
            assert!(g.body_length <= last);
            if t >= 2000.0 {
                assert_eq!(g.body_length, 0.0);
                assert!(!g.body_visible);
            }
            last = g.body_length;
            t += 16.0;
        }
    }

    #[test]
    fn unheld_long_note_keeps_full_length() {
        let scroll = ScrollState::new(0.5, ScrollDirection::Down);
        let g = compute(&ln(1000.0, 1400.0, false), 1300.0, &layout(), &scroll, SkinFlags::default());
        assert!((g.body_length - 200.0).abs() < EPS);
        // Downscroll: body extends upward from the head centre.
        assert!((g.body_y + g.body_length - (g.head_y + 20.0)).abs() < EPS);
        assert!((g.end_y - (g.body_y - 10.0)).abs() < EPS);
    }

    #[test]
    fn upscroll_body_extends_downward() {
        let scroll = ScrollState::new(0.5, ScrollDirection::Up);
        let g = compute(&ln(1000.0, 1400.0, false), 900.0, &layout(), &scroll, SkinFlags::default());
        assert!((g.body_y - (g.head_y + 20.0)).abs() < EPS);
        assert!((g.end_y - (g.body_y + g.body_length - 10.0)).abs() < EPS);
    }

    #[test]
    fn zero_length_hides_body() {
        let scroll = ScrollState::new(0.5, ScrollDirection::Down);
        let g = compute(&ln(1000.0, 1000.0, false), 0.0, &layout(), &scroll, SkinFlags::default());
        assert_eq!(g.body_length, 0.0);
        assert!(!g.body_visible);
    }

    #[test]
    fn direction_flip_negates_offset_and_toggles_flip() {
        let flags = SkinFlags { flip_note_on_upscroll: true, flip_note_end_on_upscroll: true, color_by_snap: true };
        let note = ln(1000.0, 1500.0, false);
        let down = ScrollState::new(0.5, ScrollDirection::Down);
        let up = ScrollState::new(0.5, ScrollDirection::Up);
        let l = layout();
        let gd = compute(&note, 600.0, &l, &down, flags);
        let gu = compute(&note, 600.0, &l, &up, flags);
        let base = l.receptor_offset - note.head_height;
        assert!(((gd.head_y - base) + (gu.head_y - base)).abs() < EPS);
        assert!(!gd.flip_head && !gd.flip_end);
        assert!(gu.flip_head && gu.flip_end);
    }

    #[test]
    fn layout_places_receptor_by_direction() {
        let down = FieldLayout::for_direction(ScrollDirection::Down, 720.0);
        let up = FieldLayout::for_direction(ScrollDirection::Up, 720.0);
        assert_eq!(down.receptor_offset, 720.0 - RECEPTOR_PADDING_DOWN);
        assert_eq!(up.receptor_offset, RECEPTOR_PADDING_UP);
    }
}
