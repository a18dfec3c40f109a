use std::fmt;
use std::str::FromStr;

use crate::config::SCROLL_SPEED_DIVISOR;

/// Direction notes travel toward the receptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    /// Notes fall from the top of the screen; receptors sit near the bottom.
    #[default]
    Down,
    /// Notes rise from the bottom of the screen; receptors sit near the top.
    Up,
}

impl ScrollDirection {
    #[inline(always)]
    pub const fn is_down(self) -> bool {
        matches!(self, ScrollDirection::Down)
    }

    /// Sign applied to the speed term in the position formula.
    #[inline(always)]
    pub const fn sign(self) -> f32 {
        match self {
            ScrollDirection::Down => -1.0,
            ScrollDirection::Up => 1.0,
        }
    }

    pub const fn flipped(self) -> Self {
        match self {
            ScrollDirection::Down => ScrollDirection::Up,
            ScrollDirection::Up => ScrollDirection::Down,
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollDirection::Down => write!(f, "Down"),
            ScrollDirection::Up => write!(f, "Up"),
        }
    }
}

impl FromStr for ScrollDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("down") || trimmed.eq_ignore_ascii_case("downscroll") {
            Ok(ScrollDirection::Down)
        } else if trimmed.eq_ignore_ascii_case("up") || trimmed.eq_ignore_ascii_case("upscroll") {
            Ok(ScrollDirection::Up)
        } else if trimmed.is_empty() {
            Err("ScrollDirection value is empty".to_string())
        } else {
            Err(format!("ScrollDirection '{}' must be 'Down' or 'Up'", trimmed))
        }
    }
}

/// Scroll configuration shared read-only by every hit object during a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    /// Unsigned speed in pixels per millisecond of track time.
    pub speed: f32,
    pub direction: ScrollDirection,
}

impl ScrollState {
    pub fn new(speed: f32, direction: ScrollDirection) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 { speed } else { 0.0 };
        Self { speed, direction }
    }

    /// Builds the scroll state from the integer user setting. Faster audio rates
    /// shrink the per-ms speed so the visual density stays the same.
    pub fn from_setting(setting: u32, audio_rate: f32, direction: ScrollDirection) -> Self {
        let rate = if audio_rate.is_finite() && audio_rate > 0.0 { audio_rate } else { 1.0 };
        Self::new(setting as f32 / (SCROLL_SPEED_DIVISOR * rate), direction)
    }

    #[inline(always)]
    pub fn signed_speed(&self) -> f32 {
        self.speed * self.direction.sign()
    }

    #[inline(always)]
    pub fn is_downscroll(&self) -> bool {
        self.direction.is_down()
    }

    /// Milliseconds a note needs to travel `distance` pixels.
    pub fn travel_time_ms(&self, distance: f32) -> f32 {
        if self.speed <= 0.0 { 0.0 } else { distance / self.speed }
    }
}
