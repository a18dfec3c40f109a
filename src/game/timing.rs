use serde::Deserialize;
use std::cell::Cell;

/// Source of the current song position. Supplied by the host's audio engine.
pub trait TrackClock {
    /// Current track position in milliseconds. May be negative during lead-in.
    fn position_ms(&self) -> f64;
}

/// A clock that only moves when told to. Used by the headless runner and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    position_ms: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self { position_ms: Cell::new(start_ms) }
    }

    pub fn set(&self, position_ms: f64) {
        self.position_ms.set(position_ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.position_ms.set(self.position_ms.get() + delta_ms);
    }
}

impl TrackClock for ManualClock {
    fn position_ms(&self) -> f64 {
        self.position_ms.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingPoint {
    pub start_time: f64,
    pub bpm: f64,
}

impl TimingPoint {
    #[inline(always)]
    pub fn beat_length_ms(&self) -> f64 {
        60_000.0 / self.bpm
    }
}

/// Timing points sorted by start time.
#[derive(Debug, Clone, Default)]
pub struct TimingData {
    points: Vec<TimingPoint>,
}

impl TimingData {
    pub fn new(mut points: Vec<TimingPoint>) -> Self {
        points.retain(|p| p.bpm.is_finite() && p.bpm > 0.0);
        points.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The timing point in effect at `time_ms`. Times before the first point use
    /// the first point.
    pub fn point_at(&self, time_ms: f64) -> Option<&TimingPoint> {
        let idx = self.points.partition_point(|p| p.start_time <= time_ms);
        self.points.get(idx.saturating_sub(1))
    }

    /// Beat position of `time_ms` relative to the start of its timing point.
    pub fn beat_in_section(&self, time_ms: f64) -> Option<f64> {
        let point = self.point_at(time_ms)?;
        Some((time_ms - point.start_time) / point.beat_length_ms())
    }
}
