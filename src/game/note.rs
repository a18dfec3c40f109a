use crate::game::timing::TimingData;

// Rounding slack when matching a note's time against a beat subdivision.
const SNAP_TOLERANCE_MS: f64 = 3.0;

/// The number of distinct snaps a skin can colour, from 1/1 to "other".
pub const NUM_SNAPS: usize = 9;

/// Beat subdivision a note lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Snap {
    S1st = 0, S2nd, S3rd, S4th, S6th, S8th, S12th, S16th, Other,
}

impl Snap {
    const DIVISORS: [(u32, Snap); 8] = [
        (1, Snap::S1st), (2, Snap::S2nd), (3, Snap::S3rd), (4, Snap::S4th),
        (6, Snap::S6th), (8, Snap::S8th), (12, Snap::S12th), (16, Snap::S16th),
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Finds the coarsest subdivision `time_ms` lands on under `timing`.
    pub fn for_time(time_ms: f64, timing: &TimingData) -> Self {
        let (Some(point), Some(beat)) = (timing.point_at(time_ms), timing.beat_in_section(time_ms)) else {
            return Snap::S1st;
        };
        let beat_len = point.beat_length_ms();
        for (divisor, snap) in Self::DIVISORS {
            let scaled = beat * divisor as f64;
            let error_ms = (scaled - scaled.round()).abs() * beat_len / divisor as f64;
            if error_ms <= SNAP_TOLERANCE_MS {
                return snap;
            }
        }
        Snap::Other
    }
}

/// Immutable note data loaded from a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitObjectInfo {
    /// Zero-based lane index.
    pub lane: usize,
    pub start_time: f64,
    /// End time for long notes; equal to `start_time` for taps.
    pub end_time: f64,
    pub snap: Snap,
}

impl HitObjectInfo {
    pub fn tap(lane: usize, start_time: f64) -> Self {
        Self { lane, start_time, end_time: start_time, snap: Snap::S1st }
    }

    pub fn long_note(lane: usize, start_time: f64, end_time: f64) -> Self {
        Self { lane, start_time, end_time, snap: Snap::S1st }
    }

    pub fn with_snap(mut self, snap: Snap) -> Self {
        self.snap = snap;
        self
    }

    #[inline(always)]
    pub fn is_long_note(&self) -> bool {
        self.end_time > self.start_time
    }
}
