use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::game::note::{HitObjectInfo, Snap};
use crate::game::timing::{TimingData, TimingPoint};

pub const SUPPORTED_KEY_COUNTS: [usize; 2] = [4, 7];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHitObject {
    start_time: f64,
    /// One-based, as written by chart editors.
    lane: usize,
    #[serde(default)]
    end_time: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChart {
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    difficulty_name: String,
    key_count: usize,
    timing_points: Vec<TimingPoint>,
    hit_objects: Vec<RawHitObject>,
}

/// A validated chart ready to be loaded into a playfield.
#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub artist: String,
    pub difficulty_name: String,
    pub key_count: usize,
    pub timing: TimingData,
    /// Sorted by start time, then lane.
    pub hit_objects: Vec<HitObjectInfo>,
}

impl Chart {
    pub fn length_ms(&self) -> f64 {
        self.hit_objects.iter().map(|h| h.end_time).fold(0.0, f64::max)
    }

    pub fn long_note_count(&self) -> usize {
        self.hit_objects.iter().filter(|h| h.is_long_note()).count()
    }
}

pub fn parse(json: &str) -> Result<Chart, String> {
    let raw: RawChart = serde_json::from_str(json).map_err(|e| format!("Invalid chart JSON: {}", e))?;
    validate(raw)
}

pub fn load(path: &Path) -> Result<Chart, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let chart = parse(&text)?;
    info!(
        "Loaded chart '{}' [{}] from {:?}: {}K, {} notes ({} LNs)",
        chart.title,
        chart.difficulty_name,
        path,
        chart.key_count,
        chart.hit_objects.len(),
        chart.long_note_count()
    );
    Ok(chart)
}

fn validate(raw: RawChart) -> Result<Chart, String> {
    if !SUPPORTED_KEY_COUNTS.contains(&raw.key_count) {
        return Err(format!("Unsupported key count {} (expected 4 or 7)", raw.key_count));
    }
    if let Some(bad) = raw.timing_points.iter().find(|p| !(p.bpm.is_finite() && p.bpm > 0.0)) {
        return Err(format!("Timing point at {}ms has invalid bpm {}", bad.start_time, bad.bpm));
    }
    let timing = TimingData::new(raw.timing_points.clone());
    if timing.is_empty() {
        return Err("Chart has no timing points".to_string());
    }

    let mut hit_objects = Vec::with_capacity(raw.hit_objects.len());
    for (i, obj) in raw.hit_objects.iter().enumerate() {
        if obj.lane == 0 || obj.lane > raw.key_count {
            return Err(format!("Hit object #{} has lane {} outside 1..={}", i, obj.lane, raw.key_count));
        }
        if !obj.start_time.is_finite() {
            return Err(format!("Hit object #{} has a non-finite start time", i));
        }
        let lane = obj.lane - 1;
        let info = match obj.end_time {
            Some(end) if end > obj.start_time => HitObjectInfo::long_note(lane, obj.start_time, end),
            Some(end) if end == obj.start_time => HitObjectInfo::tap(lane, obj.start_time),
            Some(end) => {
                return Err(format!("Hit object #{} ends at {}ms before it starts at {}ms", i, end, obj.start_time));
            }
            None => HitObjectInfo::tap(lane, obj.start_time),
        };
        hit_objects.push(info.with_snap(Snap::for_time(info.start_time, &timing)));
    }

    hit_objects.sort_by(|a, b| a.start_time.total_cmp(&b.start_time).then(a.lane.cmp(&b.lane)));
    let overlaps = count_overlaps(&hit_objects, raw.key_count);
    if overlaps > 0 {
        warn!("Chart '{}' has {} overlapping notes", raw.title, overlaps);
    }

    Ok(Chart {
        title: raw.title,
        artist: raw.artist,
        difficulty_name: raw.difficulty_name,
        key_count: raw.key_count,
        timing,
        hit_objects,
    })
}

/// Notes that start before the previous note in the same lane has ended.
fn count_overlaps(sorted: &[HitObjectInfo], key_count: usize) -> usize {
    let mut lane_free_at = vec![f64::NEG_INFINITY; key_count];
    let mut overlaps = 0;
    for obj in sorted {
        if obj.start_time <= lane_free_at[obj.lane] {
            overlaps += 1;
        }
        lane_free_at[obj.lane] = lane_free_at[obj.lane].max(obj.end_time);
    }
    overlaps
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "title": "Sample",
        "artist": "Nobody",
        "difficultyName": "Hard",
        "keyCount": 4,
        "timingPoints": [{ "startTime": 0, "bpm": 120 }],
        "hitObjects": [
            { "startTime": 1000, "lane": 2, "endTime": 1500 },
            { "startTime": 500, "lane": 1 },
            { "startTime": 500, "lane": 4, "endTime": 500 }
        ]
    }"#;

    #[test]
    fn parses_and_sorts_hit_objects() {
        let chart = parse(SAMPLE).unwrap();
        assert_eq!(chart.title, "Sample");
        assert_eq!(chart.difficulty_name, "Hard");
        assert_eq!(chart.key_count, 4);
        let lanes: Vec<usize> = chart.hit_objects.iter().map(|h| h.lane).collect();
        assert_eq!(lanes, vec![0, 3, 1]);
        assert_eq!(chart.long_note_count(), 1);
        assert_eq!(chart.length_ms(), 1500.0);
        assert_eq!(chart.hit_objects[0].snap, Snap::S1st);
    }

    #[test]
    fn rejects_bad_lane() {
        let json = r#"{"keyCount":4,"timingPoints":[{"startTime":0,"bpm":120}],"hitObjects":[{"startTime":0,"lane":5}]}"#;
        assert!(parse(json).unwrap_err().contains("lane 5"));
        let zero = r#"{"keyCount":4,"timingPoints":[{"startTime":0,"bpm":120}],"hitObjects":[{"startTime":0,"lane":0}]}"#;
        assert!(parse(zero).is_err());
    }

    #[test]
    fn rejects_reversed_long_note() {
        let json = r#"{"keyCount":7,"timingPoints":[{"startTime":0,"bpm":120}],"hitObjects":[{"startTime":900,"lane":1,"endTime":800}]}"#;
        assert!(parse(json).unwrap_err().contains("before it starts"));
    }

    #[test]
    fn rejects_unsupported_key_count_and_timing() {
        let keys = r#"{"keyCount":5,"timingPoints":[{"startTime":0,"bpm":120}],"hitObjects":[]}"#;
        assert!(parse(keys).unwrap_err().contains("key count"));
        let no_timing = r#"{"keyCount":4,"timingPoints":[],"hitObjects":[]}"#;
        assert!(parse(no_timing).is_err());
        let zero_bpm = r#"{"keyCount":4,"timingPoints":[{"startTime":0,"bpm":0}],"hitObjects":[]}"#;
        assert!(parse(zero_bpm).unwrap_err().contains("invalid bpm"));
        assert!(parse("not json").unwrap_err().starts_with("Invalid chart JSON"));
    }

    #[test]
    fn overlap_counting() {
        let notes = vec![
            HitObjectInfo::long_note(0, 0.0, 1000.0),
            HitObjectInfo::tap(0, 500.0),
            HitObjectInfo::tap(1, 500.0),
            HitObjectInfo::tap(0, 1500.0),
        ];
        assert_eq!(count_overlaps(&notes, 2), 1);
    }
}
