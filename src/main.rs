use log::{LevelFilter, error, info};
use std::error::Error;
use std::path::PathBuf;

use notefield::config::{self, FRAME_TIME_MS, LANE_WIDTH, NOTE_HEIGHT};
use notefield::core::skin::GeneratedSkin;
use notefield::core::sprite::RecordingHost;
use notefield::game::chart;
use notefield::game::timing::{ManualClock, TrackClock};
use notefield::screens::{ScreenAction, gameplay};

const DEFAULT_CHART_PATH: &str = "assets/charts/demo.json";
const LEAD_IN_MS: f64 = 1000.0;
// Hard stop in case a chart never reports finished.
const MAX_FRAMES: usize = 60 * 60 * 15;

fn main() -> Result<(), Box<dyn Error>> {
    // --- Logging Setup ---
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .filter_module("notefield::game::hit_object", LevelFilter::Warn)
        .filter_module("notefield::game::playfield", LevelFilter::Info)
        .init();

    info!("notefield starting...");
    config::load();
    let cfg = config::get();

    let chart_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_PATH));
    let chart = match chart::load(&chart_path) {
        Ok(chart) => chart,
        Err(e) => {
            error!("Failed to load chart: {}", e);
            return Err(e.into());
        }
    };

    // --- Headless playback ---
    let skin = GeneratedSkin::new(chart.key_count, LANE_WIDTH, NOTE_HEIGHT);
    let mut host = RecordingHost::new();
    let mut state = gameplay::init(&chart, &cfg, &skin, &mut host)?;
    // Start early enough for the first note to scroll in from the screen edge.
    let approach_ms = state.playfield.scroll().travel_time_ms(state.playfield.layout().screen_height) as f64;
    let clock = ManualClock::new(-LEAD_IN_MS.max(approach_ms));

    let mut last_report_sec = i64::MIN;
    for _ in 0..MAX_FRAMES {
        clock.advance(FRAME_TIME_MS);
        let action = gameplay::update(&mut state, &clock, &mut host);

        let sec = (clock.position_ms() / 1000.0).floor() as i64;
        if sec != last_report_sec {
            last_report_sec = sec;
            info!("t={:>6.0}ms visible sprites: {}", clock.position_ms(), host.visible_count());
        }
        if action != ScreenAction::None {
            break;
        }
    }

    let stats = gameplay::on_exit(&mut state, &mut host);
    info!(
        "Done: {}/{} hit, {} missed, {} let go, {} unjudged; {} sprites released.",
        stats.hit,
        stats.total(),
        stats.missed,
        stats.let_go,
        stats.pending + stats.held,
        host.released().len()
    );
    Ok(())
}
