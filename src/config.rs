use configparser::ini::Ini;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::game::scroll::ScrollDirection;

// Paths
pub const CONFIG_INI_PATH: &str = "save/config.ini";

// Playfield layout (reference resolution 1280x720)
pub const SCREEN_HEIGHT: f32 = 720.0;
pub const PLAYFIELD_CENTER_X: f32 = 640.0;
pub const LANE_WIDTH: f32 = 75.0;
pub const LANE_SPACING: f32 = 0.0;
pub const NOTE_HEIGHT: f32 = 40.0;
pub const RECEPTOR_PADDING_DOWN: f32 = 100.0; // Distance from screen bottom to receptor (downscroll)
pub const RECEPTOR_PADDING_UP: f32 = 140.0; // Distance from screen top to receptor (upscroll)

// Scroll speed is stored as an integer setting; pixels per ms = setting / (DIVISOR * rate).
pub const SCROLL_SPEED_DIVISOR: f32 = 200.0;
pub const MIN_SCROLL_SPEED: u32 = 50;
pub const MAX_SCROLL_SPEED: u32 = 1000;

// Judgement
pub const MISS_WINDOW_MS: f64 = 164.0;

// Visuals
pub const DEAD_NOTE_TINT: [f32; 4] = [0.4, 0.4, 0.4, 1.0];
pub const NOTE_TINT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

// Text input
pub const CARET_BLINK_INTERVAL: f32 = 0.5;
pub const STOPPED_TYPING_DELAY: f32 = 0.5;
pub const TEXT_INPUT_MAX_CHARS: usize = 64;

// Misc
pub const FRAME_TIME_MS: f64 = 1000.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub scroll_speed_4k: u32,
    pub scroll_speed_7k: u32,
    pub scroll_direction_4k: ScrollDirection,
    pub scroll_direction_7k: ScrollDirection,
    pub audio_rate: f32,
    pub autoplay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scroll_speed_4k: 150,
            scroll_speed_7k: 150,
            scroll_direction_4k: ScrollDirection::Down,
            scroll_direction_7k: ScrollDirection::Down,
            audio_rate: 1.0,
            autoplay: true,
        }
    }
}

impl Config {
    pub fn scroll_speed_for(&self, key_count: usize) -> u32 {
        if key_count == 7 { self.scroll_speed_7k } else { self.scroll_speed_4k }
    }

    pub fn scroll_direction_for(&self, key_count: usize) -> ScrollDirection {
        if key_count == 7 { self.scroll_direction_7k } else { self.scroll_direction_4k }
    }

    /// Reads every known key from `conf`, keeping `self`'s value for keys that are
    /// missing or fail to parse.
    fn apply_ini(&mut self, conf: &Ini) {
        let speed = |key: &str, fallback: u32| {
            conf.get("Gameplay", key)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .map_or(fallback, |v| v.clamp(MIN_SCROLL_SPEED, MAX_SCROLL_SPEED))
        };
        let direction = |key: &str, fallback: ScrollDirection| {
            match conf.get("Gameplay", key).map(|v| v.parse::<ScrollDirection>()) {
                Some(Ok(dir)) => dir,
                Some(Err(e)) => {
                    warn!("Invalid {} in config: {}", key, e);
                    fallback
                }
                None => fallback,
            }
        };

        self.scroll_speed_4k = speed("ScrollSpeed4K", self.scroll_speed_4k);
        self.scroll_speed_7k = speed("ScrollSpeed7K", self.scroll_speed_7k);
        self.scroll_direction_4k = direction("ScrollDirection4K", self.scroll_direction_4k);
        self.scroll_direction_7k = direction("ScrollDirection7K", self.scroll_direction_7k);
        self.audio_rate = conf
            .get("Gameplay", "AudioRate")
            .and_then(|v| v.trim().parse::<f32>().ok())
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(self.audio_rate);
        self.autoplay = conf
            .get("Gameplay", "Autoplay")
            .and_then(|v| v.trim().parse::<u8>().ok())
            .map_or(self.autoplay, |v| v != 0);
    }

    fn to_ini(self) -> Ini {
        let mut conf = Ini::new_cs();
        conf.set("Gameplay", "ScrollSpeed4K", Some(self.scroll_speed_4k.to_string()));
        conf.set("Gameplay", "ScrollSpeed7K", Some(self.scroll_speed_7k.to_string()));
        conf.set("Gameplay", "ScrollDirection4K", Some(self.scroll_direction_4k.to_string()));
        conf.set("Gameplay", "ScrollDirection7K", Some(self.scroll_direction_7k.to_string()));
        conf.set("Gameplay", "AudioRate", Some(self.audio_rate.to_string()));
        conf.set("Gameplay", "Autoplay", Some(if self.autoplay { "1" } else { "0" }.to_string()));
        conf
    }
}

// Global static for the current config.
static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

fn create_default_file(path: &Path) -> Result<(), std::io::Error> {
    info!("Config file not found, creating default at '{}'.", path.display());
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    Config::default().to_ini().write(path)
}

/// Parses a config from ini text. Unknown or invalid keys fall back to defaults.
pub fn parse(text: &str) -> Result<Config, String> {
    let mut conf = Ini::new_cs();
    conf.read(text.to_string())?;
    let mut config = Config::default();
    config.apply_ini(&conf);
    Ok(config)
}

/// Loads the config from `path` into the global slot, creating a default file if
/// none exists. A broken file leaves the defaults in place.
pub fn load_from(path: &Path) {
    if !path.exists() {
        if let Err(e) = create_default_file(path) {
            warn!("Failed to create default config file: {}", e);
            return;
        }
    }

    let mut conf = Ini::new_cs();
    match conf.load(path) {
        Ok(_) => {
            let mut config = Config::default();
            config.apply_ini(&conf);
            info!("Loaded config from '{}'.", path.display());
            *CONFIG.lock().unwrap() = config;
        }
        Err(e) => warn!("Failed to load '{}' ({}), using defaults.", path.display(), e),
    }
}

pub fn load() {
    load_from(Path::new(CONFIG_INI_PATH));
}

/// Returns a copy of the currently loaded config.
pub fn get() -> Config {
    *CONFIG.lock().unwrap()
}

/// Replaces the current config and persists it to `path`.
pub fn update(config: Config, path: &Path) -> Result<(), std::io::Error> {
    *CONFIG.lock().unwrap() = config;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    config.to_ini().write(path)
}
