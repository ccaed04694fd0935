//! Effect tunables and host configuration
//!
//! The heart burst constants are fixed at compile time. Only the host
//! settings (window, MQTT, seed) are loaded at runtime.

use crate::error::{AppError, Result};
use serde::Deserialize;
use std::f32::consts::TAU;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// Heart Burst Constants
// ============================================================================

/// Hearts created over the lifetime of one burst effect
pub const HEART_COUNT: usize = 20;

pub const HEART_SIZE_MIN: f32 = 16.0;
pub const HEART_SIZE_MAX: f32 = 40.0;

/// Launch speed in pixels per frame
pub const INITIAL_SPEED_MIN: f32 = 4.0;
pub const INITIAL_SPEED_MAX: f32 = 10.0;

/// Emission angles are drawn from `[0, BURST_ANGLE_SPREAD)`
pub const BURST_ANGLE_SPREAD: f32 = TAU;

/// Rectangular spawn jitter around the burst centre (full width/height)
pub const BURST_CENTER_SPREAD_X: f32 = 60.0;
pub const BURST_CENTER_SPREAD_Y: f32 = 30.0;

pub const INITIAL_OPACITY: f32 = 0.9;

/// Rotation speed is drawn from `[-spread/2, spread/2)` degrees per frame
pub const ROTATION_SPEED_SPREAD: f32 = 6.0;

pub const GRAVITY: f32 = 0.15;
pub const AIR_RESISTANCE: f32 = 0.99;
pub const LIFE_DECAY: f32 = 0.008;

/// Hearts falling this far below the surface are pruned
pub const OFFSCREEN_MARGIN: f32 = 50.0;

pub const DURATION_MS: f32 = 2500.0;
pub const FADE_OUT_MS: f32 = 500.0;

pub const BURST_INTERVAL_MIN_MS: f32 = 50.0;
pub const BURST_INTERVAL_MAX_MS: f32 = 150.0;

pub const BATCH_SIZE_MIN: usize = 2;
pub const BATCH_SIZE_MAX: usize = 5;

/// Physics runs at a fixed tick; velocities are in pixels per tick
pub const FRAME_RATE: f32 = 60.0;
pub const FRAME_MS: f32 = 1000.0 / FRAME_RATE;

/// Frames simulated in one update after a stall, at most
pub const MAX_CATCH_UP_FRAMES: u32 = 4;

/// Native bounding size of the heart path
pub const HEART_PATH_SIZE: f32 = 24.0;

// ============================================================================
// Heart Colors
// ============================================================================

pub const GRADIENT_INNER: (u8, u8, u8) = (255, 105, 180);
pub const GRADIENT_MIDDLE: (u8, u8, u8) = (255, 20, 147);
pub const GRADIENT_OUTER: (u8, u8, u8) = (199, 21, 133);
pub const STROKE_COLOR: (u8, u8, u8) = (255, 255, 255);
pub const HIGHLIGHT_COLOR: (u8, u8, u8) = (255, 255, 255);

// ============================================================================
// Host Configuration
// ============================================================================

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_BACKGROUND: (u8, u8, u8) = (18, 14, 24);
pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_MQTT_TOPIC: &str = "heartburst/favorite";

/// Window resolution parsed from `WxH`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid width '{}'", w))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid height '{}'", h))?;
        Ok(Self { width, height })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_MQTT_PORT,
            topic: DEFAULT_MQTT_TOPIC.to_string(),
        }
    }
}

/// Host settings, loaded from JSON and overridden by the command line
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub background: (u8, u8, u8),
    /// Fixed RNG seed for reproducible bursts
    pub seed: Option<u64>,
    /// Remote triggers are disabled unless set
    pub mqtt: Option<MqttConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            vsync: true,
            background: DEFAULT_BACKGROUND,
            seed: None,
            mqtt: None,
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| AppError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parse() {
        assert_eq!(
            "1920x1080".parse::<Resolution>(),
            Ok(Resolution {
                width: 1920,
                height: 1080
            })
        );
        assert_eq!(
            "640X480".parse::<Resolution>().map(|r| r.to_string()),
            Ok("640x480".to_string())
        );
        assert!("1920".parse::<Resolution>().is_err());
        assert!("wide x 10".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "width": 1024 }"#).unwrap();
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert!(config.vsync);
        assert!(config.mqtt.is_none());
    }

    #[test]
    fn test_mqtt_section_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "mqtt": { "host": "broker.local" } }"#).unwrap();
        let mqtt = config.mqtt.unwrap();
        assert_eq!(mqtt.host, "broker.local");
        assert_eq!(mqtt.port, DEFAULT_MQTT_PORT);
        assert_eq!(mqtt.topic, DEFAULT_MQTT_TOPIC);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("heartburst-{}.json", std::process::id()));
        fs::write(&path, r#"{ "seed": 7, "background": [1, 2, 3] }"#).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        let expected = AppConfig {
            seed: Some(7),
            background: (1, 2, 3),
            ..AppConfig::default()
        };
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_load_invalid_json_is_parse_error() {
        let path =
            std::env::temp_dir().join(format!("heartburst-bad-{}.json", std::process::id()));
        fs::write(&path, "{ width: ").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(matches!(err, AppError::ConfigParse { .. }));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = AppConfig::load("/nonexistent/heartburst.json").unwrap_err();
        assert!(matches!(err, AppError::ConfigIo { .. }));
    }
}
