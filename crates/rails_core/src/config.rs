use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::scene::FadeSettings;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/runtime.json";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub version: String,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub fade: FadeConfig,
    #[serde(default = "default_stage_color")]
    pub stage_color: [f32; 4],
    #[serde(default = "default_max_frame_time_ms")]
    pub max_frame_time_ms: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FadeConfig {
    #[serde(default = "default_fade_frames")]
    pub fade_in_frames: u32,
    #[serde(default = "default_fade_frames")]
    pub fade_out_frames: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            window: WindowConfig::default(),
            fade: FadeConfig::default(),
            stage_color: default_stage_color(),
            max_frame_time_ms: default_max_frame_time_ms(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            fade_in_frames: default_fade_frames(),
            fade_out_frames: default_fade_frames(),
        }
    }
}

impl From<&FadeConfig> for FadeSettings {
    fn from(config: &FadeConfig) -> Self {
        FadeSettings::frames(config.fade_in_frames, config.fade_out_frames)
    }
}

impl RuntimeConfig {
    pub fn max_frame_dt(&self) -> f64 {
        self.max_frame_time_ms / 1000.0
    }
}

pub fn load_config_from_path(path: &Path) -> Result<RuntimeConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read runtime config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse runtime config {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load `path`, falling back to defaults when it is missing or invalid.
pub fn load_config_or_default(path: &Path) -> RuntimeConfig {
    if !path.exists() {
        log::warn!(
            "Runtime config {} not found, using defaults",
            path.display()
        );
        return RuntimeConfig::default();
    }
    match load_config_from_path(path) {
        Ok(config) => {
            log::info!("Loaded runtime config from {}", path.display());
            config
        }
        Err(e) => {
            log::error!("{e}; using defaults");
            RuntimeConfig::default()
        }
    }
}

fn validate_config(config: &RuntimeConfig) -> Result<(), String> {
    if config.window.width == 0 || config.window.height == 0 {
        return Err(format!(
            "Config validation failed: window size {}x{} must be non-zero",
            config.window.width, config.window.height
        ));
    }
    if config.window.title.trim().is_empty() {
        return Err("Config validation failed: window title is empty".to_string());
    }
    if let Some(channel) = config
        .stage_color
        .iter()
        .find(|c| !(0.0..=1.0).contains(*c))
    {
        return Err(format!(
            "Config validation failed: stage_color channel {channel} is outside 0..=1"
        ));
    }
    if !(config.max_frame_time_ms.is_finite() && config.max_frame_time_ms > 0.0) {
        return Err(format!(
            "Config validation failed: max_frame_time_ms {} must be positive",
            config.max_frame_time_ms
        ));
    }
    if config.fade.fade_in_frames > 600 || config.fade.fade_out_frames > 600 {
        log::warn!(
            "Fade durations {}/{} frames are unusually long",
            config.fade.fade_in_frames,
            config.fade.fade_out_frames
        );
    }
    Ok(())
}

fn default_title() -> String {
    "Parallel Rails".to_string()
}

const fn default_width() -> u32 {
    1280
}

const fn default_height() -> u32 {
    720
}

const fn default_fade_frames() -> u32 {
    30
}

const fn default_stage_color() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

const fn default_max_frame_time_ms() -> f64 {
    250.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "rails_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_config_file(path: &Path, body: &str) {
        fs::write(path, body).expect("failed to write temp config file");
    }

    #[test]
    fn load_config_from_path_parses_full_file() {
        let path = temp_file_path("full");
        let json = r#"
        {
          "version": "0.2",
          "window": { "title": "Rails Test", "width": 800, "height": 600 },
          "fade": { "fade_in_frames": 12, "fade_out_frames": 20 },
          "stage_color": [0.1, 0.2, 0.3, 1.0],
          "max_frame_time_ms": 100.0
        }
        "#;

        write_config_file(&path, json);
        let config = load_config_from_path(&path).expect("valid config should load");
        assert_eq!(config.version, "0.2");
        assert_eq!(config.window.title, "Rails Test");
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(
            FadeSettings::from(&config.fade),
            FadeSettings::frames(12, 20)
        );
        assert!((config.max_frame_dt() - 0.1).abs() < 1e-9);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let path = temp_file_path("minimal");
        write_config_file(&path, r#"{ "version": "0.1" }"#);

        let config = load_config_from_path(&path).expect("minimal config should load");
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.fade.fade_in_frames, 30);
        assert_eq!(config.window.width, 1280);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_config_rejects_zero_window_size() {
        let path = temp_file_path("zero_size");
        write_config_file(
            &path,
            r#"{ "version": "0.1", "window": { "width": 0, "height": 720 } }"#,
        );

        let err = load_config_from_path(&path).expect_err("zero width should fail");
        assert!(err.contains("must be non-zero"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_config_rejects_out_of_range_stage_color() {
        let path = temp_file_path("bad_color");
        write_config_file(
            &path,
            r#"{ "version": "0.1", "stage_color": [0.0, 2.0, 0.0, 1.0] }"#,
        );

        let err = load_config_from_path(&path).expect_err("color channel > 1 should fail");
        assert!(err.contains("stage_color"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_config_reports_parse_errors() {
        let path = temp_file_path("broken");
        write_config_file(&path, "{ not json");

        let err = load_config_from_path(&path).expect_err("broken JSON should fail");
        assert!(err.contains("Failed to parse runtime config"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_config_or_default_falls_back() {
        let path = temp_file_path("absent");
        let _ = fs::remove_file(&path);
        assert_eq!(load_config_or_default(&path), RuntimeConfig::default());

        write_config_file(&path, r#"{ "version": "0.1", "max_frame_time_ms": -5 }"#);
        assert_eq!(load_config_or_default(&path), RuntimeConfig::default());

        let _ = fs::remove_file(path);
    }
}
