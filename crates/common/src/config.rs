//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where placement documents are stored.
    pub placements_dir: PathBuf,

    /// Color sampler parameters.
    #[serde(default)]
    pub sampler: SamplerDefaults,

    /// Interactive editor limits.
    #[serde(default)]
    pub editor: EditorDefaults,

    /// Export settings.
    #[serde(default)]
    pub export: ExportDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default color sampler parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerDefaults {
    /// Fraction of width/height kept by the center crop.
    pub crop_fraction: f64,

    /// Pixels with luminance above this value are treated as background.
    pub brightness_threshold: f64,

    /// Below this many surviving pixels the filter is skipped.
    pub min_filtered_pixels: usize,

    /// Number of k-means clusters.
    pub clusters: usize,

    /// Iteration cap for k-means.
    pub max_iterations: usize,

    /// Centroid movement (RGB units) below which clustering stops.
    pub tolerance: f64,

    /// Seed used to pick the initial centroids.
    pub seed: u64,
}

/// Interactive editor limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Upper bound for `scale_percent` from wheel and slider edits.
    pub max_scale_percent: f64,

    /// Scale change per wheel notch, in percent.
    pub wheel_step_percent: f64,
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Raster encoding for flattened slots ("png" or "jpeg").
    pub output_format: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "slotframe=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            placements_dir: default_placements_dir(),
            sampler: SamplerDefaults::default(),
            editor: EditorDefaults::default(),
            export: ExportDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SamplerDefaults {
    fn default() -> Self {
        Self {
            crop_fraction: 0.30,
            brightness_threshold: 240.0,
            min_filtered_pixels: 10,
            clusters: 3,
            max_iterations: 20,
            tolerance: 1e-3,
            seed: 42,
        }
    }
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            max_scale_percent: 500.0,
            wheel_step_percent: 10.0,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            output_format: "png".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("slotframe").join("config.json")
}

/// Default placement document directory.
fn default_placements_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("slotframe").join("placements")
}
