// User settings
// Loaded from ~/.config/creddedupe/settings.json

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use creddedupe_engine::{DedupeOptions, ProviderFormat};

/// Overrides the settings file location.
pub const CONFIG_ENV: &str = "CREDDEDUPE_CONFIG";

/// How near-duplicate groups are resolved when no flag says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Prompt per group
    #[default]
    Interactive,
    /// Keep the best-scoring record of every group
    Auto,
    /// Leave every group untouched
    Keep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Grouping
    #[serde(rename = "dedupe.treatEmailAsUsername")]
    pub treat_email_as_username: bool,

    // Detection
    #[serde(rename = "detection.confirmThreshold")]
    pub confirm_threshold: f64,

    // Merge
    #[serde(rename = "merge.mode")]
    pub merge_mode: MergeMode,

    // Output
    #[serde(rename = "output.provider", skip_serializing_if = "Option::is_none")]
    pub output_provider: Option<ProviderFormat>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            treat_email_as_username: true,
            confirm_threshold: 0.5,
            merge_mode: MergeMode::Interactive,
            output_provider: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("creddedupe")
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file; using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "cannot parse settings; using defaults");
                Self::default()
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read settings; using defaults");
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut settings: Self = serde_json::from_str(&cleaned)?;
        if !(0.0..=1.0).contains(&settings.confirm_threshold) {
            warn!(value = settings.confirm_threshold, "detection.confirmThreshold out of range; clamping");
            settings.confirm_threshold = settings.confirm_threshold.clamp(0.0, 1.0);
        }
        Ok(settings)
    }

    pub fn to_dedupe_options(&self) -> DedupeOptions {
        DedupeOptions {
            treat_email_as_username: self.treat_email_as_username,
        }
    }
}
