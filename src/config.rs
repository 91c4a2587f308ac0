use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

pub const MIN_DELAY_SECONDS: u64 = 1;
pub const MAX_DELAY_SECONDS: u64 = 300;

/// Visit order over the media catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayOrderMode {
    #[default]
    Random,
    DateAscending,
    DateDescending,
}

impl DisplayOrderMode {
    const ALL: &'static [Self] = &[Self::Random, Self::DateAscending, Self::DateDescending];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::DateAscending => "date-ascending",
            Self::DateDescending => "date-descending",
        }
    }
}

impl fmt::Display for DisplayOrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayOrderMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|mode| mode.as_str() == raw)
            .copied()
            .ok_or_else(|| anyhow!("unknown display order {raw:?}"))
    }
}

/// Runtime configuration for the slideshow engine.
///
/// Parsed from kebab-case YAML; every field has a default so a partial file
/// (or none at all) still yields a usable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Folder whose media files are cycled.
    pub folder_path: PathBuf,
    pub include_subfolders: bool,
    /// Seconds an image stays on screen before auto-advance.
    pub delay_seconds: u64,
    pub display_order: DisplayOrderMode,
    pub mute_videos: bool,
    /// Crossfade duration between two stills.
    #[serde(with = "humantime_serde")]
    pub fade: Duration,
    /// Manual inputs arriving closer together than this are dropped.
    #[serde(with = "humantime_serde")]
    pub input_debounce: Duration,
    /// Decoded images are downsampled until both dimensions fit this cap.
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            folder_path: PathBuf::new(),
            include_subfolders: true,
            delay_seconds: 5,
            display_order: DisplayOrderMode::Random,
            mute_videos: false,
            fade: Duration::from_millis(800),
            input_debounce: Duration::from_millis(300),
            max_width: 1920,
            max_height: 1080,
        }
    }
}

impl Configuration {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(
            self.delay_seconds
                .clamp(MIN_DELAY_SECONDS, MAX_DELAY_SECONDS),
        )
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (MIN_DELAY_SECONDS..=MAX_DELAY_SECONDS).contains(&self.delay_seconds),
            "delay-seconds must be within {MIN_DELAY_SECONDS}-{MAX_DELAY_SECONDS}, got {}",
            self.delay_seconds
        );
        ensure!(!self.fade.is_zero(), "fade must be positive");
        ensure!(
            self.max_width > 0 && self.max_height > 0,
            "max-width and max-height must be positive"
        );
        Ok(())
    }
}

pub fn from_yaml_file(path: &Path) -> Result<Configuration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading configuration from {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("parsing configuration from {}", path.display()))
}
