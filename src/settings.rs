//! Persisted key/value settings: the handful of knobs a user changes between
//! runs (folder, delay, order, subfolders, mute).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::{Configuration, DisplayOrderMode, MAX_DELAY_SECONDS, MIN_DELAY_SECONDS};

/// Key/value store collaborator. The engine never touches it directly; the
/// binary reads it at startup and writes it when a setting changes.
pub trait SettingsStore {
    fn folder_path(&self) -> PathBuf;
    fn set_folder_path(&mut self, path: &Path) -> Result<()>;

    /// Clamped to 1-300 on both read and write.
    fn delay_seconds(&self) -> u64;
    fn set_delay_seconds(&mut self, seconds: u64) -> Result<()>;

    fn include_subfolders(&self) -> bool;
    fn set_include_subfolders(&mut self, include: bool) -> Result<()>;

    fn display_order(&self) -> DisplayOrderMode;
    fn set_display_order(&mut self, order: DisplayOrderMode) -> Result<()>;

    fn mute_videos(&self) -> bool;
    fn set_mute_videos(&mut self, mute: bool) -> Result<()>;
}

/// YAML-file-backed settings store. The whole [`Configuration`] lives in one
/// file; setters rewrite it on every change.
#[derive(Debug)]
pub struct YamlSettings {
    path: PathBuf,
    cfg: Configuration,
}

impl YamlSettings {
    /// Load settings from `path`, falling back to defaults when absent.
    pub fn load(path: &Path) -> Result<Self> {
        let cfg = if path.exists() {
            crate::config::from_yaml_file(path)?
        } else {
            debug!(path = %path.display(), "settings file absent; using defaults");
            Configuration::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            cfg,
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.cfg
    }

    fn persist(&self) -> Result<()> {
        let text = serde_yaml::to_string(&self.cfg).context("serializing settings")?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("writing settings to {}", self.path.display()))
    }
}

impl SettingsStore for YamlSettings {
    fn folder_path(&self) -> PathBuf {
        self.cfg.folder_path.clone()
    }

    fn set_folder_path(&mut self, path: &Path) -> Result<()> {
        self.cfg.folder_path = path.to_path_buf();
        self.persist()
    }

    fn delay_seconds(&self) -> u64 {
        self.cfg
            .delay_seconds
            .clamp(MIN_DELAY_SECONDS, MAX_DELAY_SECONDS)
    }

    fn set_delay_seconds(&mut self, seconds: u64) -> Result<()> {
        self.cfg.delay_seconds = seconds.clamp(MIN_DELAY_SECONDS, MAX_DELAY_SECONDS);
        self.persist()
    }

    fn include_subfolders(&self) -> bool {
        self.cfg.include_subfolders
    }

    fn set_include_subfolders(&mut self, include: bool) -> Result<()> {
        self.cfg.include_subfolders = include;
        self.persist()
    }

    fn display_order(&self) -> DisplayOrderMode {
        self.cfg.display_order
    }

    fn set_display_order(&mut self, order: DisplayOrderMode) -> Result<()> {
        self.cfg.display_order = order;
        self.persist()
    }

    fn mute_videos(&self) -> bool {
        self.cfg.mute_videos
    }

    fn set_mute_videos(&mut self, mute: bool) -> Result<()> {
        self.cfg.mute_videos = mute;
        self.persist()
    }
}
