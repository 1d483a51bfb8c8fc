use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{CatalogSection, FsTrackSource, PlayerError, Result, TrackCatalog};

/// Top-level configuration structure for the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Directory holding one sub-directory per catalog key.
    pub music_root: PathBuf,
    /// Prefix for audio URLs handed to the clock.
    pub base_url: String,
    /// Elapsed seconds after which "previous" rewinds instead of stepping back.
    pub restart_threshold_secs: f64,
    /// Poll rate for hosts that simulate display frames.
    pub frame_rate: u32,
    /// Continue with the next catalog entry when a track ends.
    pub auto_advance: bool,
    pub placeholder: PlaceholderText,
    /// Replaces the built-in catalog when present.
    pub catalog: Option<Vec<CatalogSection>>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            music_root: PathBuf::from("music"),
            base_url: "music".to_string(),
            restart_threshold_secs: 1.0,
            frame_rate: 60,
            auto_advance: true,
            placeholder: PlaceholderText::default(),
            catalog: None,
        }
    }
}

impl PlayerConfig {
    /// Reads a JSON config file; absent fields keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let location = path.display().to_string();
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|source| PlayerError::Config { location, source })
    }

    pub fn catalog(&self) -> TrackCatalog {
        match &self.catalog {
            Some(sections) => TrackCatalog::new(sections.clone()),
            None => TrackCatalog::builtin(),
        }
    }

    pub fn track_source(&self) -> FsTrackSource {
        FsTrackSource::new(self.music_root.clone(), self.base_url.clone())
    }

    /// Seconds between simulated frames.
    pub fn frame_interval(&self) -> f64 {
        1.0 / f64::from(self.frame_rate.max(1))
    }
}

/// Idle text for the caption and formula surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderText {
    pub caption: String,
    pub formula: String,
}

impl Default for PlaceholderText {
    fn default() -> Self {
        Self {
            caption: "Ready!\nPick a track and press play.".to_string(),
            formula: "Formulas appear here".to_string(),
        }
    }
}
