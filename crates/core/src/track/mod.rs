use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::{CatalogKey, PlayerError, Result, Slide, SlideIndex};

/// Characters left untouched when encoding a single URI component.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes one path segment so non-ASCII names survive in URLs.
pub fn encode_component(segment: &str) -> String {
    utf8_percent_encode(segment, URI_COMPONENT).to_string()
}

/// Builds `<base>/<key>/<file>` with both trailing components encoded.
pub fn resource_url(base: &str, key: &CatalogKey, file: &str) -> String {
    let base = base.trim_end_matches('/');
    let key = encode_component(&key.to_string());
    let file = encode_component(file);
    if base.is_empty() {
        format!("{key}/{file}")
    } else {
        format!("{base}/{key}/{file}")
    }
}

/// Per-track metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackData {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub grade: String,
    pub audio_file: String,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl TrackData {
    pub fn from_json(location: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|source| PlayerError::TrackDecode {
            location: location.to_string(),
            source,
        })
    }

    pub fn slide_index(&self) -> Result<SlideIndex> {
        SlideIndex::new(self.slides.clone())
    }
}

/// Resolved location of a track's audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRef {
    /// Percent-encoded URL handed to the media element.
    pub url: String,
    /// Decoded on-disk location, when the source is file backed.
    pub path: Option<PathBuf>,
}

impl AudioRef {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: None,
        }
    }
}

/// Provider of track metadata and audio references.
pub trait TrackSource {
    fn fetch(&self, key: &CatalogKey, data_ref: &str) -> Result<TrackData>;

    fn audio_ref(&self, key: &CatalogKey, audio_file: &str) -> AudioRef;
}

/// Reads track documents from `<root>/<key>/<data_ref>`.
#[derive(Debug, Clone)]
pub struct FsTrackSource {
    root: PathBuf,
    base_url: String,
}

impl FsTrackSource {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &CatalogKey, file: &str) -> PathBuf {
        self.root.join(key.to_string()).join(file)
    }
}

impl TrackSource for FsTrackSource {
    fn fetch(&self, key: &CatalogKey, data_ref: &str) -> Result<TrackData> {
        let path = self.path_for(key, data_ref);
        let location = path.display().to_string();
        tracing::debug!(
            url = %resource_url(&self.base_url, key, data_ref),
            %location,
            "fetching track data"
        );

        let bytes = std::fs::read(&path).map_err(|source| PlayerError::TrackFetch {
            location: location.clone(),
            source,
        })?;
        TrackData::from_json(&location, &bytes)
    }

    fn audio_ref(&self, key: &CatalogKey, audio_file: &str) -> AudioRef {
        AudioRef {
            url: resource_url(&self.base_url, key, audio_file),
            path: Some(self.path_for(key, audio_file)),
        }
    }
}

/// Freshness token attached to an outstanding track load or play request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing tickets; only the latest is current.
#[derive(Debug, Default)]
pub struct LoadGate {
    latest: u64,
}

impl LoadGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> LoadTicket {
        self.latest += 1;
        LoadTicket(self.latest)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.latest
    }
}
