/// Result alias that carries the custom [`PlayerError`] type.
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Common error type for the core crate.
///
/// None of these are fatal to a running session: every caller in the crate
/// recovers locally (track unloaded, playback left stopped, formula shown as
/// raw source) and keeps the player interactive.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// A caller passed a value outside the accepted domain.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A slide carried a negative or non-finite timestamp.
    #[error("slide {index} has invalid time {time}")]
    InvalidSlide { index: usize, time: f64 },
    /// A catalog key did not match `<level><grade>-<semester>`.
    #[error("invalid catalog key `{0}`")]
    InvalidCatalogKey(String),
    /// Track metadata could not be read.
    #[error("failed to fetch track data from `{location}`: {source}")]
    TrackFetch {
        location: String,
        #[source]
        source: std::io::Error,
    },
    /// Track metadata was read but is not a valid track document.
    #[error("failed to decode track data from `{location}`: {source}")]
    TrackDecode {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    /// A configuration file could not be parsed.
    #[error("invalid config `{location}`: {source}")]
    Config {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    /// The clock source could not resolve an audio reference.
    #[error("audio `{0}` is unavailable")]
    AudioUnavailable(String),
    /// The clock source refused to begin playback.
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),
    /// A formula renderer could not typeset its input.
    #[error("formula rendering failed: {0}")]
    Formula(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl PlayerError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for PlayerError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for PlayerError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
