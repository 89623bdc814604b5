use thiserror::Error;

/// Errors surfaced by the tracking core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("track identity space exhausted after id {last}")]
    IdentityExhausted { last: u64 },
    #[error("invalid tracker configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while building or loading a [`crate::TrackerConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("unknown tracking algorithm `{0}` (expected SORT, ByteTrack or BoTSORT)")]
    UnknownTracker(String),
    #[error("class `{0}` is not present in the label list")]
    UnknownClass(String),
    #[error("failed to read config: {0}")]
    Io(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Errors from a [`crate::TrackerPipeline`] frame step.
#[derive(Debug, Error)]
pub enum PipelineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("detection failed: {0}")]
    Detection(#[source] E),
    #[error(transparent)]
    Tracking(#[from] TrackError),
}
