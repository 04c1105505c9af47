use std::path::PathBuf;

use thiserror::Error;

/// Per-track failure. Every variant fails the current track only; the queue advances.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Decoder or output device could not be initialised for the track.
    #[error("cannot open {}: {reason}", .track.display())]
    Open { track: PathBuf, reason: String },

    /// Mid-stream read failure.
    #[error("decode error: {0}")]
    Decode(String),

    /// Output device rejected a write.
    #[error("audio output error: {0}")]
    Output(String),

    /// Transform buffers could not be allocated.
    #[error("out of memory allocating {what}")]
    ResourceExhaustion { what: &'static str },
}

impl PlaybackError {
    pub fn open(track: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PlaybackError::Open {
            track: track.into(),
            reason: reason.to_string(),
        }
    }
}

/// The audio subsystem could not be acquired at start-up.
#[derive(Debug, Error)]
#[error("no usable audio output device: {0}")]
pub struct OutputInitError(#[from] pub rodio::StreamError);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}
