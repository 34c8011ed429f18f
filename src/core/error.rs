// Copyright @yucwang 2026

use thiserror::Error;

/// Errors raised while building media, volumes and spectra. Rendering itself
/// never fails; numerical trouble only ends the affected path.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bounding box for {0}: a bounded medium needs a finite, non-empty box")]
    InvalidBoundingBox(String),

    #[error("spectral compound naming: {0}")]
    CompoundNaming(String),

    #[error("volume has {actual} channels but {expected} compounds were bound")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("unsupported density activation `{0}`")]
    UnsupportedActivation(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid volume data: {0}")]
    InvalidVolume(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter { name: name.to_string(), reason: reason.into() }
    }
}
