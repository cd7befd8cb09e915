//! Error types for musicgen-rs.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("candle: {0}")]
    Candle(#[from] candle_core::Error),

    /// Audio encoding/decoding error (WAV I/O).
    #[error("audio: {0}")]
    Audio(String),

    /// Waveform has a shape we cannot persist.
    #[error("shape: {0}")]
    Shape(String),

    /// The generative model rejected a call or is in the wrong state.
    #[error("model: {0}")]
    Model(String),

    /// Inference backend transport or protocol error.
    #[error("backend: {0}")]
    Backend(String),

    /// Invalid configuration or request.
    #[error("config: {0}")]
    Config(String),

    /// I/O error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<hound::Error> for Error {
    fn from(error: hound::Error) -> Self {
        Error::Audio(error.to_string())
    }
}
