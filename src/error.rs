use thiserror::Error;

/// Internal failures. None of these reach the user: callers log them and
/// fall back to defaults at the state boundary.
#[derive(Debug, Error)]
pub enum PadError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("snapshot is not a base64 data URL")]
    NotADataUrl,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("snapshot decoder exited before delivering a result")]
    DecoderGone,
}

pub type Result<T> = std::result::Result<T, PadError>;
