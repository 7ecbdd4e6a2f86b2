//! Failures that can abort a single link or item while previewing.
//!
//! None of these ever stop the bot: the previewer logs them and moves on to
//! the next item, link or message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    /// The preview image lives under a path type the image proxy can't serve.
    #[error("Steam URL type `{0}` is not supported")]
    UnsupportedPreviewFormat(String),

    /// Steam answered with a payload that doesn't have the shape we read.
    #[error("malformed Steam payload: {0}")]
    MalformedPayload(String),

    /// A workshop link carried an `id` that isn't an integer.
    #[error("workshop item id `{0}` is not numeric")]
    InvalidItemId(String),

    #[error("request to Steam failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Steam responded with {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to send message: {0}")]
    Send(String),
}

impl PreviewError {
    pub fn malformed(context: impl Into<String>) -> Self {
        Self::MalformedPayload(context.into())
    }
}

impl From<serde_json::Error> for PreviewError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

pub type PreviewResult<T> = Result<T, PreviewError>;
