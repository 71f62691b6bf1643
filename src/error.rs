use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the segmentation session.
///
/// Only `ImageLoad` is fatal. `SegmentationFailed` and `OutputWrite` are
/// reported on the status channel and the session keeps running.
/// `InvalidPhase` means a caller broke the phase contract.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to load image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("operation `{0}` is not valid in the current phase")]
    InvalidPhase(&'static str),

    #[error("segmentation failed: {0}")]
    SegmentationFailed(String),

    #[error("failed to write {}: {reason}", path.display())]
    OutputWrite { path: PathBuf, reason: String },
}

impl SessionError {
    /// Recoverable errors are reported to the user; the session continues.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::SegmentationFailed(_) | SessionError::OutputWrite { .. }
        )
    }
}
