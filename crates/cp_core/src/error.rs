use thiserror::Error;

use crate::types::{FrameNo, MatchId};

/// Match-level setup failures. Fatal for the match, never retried.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("{what} not found: {path}")]
    NotFound { what: &'static str, path: String },

    #[error("{what} is malformed: {reason}")]
    Malformed { what: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("No frames available for match {match_id} around frame {frame_loss} (±{padding})")]
    EmptyFrameWindow { match_id: MatchId, frame_loss: FrameNo, padding: u32 },

    #[error("Nothing to export for match {match_id}: none of {requested} requested frames has tracking data")]
    EmptySequence { match_id: MatchId, requested: usize },

    #[error("No tracking rows for match {match_id} at frame {frame}")]
    NoTrackingRows { match_id: MatchId, frame: FrameNo },

    #[error("Export cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Tracking cache error: {0}")]
    Cache(String),

    #[error("Drawing failed: {0}")]
    Render(String),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl ViewerError {
    /// True for conditions the caller should show as "no data" rather than a failure.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            ViewerError::EmptyFrameWindow { .. }
                | ViewerError::EmptySequence { .. }
                | ViewerError::NoTrackingRows { .. }
        )
    }

    pub(crate) fn not_found(what: &'static str, path: impl Into<String>) -> Self {
        ConfigurationError::NotFound { what, path: path.into() }.into()
    }

    pub(crate) fn malformed(what: &'static str, reason: impl ToString) -> Self {
        ConfigurationError::Malformed { what, reason: reason.to_string() }.into()
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
