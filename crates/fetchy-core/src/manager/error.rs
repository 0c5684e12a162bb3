//! Errors returned synchronously to callers of the manager.

use std::path::PathBuf;

use crate::store::{JobId, JobState, ParseQualityError};

/// Rejected job request. No job record is created.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("URL is required")]
    MissingUrl,
    #[error("invalid URL {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported URL scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
    #[error(transparent)]
    InvalidQuality(#[from] ParseQualityError),
}

/// Why an artifact cannot be handed out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job {id} is {state}, not completed")]
    NotReady { id: JobId, state: JobState },
    #[error("file for job {id} is missing: {}", .path.display())]
    Missing { id: JobId, path: PathBuf },
}
