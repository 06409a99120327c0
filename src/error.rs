//! Error types
//!
//! Nothing here is fatal to the page. Geometry errors exclude one entity,
//! sync errors trigger a reconnect or drop one event, API errors leave the
//! previous snapshot in place.

use floorplan_types::{EntityKind, FeedDecodeError};
use thiserror::Error;

/// Entity with missing or invalid dimensions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    #[error("path needs at least 2 points (got {count})")]
    TooFewPoints { count: usize },

    #[error("containing hall {hall_id} is malformed")]
    InvalidHall { hall_id: String },
}

/// Live sync failures
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport-level failure; the channel reconnects
    #[error("sync transport disconnected: {0}")]
    Disconnected(String),

    #[error("feed decode failed: {0}")]
    Decode(#[from] FeedDecodeError),

    #[error("event for exhibition {got} ignored (viewing {expected})")]
    WrongExhibition {
        expected: uuid::Uuid,
        got: uuid::Uuid,
    },

    #[error("no layout loaded")]
    NoLayout,

    #[error("{kind} '{id}' not found")]
    UnknownEntity { kind: EntityKind, id: String },

    #[error("stall '{0}' insert is missing a valid hall_id")]
    MissingHall(String),

    #[error("patch for {kind} '{id}' rejected: {source}")]
    Patch {
        kind: EntityKind,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Layout fetch failures
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

/// Configuration failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("min_scale {min} must be positive and below max_scale {max}")]
    ScaleBounds { min: f32, max: f32 },
}

pub type SyncResult<T> = Result<T, SyncError>;
pub type ApiResult<T> = Result<T, ApiError>;
