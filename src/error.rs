// Error taxonomy for the collection engine.
// Config loading and startup stay on anyhow; these types cross the source/store seams.

use std::time::Duration;

use crate::models::MetricKind;

/// A metrics source fetch failed. Always scoped to one kind for one cycle.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("source io: {0}")]
    Io(#[from] std::io::Error),

    #[error("source parse: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No database behind this store (degraded mode).
    #[error("store unavailable")]
    Unavailable,

    #[error("store: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("store does not support {0}")]
    Unsupported(&'static str),
}

/// Why one kind's branch of a collection cycle produced no data.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("{kind}: {source}")]
    Source {
        kind: MetricKind,
        #[source]
        source: SourceError,
    },

    #[error("{kind}: write failed: {source}")]
    Write {
        kind: MetricKind,
        #[source]
        source: StoreError,
    },

    #[error("{kind}: store unavailable, write skipped")]
    StoreUnavailable { kind: MetricKind },
}

impl CollectError {
    /// Classifies a store failure for `kind`: unavailability is its own case.
    pub fn from_store(kind: MetricKind, err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => CollectError::StoreUnavailable { kind },
            other => CollectError::Write {
                kind,
                source: other,
            },
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            CollectError::Source { kind, .. }
            | CollectError::Write { kind, .. }
            | CollectError::StoreUnavailable { kind } => *kind,
        }
    }
}
