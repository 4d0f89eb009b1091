use thiserror::Error;

/// Invalid option combinations, detected before any directory is scanned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    #[error("No columns specified")]
    NoColumns,

    #[error("Unknown columns: {}. Allowed: {}", .unknown.join(", "), .allowed.join(", "))]
    UnknownColumns {
        unknown: Vec<String>,
        allowed: Vec<&'static str>,
    },

    #[error("Only one sort key allowed (got {0})")]
    MultipleSortKeys(usize),

    #[error("Choose only one sort direction: ascending or descending")]
    ConflictingSortOrder,

    #[error("Unknown size unit '{0}' (expected mb or gb)")]
    UnknownSizeUnit(String),
}
