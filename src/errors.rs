use thiserror::Error;
use uuid::Uuid;

use crate::ledger::OccurrenceKey;

/// Error type that captures every failure the finance core can surface.
#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),
    #[error("Occurrence {0} is virtual; operate on its recurring template instead")]
    NotDeletable(OccurrenceKey),
    #[error("Recurring template {template_id} was saved but its instances were not: {source}")]
    PartialSeriesFailure {
        template_id: Uuid,
        #[source]
        source: Box<FinanceError>,
    },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FinanceError>;

impl FinanceError {
    pub fn validation(message: impl Into<String>) -> Self {
        FinanceError::Validation(message.into())
    }

    /// True when the repository already holds state that needs cleanup or a retry.
    pub fn leaves_partial_state(&self) -> bool {
        matches!(self, FinanceError::PartialSeriesFailure { .. })
    }
}

impl From<std::io::Error> for FinanceError {
    fn from(err: std::io::Error) -> Self {
        FinanceError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for FinanceError {
    fn from(err: serde_json::Error) -> Self {
        FinanceError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_keeps_source_message() {
        let template_id = Uuid::new_v4();
        let err = FinanceError::PartialSeriesFailure {
            template_id,
            source: Box::new(FinanceError::ConstraintViolation("unknown account".into())),
        };
        let message = err.to_string();
        assert!(message.contains(&template_id.to_string()));
        assert!(message.contains("unknown account"));
        assert!(err.leaves_partial_state());
    }

    #[test]
    fn io_errors_map_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: FinanceError = io.into();
        assert!(matches!(err, FinanceError::Storage(ref m) if m.contains("missing file")));
    }
}
