//! Error taxonomy for air-quality evaluation.

/// Errors produced by the evaluation engine and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum AirQualityError {
    /// Aggregation was asked to summarise zero results.
    #[error("cannot aggregate an empty batch")]
    EmptyBatch,

    #[error("non-finite value {value} for {variable}")]
    NonFiniteInput { variable: String, value: f64 },

    #[error("invalid membership term: {0}")]
    InvalidTerm(String),

    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("unknown aggregation method: {0}")]
    UnknownAggregation(String),

    /// A [`crate::ReadingSource`] failed to supply readings.
    #[error("reading source error: {0}")]
    Source(String),

    /// A batch worker task panicked or was cancelled.
    #[error("batch worker error: {0}")]
    Worker(String),
}

/// Result type for air-quality operations.
pub type Result<T> = std::result::Result<T, AirQualityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_display() {
        let err = AirQualityError::EmptyBatch;
        assert!(err.to_string().contains("empty batch"));
    }

    #[test]
    fn test_non_finite_input_names_variable() {
        let err = AirQualityError::NonFiniteInput {
            variable: "ozone".to_string(),
            value: f64::NAN,
        };
        let msg = err.to_string();
        assert!(msg.contains("ozone"));
        assert!(msg.contains("NaN"));
    }

    #[test]
    fn test_unknown_aggregation_display() {
        let err = AirQualityError::UnknownAggregation("median".to_string());
        assert!(err.to_string().contains("unknown aggregation method"));
        assert!(err.to_string().contains("median"));
    }
}
