//! Structured observability hooks for evaluation events.
//!
//! Every emitter logs with an `event` field so JSON output can be filtered
//! by event name. Verbosity follows `RUST_LOG`; see [`crate::init_tracing`].

use tracing::{debug, info};

use crate::aggregate::AggregationPolicy;
use crate::engine::InputPolicy;
use crate::severity::Severity;
use crate::variable::Variable;

/// RAII guard that keeps an evaluation-scoped span entered.
///
/// ```ignore
/// let _span = EvaluationSpan::enter("KYV_IND_001");
/// // events emitted here carry reading_id = "KYV_IND_001"
/// ```
pub struct EvaluationSpan {
    _span: tracing::span::EnteredSpan,
}

impl EvaluationSpan {
    pub fn enter(reading_id: &str) -> Self {
        let span = tracing::info_span!("airq.evaluation", reading_id = %reading_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: one reading scored.
pub fn emit_evaluation_completed(reading_id: &str, score: f64, band: Severity) {
    info!(
        event = "evaluation.completed",
        reading_id = %reading_id,
        score = score,
        band = %band,
    );
}

/// Emit event: no output category received support, score fell back to `midpoint`.
pub fn emit_degenerate_inference(midpoint: f64) {
    debug!(event = "inference.degenerate", midpoint = midpoint);
}

/// Emit event: a batch was reduced to one summary result.
pub fn emit_batch_aggregated(total_readings: usize, method: AggregationPolicy, score: f64) {
    info!(
        event = "batch.aggregated",
        total_readings = total_readings,
        method = %method,
        score = score,
    );
}

/// Emit event: an input fell outside its variable's nominal range.
pub fn emit_out_of_domain(variable: Variable, value: f64, policy: InputPolicy) {
    debug!(
        event = "input.out_of_domain",
        variable = %variable,
        value = value,
        policy = ?policy,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_span_create() {
        let _span = EvaluationSpan::enter("test-sensor");
        emit_evaluation_completed("test-sensor", 0.67, Severity::Excellent);
    }

    #[test]
    fn test_emitters_without_subscriber() {
        emit_degenerate_inference(5.0);
        emit_batch_aggregated(3, AggregationPolicy::Worst, 9.1);
        emit_out_of_domain(Variable::Lead, 7.5, InputPolicy::Clamp);
    }
}
