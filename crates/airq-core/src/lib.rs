//! Fuzzy multi-criteria air-quality evaluation.
//!
//! Nine pollutant readings are fuzzified against triangular membership
//! terms, combined by a fixed rule base into five severity categories, and
//! defuzzified to a crisp 0 to 10 score with a band and recommendation.
//! Batches of readings can be aggregated into one representative verdict.

pub mod aggregate;
pub mod batch;
pub mod engine;
pub mod error;
pub mod inference;
pub mod interpret;
pub mod membership;
pub mod obs;
pub mod reading;
pub mod rules;
pub mod severity;
pub mod telemetry;
pub mod variable;

pub use aggregate::{aggregate, select_index, AggregationPolicy};
pub use batch::{
    assess_history, evaluate_batch, evaluate_batch_parallel, BatchReport, ScoredReading,
};
pub use engine::{AirQualityEngine, EngineConfig, EvaluationResult, Explanation, InputPolicy};
pub use error::{AirQualityError, Result};
pub use inference::{combined_membership, infer, OutputScale};
pub use interpret::{classify, Band, BAND_UPPER_BOUNDS};
pub use membership::{Label, MembershipModel, Triangle};
pub use reading::{InMemoryReadingSource, ReadingQuery, ReadingSource, SensorReading};
pub use rules::{Antecedent, Rule, RuleActivation, RuleBase};
pub use severity::{CategoryStrengths, OutputModel, Severity};
pub use telemetry::init_tracing;
pub use variable::{PollutantLevels, Universe, Variable};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
