//! Batch evaluation of sensor readings and historical assessment.
//!
//! [`evaluate_batch`] scores readings on the calling thread;
//! [`evaluate_batch_parallel`] fans them out on a [`JoinSet`] and restores
//! input order before aggregation, so both produce the same [`BatchReport`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::aggregate::{aggregate, AggregationPolicy};
use crate::engine::{AirQualityEngine, EvaluationResult};
use crate::error::{AirQualityError, Result};
use crate::obs::{emit_batch_aggregated, emit_evaluation_completed, EvaluationSpan};
use crate::reading::{ReadingQuery, ReadingSource, SensorReading};

/// One reading's evaluation, tied back to where and when it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReading {
    pub sensor_id: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub result: EvaluationResult,
}

/// Aggregated verdict over a batch plus every per-reading result in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub summary: EvaluationResult,
    pub total_readings: usize,
    pub aggregation_method: AggregationPolicy,
    pub detailed_results: Vec<ScoredReading>,
}

impl BatchReport {
    fn build(detailed_results: Vec<ScoredReading>, policy: AggregationPolicy) -> Result<Self> {
        let results: Vec<EvaluationResult> =
            detailed_results.iter().map(|s| s.result.clone()).collect();
        let summary = aggregate(&results, policy)?;
        emit_batch_aggregated(results.len(), policy, summary.score);
        Ok(Self {
            summary,
            total_readings: detailed_results.len(),
            aggregation_method: policy,
            detailed_results,
        })
    }

    /// Readings whose band matches the summary's.
    pub fn readings_in_summary_band(&self) -> impl Iterator<Item = &ScoredReading> {
        self.detailed_results
            .iter()
            .filter(move |s| s.result.band == self.summary.band)
    }
}

fn score_reading(engine: &AirQualityEngine, reading: &SensorReading) -> Result<ScoredReading> {
    let _span = EvaluationSpan::enter(&reading.sensor_id);
    let result = engine.evaluate(&reading.pollutants)?;
    emit_evaluation_completed(&reading.sensor_id, result.score, result.band);
    Ok(ScoredReading {
        sensor_id: reading.sensor_id.clone(),
        location: reading.location.clone(),
        timestamp: reading.timestamp,
        result,
    })
}

/// Score every reading in order and aggregate the results.
///
/// Fails with [`AirQualityError::EmptyBatch`] when `readings` is empty and
/// with the first per-reading error otherwise.
pub fn evaluate_batch(
    engine: &AirQualityEngine,
    readings: &[SensorReading],
    policy: AggregationPolicy,
) -> Result<BatchReport> {
    let scored = readings
        .iter()
        .map(|reading| score_reading(engine, reading))
        .collect::<Result<Vec<_>>>()?;
    BatchReport::build(scored, policy)
}

/// Concurrent form of [`evaluate_batch`].
///
/// Each reading is scored on the blocking pool. Outcomes are placed back by
/// input index before anything is inspected, so both the report and the
/// error for a bad batch (the lowest-index failure) match the sequential path.
pub async fn evaluate_batch_parallel(
    engine: Arc<AirQualityEngine>,
    readings: Vec<SensorReading>,
    policy: AggregationPolicy,
) -> Result<BatchReport> {
    let total = readings.len();
    let mut join_set = JoinSet::new();
    for (idx, reading) in readings.into_iter().enumerate() {
        let engine = Arc::clone(&engine);
        join_set.spawn_blocking(move || (idx, score_reading(&engine, &reading)));
    }

    let mut ordered: Vec<Option<Result<ScoredReading>>> = (0..total).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        let (idx, outcome) =
            joined.map_err(|e| AirQualityError::Worker(format!("evaluation task join error: {e}")))?;
        ordered[idx] = Some(outcome);
    }

    let scored = ordered
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.unwrap_or_else(|| {
                Err(AirQualityError::Worker(format!(
                    "missing evaluation result for reading {idx}"
                )))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    BatchReport::build(scored, policy)
}

/// Fetch readings matching `query` from `source` and assess them as one batch.
pub async fn assess_history(
    engine: Arc<AirQualityEngine>,
    source: &dyn ReadingSource,
    query: &ReadingQuery,
    policy: AggregationPolicy,
) -> Result<BatchReport> {
    let readings = source.fetch_readings(query).await?;
    tracing::debug!(fetched = readings.len(), "history readings fetched");
    if readings.is_empty() {
        return Err(AirQualityError::EmptyBatch);
    }
    evaluate_batch_parallel(engine, readings, policy).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::InMemoryReadingSource;
    use crate::severity::Severity;
    use crate::variable::{PollutantLevels, Variable};
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn reading(id: &str, minute: u32, levels: PollutantLevels) -> SensorReading {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap();
        SensorReading::new(id, "Centre", at, levels)
    }

    fn mixed_batch() -> Vec<SensorReading> {
        vec![
            reading("S1", 0, PollutantLevels::default()),
            reading(
                "S2",
                10,
                PollutantLevels::default().with(Variable::NitrogenDioxide, 150.0),
            ),
            reading("S3", 20, PollutantLevels::default().with(Variable::Lead, 5.0)),
        ]
    }

    struct FailingSource;

    #[async_trait]
    impl ReadingSource for FailingSource {
        async fn fetch_readings(&self, _query: &ReadingQuery) -> Result<Vec<SensorReading>> {
            Err(AirQualityError::Source("connection refused".to_string()))
        }
    }

    #[test]
    fn test_sequential_batch_keeps_order() {
        let engine = AirQualityEngine::standard();
        let report = evaluate_batch(&engine, &mixed_batch(), AggregationPolicy::Worst).unwrap();
        assert_eq!(report.total_readings, 3);
        let ids: Vec<&str> = report
            .detailed_results
            .iter()
            .map(|s| s.sensor_id.as_str())
            .collect();
        assert_eq!(ids, vec!["S1", "S2", "S3"]);
        assert_eq!(report.summary.band, Severity::Hazardous);
        assert_eq!(report.aggregation_method, AggregationPolicy::Worst);
    }

    #[test]
    fn test_best_picks_cleanest_reading() {
        let engine = AirQualityEngine::standard();
        let report = evaluate_batch(&engine, &mixed_batch(), AggregationPolicy::Best).unwrap();
        assert_eq!(report.summary.band, Severity::Excellent);
        assert_eq!(report.readings_in_summary_band().count(), 1);
    }

    #[test]
    fn test_empty_batch_fails() {
        let engine = AirQualityEngine::standard();
        assert!(matches!(
            evaluate_batch(&engine, &[], AggregationPolicy::Average),
            Err(AirQualityError::EmptyBatch)
        ));
    }

    #[test]
    fn test_bad_reading_fails_whole_batch() {
        let engine = AirQualityEngine::standard();
        let mut batch = mixed_batch();
        batch.push(reading(
            "S4",
            30,
            PollutantLevels::default().with(Variable::Ozone, f64::NAN),
        ));
        assert!(matches!(
            evaluate_batch(&engine, &batch, AggregationPolicy::Average),
            Err(AirQualityError::NonFiniteInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let engine = Arc::new(AirQualityEngine::standard());
        let sequential = evaluate_batch(&engine, &mixed_batch(), AggregationPolicy::Average).unwrap();
        let parallel = evaluate_batch_parallel(engine, mixed_batch(), AggregationPolicy::Average)
            .await
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[tokio::test]
    async fn test_parallel_reports_first_bad_reading_in_input_order() {
        let engine = Arc::new(AirQualityEngine::standard());
        let mut batch = Vec::new();
        for i in 0..32u32 {
            let levels = match i {
                3 => PollutantLevels::default().with(Variable::Ozone, f64::NAN),
                5..=31 => PollutantLevels::default().with(Variable::Lead, f64::INFINITY),
                _ => PollutantLevels::default(),
            };
            batch.push(reading(&format!("S{i}"), i, levels));
        }

        let sequential = evaluate_batch(&engine, &batch, AggregationPolicy::Worst).unwrap_err();
        for _ in 0..4 {
            let parallel = evaluate_batch_parallel(
                Arc::clone(&engine),
                batch.clone(),
                AggregationPolicy::Worst,
            )
            .await
            .unwrap_err();
            assert_eq!(parallel.to_string(), sequential.to_string());
            assert!(matches!(
                parallel,
                AirQualityError::NonFiniteInput { ref variable, .. } if variable == "ozone"
            ));
        }
    }

    #[tokio::test]
    async fn test_parallel_empty_batch_fails() {
        let engine = Arc::new(AirQualityEngine::standard());
        assert!(matches!(
            evaluate_batch_parallel(engine, Vec::new(), AggregationPolicy::Worst).await,
            Err(AirQualityError::EmptyBatch)
        ));
    }

    #[tokio::test]
    async fn test_assess_history_filters_by_sensor() {
        let engine = Arc::new(AirQualityEngine::standard());
        let source = InMemoryReadingSource::new(mixed_batch());
        let report = assess_history(
            engine,
            &source,
            &ReadingQuery::for_sensor("S2"),
            AggregationPolicy::Average,
        )
        .await
        .unwrap();
        assert_eq!(report.total_readings, 1);
        assert_eq!(report.summary.band, Severity::Moderate);
    }

    #[tokio::test]
    async fn test_assess_history_with_no_matches_is_empty_batch() {
        let engine = Arc::new(AirQualityEngine::standard());
        let source = InMemoryReadingSource::new(mixed_batch());
        let result = assess_history(
            engine,
            &source,
            &ReadingQuery::for_sensor("missing"),
            AggregationPolicy::Average,
        )
        .await;
        assert!(matches!(result, Err(AirQualityError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_source_errors_propagate() {
        let engine = Arc::new(AirQualityEngine::standard());
        let result = assess_history(
            engine,
            &FailingSource,
            &ReadingQuery::default(),
            AggregationPolicy::Average,
        )
        .await;
        assert!(matches!(result, Err(AirQualityError::Source(_))));
    }
}
