//! Summarise many evaluations into one representative result.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::EvaluationResult;
use crate::error::{AirQualityError, Result};

/// How a batch of results is reduced to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// The element whose score is closest to the batch mean.
    #[default]
    Average,
    /// The highest score.
    Worst,
    /// The lowest score.
    Best,
}

impl FromStr for AggregationPolicy {
    type Err = AirQualityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "average" | "avg" | "mean" => Ok(Self::Average),
            "worst" | "max" => Ok(Self::Worst),
            "best" | "min" => Ok(Self::Best),
            _ => Err(AirQualityError::UnknownAggregation(s.to_string())),
        }
    }
}

impl std::fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Average => write!(f, "average"),
            Self::Worst => write!(f, "worst"),
            Self::Best => write!(f, "best"),
        }
    }
}

/// Index of the score selected by `policy`. The first occurrence wins ties.
pub fn select_index(scores: &[f64], policy: AggregationPolicy) -> Result<usize> {
    if scores.is_empty() {
        return Err(AirQualityError::EmptyBatch);
    }

    let pick = |key: &dyn Fn(f64) -> f64| {
        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if key(*score) < key(scores[best]) {
                best = i;
            }
        }
        best
    };

    let index = match policy {
        AggregationPolicy::Worst => pick(&|s| -s),
        AggregationPolicy::Best => pick(&|s| s),
        AggregationPolicy::Average => {
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            pick(&|s| (s - mean).abs())
        }
    };
    Ok(index)
}

/// The element of `results` selected by `policy`, never a synthesised record.
pub fn aggregate(results: &[EvaluationResult], policy: AggregationPolicy) -> Result<EvaluationResult> {
    let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
    let index = select_index(&scores, policy)?;
    Ok(results[index].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worst_best_average_exact() {
        let scores = [1.0, 5.0, 9.0];
        assert_eq!(select_index(&scores, AggregationPolicy::Worst).unwrap(), 2);
        assert_eq!(select_index(&scores, AggregationPolicy::Best).unwrap(), 0);
        assert_eq!(select_index(&scores, AggregationPolicy::Average).unwrap(), 1);
    }

    #[test]
    fn test_average_picks_closest() {
        // mean 4.67
        assert_eq!(
            select_index(&[1.0, 4.0, 9.0], AggregationPolicy::Average).unwrap(),
            1
        );
    }

    #[test]
    fn test_ties_resolve_to_first_occurrence() {
        assert_eq!(
            select_index(&[3.0, 7.0, 7.0], AggregationPolicy::Worst).unwrap(),
            1
        );
        assert_eq!(
            select_index(&[2.0, 2.0, 6.0], AggregationPolicy::Best).unwrap(),
            0
        );
        // mean 5.0; 4.0 and 6.0 are equally close
        assert_eq!(
            select_index(&[4.0, 6.0], AggregationPolicy::Average).unwrap(),
            0
        );
    }

    #[test]
    fn test_empty_fails() {
        assert!(matches!(
            select_index(&[], AggregationPolicy::Worst),
            Err(AirQualityError::EmptyBatch)
        ));
        assert!(matches!(
            aggregate(&[], AggregationPolicy::Average),
            Err(AirQualityError::EmptyBatch)
        ));
    }

    #[test]
    fn test_policy_parse_and_display() {
        assert_eq!("Worst".parse::<AggregationPolicy>().unwrap(), AggregationPolicy::Worst);
        assert_eq!("avg".parse::<AggregationPolicy>().unwrap(), AggregationPolicy::Average);
        assert_eq!("min".parse::<AggregationPolicy>().unwrap(), AggregationPolicy::Best);
        assert!(matches!(
            "median".parse::<AggregationPolicy>(),
            Err(AirQualityError::UnknownAggregation(_))
        ));
        assert_eq!(AggregationPolicy::Best.to_string(), "best");
    }
}
