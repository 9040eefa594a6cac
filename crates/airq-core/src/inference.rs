//! Max-min composition over the output scale and centroid defuzzification.

use serde::{Deserialize, Serialize};

use crate::error::{AirQualityError, Result};
use crate::severity::{CategoryStrengths, OutputModel, Severity};

/// Upper limit on sample points per scale, keeping one evaluation bounded.
pub const MAX_OUTPUT_POINTS: usize = 100_000;

/// Inclusive discretisation `start, start + step, ..., end` of the output domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputScale {
    start: f64,
    end: f64,
    step: f64,
}

impl OutputScale {
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self> {
        if !(start.is_finite() && end.is_finite() && step.is_finite()) {
            return Err(AirQualityError::InvalidConfig(
                "output scale bounds and step must be finite".to_string(),
            ));
        }
        if step <= 0.0 {
            return Err(AirQualityError::InvalidConfig(format!(
                "output step must be positive, got {step}"
            )));
        }
        if end < start {
            return Err(AirQualityError::InvalidConfig(format!(
                "output scale end {end} is below start {start}"
            )));
        }
        let intervals = (end - start) / step;
        if !intervals.is_finite() || intervals >= MAX_OUTPUT_POINTS as f64 {
            return Err(AirQualityError::InvalidConfig(format!(
                "output step {step} is too fine for [{start}, {end}] (at most {MAX_OUTPUT_POINTS} points)"
            )));
        }
        Ok(Self { start, end, step })
    }

    pub(crate) const fn calibrated(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// Scale covering `model`'s domain with the given step.
    pub fn for_model(model: &OutputModel, step: f64) -> Result<Self> {
        Self::new(model.min, model.max, step)
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Sample points; the last point never exceeds `end`.
    pub fn points(&self) -> impl Iterator<Item = f64> + '_ {
        let n = ((self.end - self.start) / self.step + 1e-9).floor() as usize;
        (0..=n).map(move |i| self.start + i as f64 * self.step)
    }
}

/// Combined output membership at `point`: max over categories of
/// `min(strength, category_membership(point))`.
pub fn combined_membership(strengths: &CategoryStrengths, model: &OutputModel, point: f64) -> f64 {
    Severity::ALL
        .into_iter()
        .map(|s| strengths.get(s).min(model.set(s).degree(point)))
        .fold(0.0, f64::max)
}

/// Defuzzify category strengths to a crisp score via the discrete centroid.
///
/// When nothing fires (or the clipped sets miss every sample point) the
/// result is the midpoint of the output domain.
pub fn infer(strengths: &CategoryStrengths, model: &OutputModel, scale: &OutputScale) -> f64 {
    let (weighted, total) = scale.points().fold((0.0, 0.0), |(num, den), point| {
        let mu = combined_membership(strengths, model, point);
        (num + point * mu, den + mu)
    });

    if total > 0.0 {
        weighted / total
    } else {
        crate::obs::emit_degenerate_inference(model.midpoint());
        model.midpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn unit_scale() -> OutputScale {
        OutputScale::for_model(&OutputModel::standard(), 1.0).unwrap()
    }

    #[test]
    fn test_scale_points_are_inclusive() {
        let points: Vec<f64> = unit_scale().points().collect();
        assert_eq!(points.len(), 11);
        assert_eq!(points[0], 0.0);
        assert_eq!(points[10], 10.0);

        let fine = OutputScale::new(0.0, 10.0, 0.1).unwrap();
        assert_eq!(fine.points().count(), 101);
    }

    #[test]
    fn test_scale_rejects_bad_steps() {
        assert!(OutputScale::new(0.0, 10.0, 0.0).is_err());
        assert!(OutputScale::new(0.0, 10.0, -1.0).is_err());
        assert!(OutputScale::new(0.0, 10.0, f64::NAN).is_err());
        assert!(OutputScale::new(10.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_scale_rejects_unbounded_point_counts() {
        assert!(OutputScale::new(0.0, 10.0, 1e-300).is_err());
        assert!(OutputScale::new(0.0, 10.0, 1e-7).is_err());
        assert!(OutputScale::new(0.0, f64::MAX, 1.0).is_err());

        let fine = OutputScale::new(0.0, 10.0, 1e-3).unwrap();
        assert_eq!(fine.points().count(), 10_001);
    }

    #[test]
    fn test_full_excellent_centroid() {
        let mut strengths = CategoryStrengths::default();
        strengths.raise(Severity::Excellent, 1.0);
        let score = infer(&strengths, &OutputModel::standard(), &unit_scale());
        // samples 0, 1, 2 carry 1, 2/3, 1/3
        assert!(approx(score, 2.0 / 3.0));
    }

    #[test]
    fn test_symmetric_category_centroid_is_peak() {
        let mut strengths = CategoryStrengths::default();
        strengths.raise(Severity::Moderate, 0.8);
        let score = infer(&strengths, &OutputModel::standard(), &unit_scale());
        assert!(approx(score, 6.0));
    }

    #[test]
    fn test_clipping_flattens_hazardous() {
        let model = OutputModel::standard();
        let mut strengths = CategoryStrengths::default();
        strengths.raise(Severity::Hazardous, 1.0);
        let full = infer(&strengths, &model, &unit_scale());
        assert!(approx(full, 29.0 / 3.0));

        let mut weak = CategoryStrengths::default();
        weak.raise(Severity::Hazardous, 0.01);
        let clipped = infer(&weak, &model, &unit_scale());
        assert!(approx(clipped, 9.5));
    }

    #[test]
    fn test_degenerate_returns_midpoint() {
        let score = infer(
            &CategoryStrengths::default(),
            &OutputModel::standard(),
            &unit_scale(),
        );
        assert_eq!(score, 5.0);
    }

    #[test]
    fn test_combined_membership_is_max_of_clipped_sets() {
        let model = OutputModel::standard();
        let mut strengths = CategoryStrengths::default();
        strengths.raise(Severity::Good, 0.3);
        strengths.raise(Severity::Moderate, 0.9);
        // at 5: good = min(0.3, 0.5), moderate = min(0.9, 0.0)
        assert!(approx(combined_membership(&strengths, &model, 5.0), 0.3));
        // at 6: good = min(0.3, 0.0), moderate = min(0.9, 1.0)
        assert!(approx(combined_membership(&strengths, &model, 6.0), 0.9));
    }

    #[test]
    fn test_finer_scale_changes_resolution_not_band() {
        let mut strengths = CategoryStrengths::default();
        strengths.raise(Severity::Poor, 0.6);
        let model = OutputModel::standard();
        let coarse = infer(&strengths, &model, &unit_scale());
        let fine = infer(&strengths, &model, &OutputScale::new(0.0, 10.0, 0.25).unwrap());
        assert!(coarse > 6.0 && coarse <= 8.0);
        assert!(fine > 6.0 && fine <= 8.0);
    }
}
