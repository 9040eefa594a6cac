//! Triangular membership functions and the per-variable linguistic terms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AirQualityError, Result};
use crate::variable::Variable;

/// Linguistic label of a membership term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Low,
    /// Used by radiation in place of `Low`.
    Safe,
    Moderate,
    High,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Safe => write!(f, "safe"),
            Self::Moderate => write!(f, "moderate"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Piecewise-linear membership function with feet at `a`, `c` and peak at `b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    a: f64,
    b: f64,
    c: f64,
}

impl Triangle {
    /// Build a triangle; requires finite points with `a <= b <= c`.
    pub fn new(a: f64, b: f64, c: f64) -> Result<Self> {
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return Err(AirQualityError::InvalidTerm(format!(
                "non-finite control point in ({a}, {b}, {c})"
            )));
        }
        if a > b || b > c {
            return Err(AirQualityError::InvalidTerm(format!(
                "control points must satisfy a <= b <= c, got ({a}, {b}, {c})"
            )));
        }
        Ok(Self { a, b, c })
    }

    /// Calibration constants are checked by tests, so they skip validation.
    pub(crate) const fn calibrated(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn points(&self) -> (f64, f64, f64) {
        (self.a, self.b, self.c)
    }

    /// Membership degree of `x`, always in `[0, 1]`.
    ///
    /// A vertical edge (`a == b` or `b == c`) behaves as a step: the peak is
    /// 1 and the far side of the edge is 0.
    pub fn degree(&self, x: f64) -> f64 {
        let Self { a, b, c } = *self;
        if x == b {
            1.0
        } else if x < b {
            if x <= a {
                0.0
            } else {
                (x - a) / (b - a)
            }
        } else if x >= c {
            0.0
        } else {
            (c - x) / (c - b)
        }
    }
}

/// Per-variable partition of the input domains into linguistic terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipModel {
    terms: BTreeMap<Variable, Vec<(Label, Triangle)>>,
}

impl MembershipModel {
    /// Empty model; populate with [`MembershipModel::with_term`].
    pub fn empty() -> Self {
        Self {
            terms: BTreeMap::new(),
        }
    }

    /// Add or replace the term `label` of `variable`.
    pub fn with_term(mut self, variable: Variable, label: Label, triangle: Triangle) -> Self {
        let terms = self.terms.entry(variable).or_default();
        match terms.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = triangle,
            None => terms.push((label, triangle)),
        }
        self
    }

    /// The calibrated model used for air-quality scoring.
    pub fn standard() -> Self {
        use Label::{High, Low, Moderate, Safe};
        use Variable::*;

        const TABLE: [(Variable, Label, f64, f64, f64); 25] = [
            (Pm2_5, Low, 0.0, 0.0, 25.0),
            (Pm2_5, Moderate, 15.0, 50.0, 100.0),
            (Pm2_5, High, 75.0, 150.0, 300.0),
            (Pm10, Low, 0.0, 0.0, 50.0),
            (Pm10, Moderate, 25.0, 75.0, 150.0),
            (Pm10, High, 100.0, 200.0, 300.0),
            (NitrogenDioxide, Low, 0.0, 0.0, 100.0),
            (NitrogenDioxide, Moderate, 50.0, 150.0, 250.0),
            (NitrogenDioxide, High, 200.0, 350.0, 500.0),
            (SulfurDioxide, Low, 0.0, 0.0, 100.0),
            (SulfurDioxide, Moderate, 50.0, 200.0, 350.0),
            (SulfurDioxide, High, 250.0, 400.0, 500.0),
            (CarbonMonoxide, Low, 0.0, 0.0, 25.0),
            (CarbonMonoxide, Moderate, 15.0, 40.0, 60.0),
            (CarbonMonoxide, High, 50.0, 75.0, 100.0),
            (Ozone, Low, 0.0, 0.0, 50.0),
            (Ozone, Moderate, 25.0, 100.0, 175.0),
            (Ozone, High, 150.0, 250.0, 300.0),
            (Lead, Low, 0.0, 0.0, 1.0),
            (Lead, High, 0.5, 2.0, 5.0),
            (Cadmium, Low, 0.0, 0.0, 0.2),
            (Cadmium, High, 0.1, 0.5, 1.0),
            (Radiation, Safe, 0.0, 0.0, 2.0),
            (Radiation, Moderate, 1.0, 3.0, 5.0),
            (Radiation, High, 4.0, 7.0, 10.0),
        ];

        TABLE
            .into_iter()
            .fold(Self::empty(), |model, (variable, label, a, b, c)| {
                model.with_term(variable, label, Triangle::calibrated(a, b, c))
            })
    }

    pub fn term(&self, variable: Variable, label: Label) -> Option<&Triangle> {
        self.terms
            .get(&variable)?
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, t)| t)
    }

    /// Terms of one variable in declaration order.
    pub fn terms(&self, variable: Variable) -> &[(Label, Triangle)] {
        self.terms.get(&variable).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Degree of `value` in the term `label` of `variable`; 0 when the term is undefined.
    pub fn membership_degree(&self, variable: Variable, label: Label, value: f64) -> f64 {
        self.term(variable, label)
            .map(|t| t.degree(value))
            .unwrap_or(0.0)
    }

    /// Degree of `value` in every term of `variable`.
    pub fn degrees(&self, variable: Variable, value: f64) -> Vec<(Label, f64)> {
        self.terms(variable)
            .iter()
            .map(|(label, t)| (*label, t.degree(value)))
            .collect()
    }
}

impl Default for MembershipModel {
    fn default() -> Self {
        Self::standard()
    }
}
