//! Output severity categories and their fuzzy sets over the score domain.

use serde::{Deserialize, Serialize};

use crate::membership::Triangle;

/// Ordered severity levels; a higher level is a worse verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Excellent,
    Good,
    Moderate,
    Poor,
    Hazardous,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Excellent,
        Severity::Good,
        Severity::Moderate,
        Severity::Poor,
        Severity::Hazardous,
    ];

    /// 1 for excellent through 5 for hazardous.
    pub fn rank(self) -> u8 {
        self as u8 + 1
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Moderate => write!(f, "moderate"),
            Self::Poor => write!(f, "poor"),
            Self::Hazardous => write!(f, "hazardous"),
        }
    }
}

/// Output domain plus one membership function per severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputModel {
    pub min: f64,
    pub max: f64,
    sets: [Triangle; 5],
}

impl OutputModel {
    /// The calibrated `[0, 10]` severity scale.
    pub fn standard() -> Self {
        Self {
            min: 0.0,
            max: 10.0,
            sets: [
                Triangle::calibrated(0.0, 0.0, 3.0),
                Triangle::calibrated(2.0, 4.0, 6.0),
                Triangle::calibrated(5.0, 6.0, 7.0),
                Triangle::calibrated(6.0, 8.0, 9.0),
                Triangle::calibrated(8.0, 10.0, 10.0),
            ],
        }
    }

    pub fn set(&self, severity: Severity) -> &Triangle {
        &self.sets[severity as usize]
    }

    /// Centre of the output domain, used when no rule fires.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

impl Default for OutputModel {
    fn default() -> Self {
        Self::standard()
    }
}

/// Aggregate firing strength per severity after the rule base has run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryStrengths {
    pub excellent: f64,
    pub good: f64,
    pub moderate: f64,
    pub poor: f64,
    pub hazardous: f64,
}

impl CategoryStrengths {
    pub fn get(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Excellent => self.excellent,
            Severity::Good => self.good,
            Severity::Moderate => self.moderate,
            Severity::Poor => self.poor,
            Severity::Hazardous => self.hazardous,
        }
    }

    /// Keep the stronger of the current and the offered support.
    pub fn raise(&mut self, severity: Severity, strength: f64) {
        let slot = match severity {
            Severity::Excellent => &mut self.excellent,
            Severity::Good => &mut self.good,
            Severity::Moderate => &mut self.moderate,
            Severity::Poor => &mut self.poor,
            Severity::Hazardous => &mut self.hazardous,
        };
        *slot = slot.max(strength);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Severity, f64)> + '_ {
        Severity::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    /// True when no rule supports any category.
    pub fn is_degenerate(&self) -> bool {
        self.iter().all(|(_, s)| s == 0.0)
    }

    /// Severity with the highest support; ties resolve to the milder level.
    pub fn dominant(&self) -> Option<Severity> {
        if self.is_degenerate() {
            return None;
        }
        self.iter()
            .fold(None::<(Severity, f64)>, |best, (sev, s)| match best {
                Some((_, top)) if top >= s => best,
                _ => Some((sev, s)),
            })
            .map(|(sev, _)| sev)
    }
}
