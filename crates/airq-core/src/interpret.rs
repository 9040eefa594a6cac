//! Mapping from a crisp score to a severity band and advice.

use serde::Serialize;

use crate::severity::Severity;

/// Upper score bound (inclusive) of each band except the last.
///
/// Each bound lies between the peaks of adjacent output categories.
pub const BAND_UPPER_BOUNDS: [(Severity, f64); 4] = [
    (Severity::Excellent, 2.0),
    (Severity::Good, 4.0),
    (Severity::Moderate, 6.0),
    (Severity::Poor, 8.0),
];

/// Human-readable verdict for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Band {
    pub severity: Severity,
    pub description: &'static str,
    pub recommendation: &'static str,
}

impl Band {
    pub fn for_severity(severity: Severity) -> Self {
        let (description, recommendation) = match severity {
            Severity::Excellent => (
                "Excellent",
                "Air is completely safe for all population groups.",
            ),
            Severity::Good => (
                "Good",
                "Air quality is acceptable; minor risk for sensitive groups.",
            ),
            Severity::Moderate => (
                "Satisfactory",
                "Minor health effects are possible, especially for sensitive groups.",
            ),
            Severity::Poor => ("Poor", "High health risk. Limit time spent outdoors."),
            Severity::Hazardous => (
                "Hazardous",
                "Critical pollution level. Take immediate protective measures.",
            ),
        };
        Self {
            severity,
            description,
            recommendation,
        }
    }
}

/// Band for `score`. Scores above the last bound (and NaN) are hazardous.
pub fn classify(score: f64) -> Band {
    let severity = BAND_UPPER_BOUNDS
        .iter()
        .find(|(_, upper)| score <= *upper)
        .map(|(severity, _)| *severity)
        .unwrap_or(Severity::Hazardous);
    Band::for_severity(severity)
}
