//! Input variables, their sampled domains, and the nine-value pollutant record.

use serde::{Deserialize, Serialize};

use crate::error::{AirQualityError, Result};

/// One of the nine scored inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    #[serde(rename = "pm2_5")]
    Pm2_5,
    Pm10,
    NitrogenDioxide,
    SulfurDioxide,
    CarbonMonoxide,
    Ozone,
    Lead,
    Cadmium,
    #[serde(rename = "radiation_level")]
    Radiation,
}

impl Variable {
    /// Every variable, in canonical order.
    pub const ALL: [Variable; 9] = [
        Variable::Pm2_5,
        Variable::Pm10,
        Variable::NitrogenDioxide,
        Variable::SulfurDioxide,
        Variable::CarbonMonoxide,
        Variable::Ozone,
        Variable::Lead,
        Variable::Cadmium,
        Variable::Radiation,
    ];

    /// Stable key, identical to the field name in [`PollutantLevels`].
    pub fn key(self) -> &'static str {
        match self {
            Self::Pm2_5 => "pm2_5",
            Self::Pm10 => "pm10",
            Self::NitrogenDioxide => "nitrogen_dioxide",
            Self::SulfurDioxide => "sulfur_dioxide",
            Self::CarbonMonoxide => "carbon_monoxide",
            Self::Ozone => "ozone",
            Self::Lead => "lead",
            Self::Cadmium => "cadmium",
            Self::Radiation => "radiation_level",
        }
    }

    /// Short human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Pm2_5 => "PM2.5",
            Self::Pm10 => "PM10",
            Self::NitrogenDioxide => "NO2",
            Self::SulfurDioxide => "SO2",
            Self::CarbonMonoxide => "CO",
            Self::Ozone => "Ozone",
            Self::Lead => "Lead",
            Self::Cadmium => "Cadmium",
            Self::Radiation => "Radiation",
        }
    }

    /// Sampled domain of this variable. These are calibration constants.
    pub fn universe(self) -> Universe {
        match self {
            Self::Pm2_5 | Self::Pm10 | Self::Ozone => Universe::new(0.0, 300.0, 1.0),
            Self::NitrogenDioxide | Self::SulfurDioxide => Universe::new(0.0, 500.0, 1.0),
            Self::CarbonMonoxide => Universe::new(0.0, 100.0, 1.0),
            Self::Lead => Universe::new(0.0, 5.0, 0.01),
            Self::Cadmium => Universe::new(0.0, 1.0, 0.001),
            Self::Radiation => Universe::new(0.0, 10.0, 0.1),
        }
    }

    /// Look up a variable by its key or display name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        let needle = name.trim();
        Self::ALL.into_iter().find(|v| {
            v.key().eq_ignore_ascii_case(needle) || v.display_name().eq_ignore_ascii_case(needle)
        })
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Half-open sampled domain `start, start + step, ...` below `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Universe {
    pub const fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    /// Number of samples in the domain.
    pub fn len(&self) -> usize {
        ((self.stop - self.start) / self.step).round().max(0.0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest sampled point; `stop` itself is never sampled.
    pub fn last_sample(&self) -> f64 {
        match self.len() {
            0 => self.start,
            n => self.start + (n - 1) as f64 * self.step,
        }
    }

    /// Clamp `value` onto the sampled span `[start, last_sample]`.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.start, self.last_sample())
    }

    /// Whether `value` lies in the nominal closed domain `[start, stop]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.start && value <= self.stop
    }
}

/// The nine measurements scored for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PollutantLevels {
    pub pm2_5: f64,
    pub pm10: f64,
    pub nitrogen_dioxide: f64,
    pub sulfur_dioxide: f64,
    pub carbon_monoxide: f64,
    pub ozone: f64,
    pub lead: f64,
    pub cadmium: f64,
    pub radiation_level: f64,
}

impl PollutantLevels {
    /// Value of a single variable.
    pub fn get(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Pm2_5 => self.pm2_5,
            Variable::Pm10 => self.pm10,
            Variable::NitrogenDioxide => self.nitrogen_dioxide,
            Variable::SulfurDioxide => self.sulfur_dioxide,
            Variable::CarbonMonoxide => self.carbon_monoxide,
            Variable::Ozone => self.ozone,
            Variable::Lead => self.lead,
            Variable::Cadmium => self.cadmium,
            Variable::Radiation => self.radiation_level,
        }
    }

    /// Replace a single variable, returning the updated record.
    pub fn with(mut self, variable: Variable, value: f64) -> Self {
        let slot = match variable {
            Variable::Pm2_5 => &mut self.pm2_5,
            Variable::Pm10 => &mut self.pm10,
            Variable::NitrogenDioxide => &mut self.nitrogen_dioxide,
            Variable::SulfurDioxide => &mut self.sulfur_dioxide,
            Variable::CarbonMonoxide => &mut self.carbon_monoxide,
            Variable::Ozone => &mut self.ozone,
            Variable::Lead => &mut self.lead,
            Variable::Cadmium => &mut self.cadmium,
            Variable::Radiation => &mut self.radiation_level,
        };
        *slot = value;
        self
    }

    /// `(variable, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        Variable::ALL.into_iter().map(move |v| (v, self.get(v)))
    }

    /// Reject NaN and infinities; out-of-domain finite values are accepted.
    pub fn validate(&self) -> Result<()> {
        for (variable, value) in self.iter() {
            if !value.is_finite() {
                return Err(AirQualityError::NonFiniteInput {
                    variable: variable.key().to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Apply `f` to every value.
    pub fn map(&self, mut f: impl FnMut(Variable, f64) -> f64) -> Self {
        Variable::ALL
            .into_iter()
            .fold(*self, |acc, v| acc.with(v, f(v, self.get(v))))
    }
}
