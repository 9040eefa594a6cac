//! Evaluation entry point: inputs → memberships → rules → score → band.
//!
//! [`AirQualityEngine`] is immutable after construction. Every call works on
//! call-local values only, so one engine can be shared across threads.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AirQualityError, Result};
use crate::inference::{infer, OutputScale};
use crate::interpret::classify;
use crate::membership::MembershipModel;
use crate::rules::{Rule, RuleActivation, RuleBase};
use crate::severity::{CategoryStrengths, OutputModel, Severity};
use crate::variable::PollutantLevels;

/// How values outside a variable's sampled universe are fed to the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPolicy {
    /// Clamp into `[start, last_sample]` of the variable's universe.
    #[default]
    Clamp,
    /// Use raw values; memberships decay to 0 outside their triangles.
    Permissive,
}

impl FromStr for InputPolicy {
    type Err = AirQualityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(Self::Clamp),
            "permissive" => Ok(Self::Permissive),
            other => Err(AirQualityError::InvalidConfig(format!(
                "unknown input policy '{other}' (expected clamp or permissive)"
            ))),
        }
    }
}

/// Tunable engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub input_policy: InputPolicy,
    /// Resolution of the output scale used by centroid integration.
    pub output_step: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input_policy: InputPolicy::Clamp,
            output_step: 1.0,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `AIRQ_INPUT_POLICY` and `AIRQ_OUTPUT_STEP`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(policy) = lookup("AIRQ_INPUT_POLICY") {
            config.input_policy = policy.parse()?;
        }
        if let Some(step) = lookup("AIRQ_OUTPUT_STEP") {
            config.output_step = step.trim().parse().map_err(|_| {
                AirQualityError::InvalidConfig(format!("AIRQ_OUTPUT_STEP is not a number: {step}"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_input_policy(mut self, policy: InputPolicy) -> Self {
        self.input_policy = policy;
        self
    }

    pub fn with_output_step(mut self, step: f64) -> Self {
        self.output_step = step;
        self
    }

    /// Checks the step against the calibrated output domain; custom output
    /// models are checked again when the engine builds its scale.
    pub fn validate(&self) -> Result<()> {
        if !self.output_step.is_finite() || self.output_step <= 0.0 {
            return Err(AirQualityError::InvalidConfig(format!(
                "output step must be a positive number, got {}",
                self.output_step
            )));
        }
        OutputScale::for_model(&OutputModel::standard(), self.output_step)?;
        Ok(())
    }
}

/// Outcome of scoring one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: f64,
    pub band: Severity,
    pub description: String,
    pub recommendation: String,
    pub category_strengths: CategoryStrengths,
    /// The inputs exactly as supplied.
    pub detailed_parameters: PollutantLevels,
}

impl EvaluationResult {
    /// Score rounded to two decimals, as shown to users.
    pub fn rounded_score(&self) -> f64 {
        (self.score * 100.0).round() / 100.0
    }
}

/// An evaluation together with the per-rule activations behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub result: EvaluationResult,
    /// Inputs after the input policy was applied.
    pub effective_inputs: PollutantLevels,
    pub activations: Vec<RuleActivation>,
    /// Category with the strongest support, `None` when nothing fired.
    pub dominant: Option<Severity>,
}

/// Immutable fuzzy air-quality scorer.
#[derive(Debug, Clone)]
pub struct AirQualityEngine {
    model: MembershipModel,
    rules: RuleBase,
    output: OutputModel,
    scale: OutputScale,
    config: EngineConfig,
}

impl AirQualityEngine {
    /// Engine with the calibrated model, rules and default config.
    pub fn standard() -> Self {
        let output = OutputModel::standard();
        let config = EngineConfig::default();
        Self {
            model: MembershipModel::standard(),
            rules: RuleBase::standard(),
            scale: OutputScale::calibrated(output.min, output.max, config.output_step),
            output,
            config,
        }
    }

    /// Calibrated model and rules with a custom config.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        Self::new(
            MembershipModel::standard(),
            RuleBase::standard().rules().to_vec(),
            OutputModel::standard(),
            config,
        )
    }

    /// Fully custom engine; rules are validated against `model`.
    pub fn new(
        model: MembershipModel,
        rules: Vec<Rule>,
        output: OutputModel,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let rules = RuleBase::new(rules, &model)?;
        let scale = OutputScale::for_model(&output, config.output_step)?;
        Ok(Self {
            model,
            rules,
            output,
            scale,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn membership_model(&self) -> &MembershipModel {
        &self.model
    }

    pub fn rule_base(&self) -> &RuleBase {
        &self.rules
    }

    pub fn output_model(&self) -> &OutputModel {
        &self.output
    }

    /// Rule-base support per severity for already-prepared inputs.
    pub fn fire(&self, inputs: &PollutantLevels) -> CategoryStrengths {
        self.rules.fire(&self.model, inputs)
    }

    /// Crisp score for the given category strengths.
    pub fn infer(&self, strengths: &CategoryStrengths) -> f64 {
        infer(strengths, &self.output, &self.scale)
    }

    /// Score one reading.
    pub fn evaluate(&self, levels: &PollutantLevels) -> Result<EvaluationResult> {
        levels.validate()?;
        let effective = self.prepare(levels);
        Ok(self.score(levels, &effective))
    }

    /// Score one reading and report every rule's activation.
    pub fn explain(&self, levels: &PollutantLevels) -> Result<Explanation> {
        levels.validate()?;
        let effective = self.prepare(levels);
        let result = self.score(levels, &effective);
        Ok(Explanation {
            dominant: result.category_strengths.dominant(),
            activations: self.rules.activations(&self.model, &effective),
            effective_inputs: effective,
            result,
        })
    }

    fn prepare(&self, levels: &PollutantLevels) -> PollutantLevels {
        levels.map(|variable, value| {
            let universe = variable.universe();
            if !universe.contains(value) {
                crate::obs::emit_out_of_domain(variable, value, self.config.input_policy);
            }
            match self.config.input_policy {
                InputPolicy::Clamp => universe.clamp(value),
                InputPolicy::Permissive => value,
            }
        })
    }

    fn score(&self, raw: &PollutantLevels, effective: &PollutantLevels) -> EvaluationResult {
        let strengths = self.fire(effective);
        let score = self.infer(&strengths);
        let band = classify(score);
        tracing::debug!(
            score,
            band = %band.severity,
            output_step = self.scale.step(),
            "reading evaluated"
        );
        EvaluationResult {
            score,
            band: band.severity,
            description: band.description.to_string(),
            recommendation: band.recommendation.to_string(),
            category_strengths: strengths,
            detailed_parameters: *raw,
        }
    }
}

impl Default for AirQualityEngine {
    fn default() -> Self {
        Self::standard()
    }
}
