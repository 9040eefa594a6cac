//! Declarative fuzzy rule base.
//!
//! A [`Rule`] pairs an [`Antecedent`] expression tree with the [`Severity`]
//! it supports. Leaves look up a membership degree; `And` takes the minimum
//! of its children and `Or` the maximum. Rules fire independently and each
//! category keeps the strongest support it receives, so rule order never
//! changes the outcome.

use serde::{Deserialize, Serialize};

use crate::error::{AirQualityError, Result};
use crate::membership::{Label, MembershipModel};
use crate::severity::{CategoryStrengths, Severity};
use crate::variable::{PollutantLevels, Variable};

/// Condition part of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Antecedent {
    /// `variable is label`.
    Leaf { variable: Variable, label: Label },
    /// Fuzzy AND: minimum over operands.
    And { operands: Vec<Antecedent> },
    /// Fuzzy OR: maximum over operands.
    Or { operands: Vec<Antecedent> },
}

impl Antecedent {
    pub fn is(variable: Variable, label: Label) -> Self {
        Self::Leaf { variable, label }
    }

    pub fn all(operands: impl IntoIterator<Item = Antecedent>) -> Self {
        Self::And {
            operands: operands.into_iter().collect(),
        }
    }

    pub fn any(operands: impl IntoIterator<Item = Antecedent>) -> Self {
        Self::Or {
            operands: operands.into_iter().collect(),
        }
    }

    /// Degree to which `inputs` satisfy this condition.
    pub fn evaluate(&self, model: &MembershipModel, inputs: &PollutantLevels) -> f64 {
        match self {
            Self::Leaf { variable, label } => {
                model.membership_degree(*variable, *label, inputs.get(*variable))
            }
            Self::And { operands } => operands
                .iter()
                .map(|op| op.evaluate(model, inputs))
                .fold(1.0, f64::min),
            Self::Or { operands } => operands
                .iter()
                .map(|op| op.evaluate(model, inputs))
                .fold(0.0, f64::max),
        }
    }

    fn check(&self, model: &MembershipModel, rule_id: &str) -> Result<()> {
        match self {
            Self::Leaf { variable, label } => {
                if model.term(*variable, *label).is_none() {
                    return Err(AirQualityError::InvalidRule(format!(
                        "rule {rule_id} references undefined term {variable}/{label}"
                    )));
                }
                Ok(())
            }
            Self::And { operands } | Self::Or { operands } => {
                if operands.is_empty() {
                    return Err(AirQualityError::InvalidRule(format!(
                        "rule {rule_id} has an empty AND/OR node"
                    )));
                }
                operands.iter().try_for_each(|op| op.check(model, rule_id))
            }
        }
    }
}

impl std::fmt::Display for Antecedent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf { variable, label } => write!(f, "{} is {label}", variable.display_name()),
            Self::And { operands } => write_joined(f, operands, "AND"),
            Self::Or { operands } => write_joined(f, operands, "OR"),
        }
    }
}

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    operands: &[Antecedent],
    sep: &str,
) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, op) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, " {sep} ")?;
        }
        write!(f, "{op}")?;
    }
    write!(f, ")")
}

/// One if-then rule with an implicit weight of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub description: String,
    pub antecedent: Antecedent,
    pub consequent: Severity,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        antecedent: Antecedent,
        consequent: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            antecedent,
            consequent,
        }
    }
}

/// Firing strength of a single rule for one input vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleActivation {
    pub rule_id: String,
    pub consequent: Severity,
    pub strength: f64,
}

/// Validated, immutable set of rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBase {
    rules: Vec<Rule>,
}

impl RuleBase {
    /// Validate `rules` against the terms defined in `model`.
    pub fn new(rules: Vec<Rule>, model: &MembershipModel) -> Result<Self> {
        if rules.is_empty() {
            return Err(AirQualityError::InvalidRule(
                "rule base must contain at least one rule".to_string(),
            ));
        }
        for rule in &rules {
            rule.antecedent.check(model, &rule.id)?;
        }
        Ok(Self { rules })
    }

    /// The nine calibrated air-quality rules.
    pub fn standard() -> Self {
        Self {
            rules: standard_rules(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Aggregate support per severity: the maximum over rules targeting it.
    pub fn fire(&self, model: &MembershipModel, inputs: &PollutantLevels) -> CategoryStrengths {
        let mut strengths = CategoryStrengths::default();
        for rule in &self.rules {
            let strength = rule.antecedent.evaluate(model, inputs);
            tracing::trace!(rule = %rule.id, strength, consequent = %rule.consequent, "rule fired");
            strengths.raise(rule.consequent, strength);
        }
        strengths
    }

    /// Firing strength of every rule, in rule order.
    pub fn activations(
        &self,
        model: &MembershipModel,
        inputs: &PollutantLevels,
    ) -> Vec<RuleActivation> {
        self.rules
            .iter()
            .map(|rule| RuleActivation {
                rule_id: rule.id.clone(),
                consequent: rule.consequent,
                strength: rule.antecedent.evaluate(model, inputs),
            })
            .collect()
    }
}

impl Default for RuleBase {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_rules() -> Vec<Rule> {
    use Antecedent as A;
    use Label::{High, Low, Moderate, Safe};
    use Variable::*;

    vec![
        Rule::new(
            "R1",
            "all pollutants low",
            A::all([
                A::is(Pm2_5, Low),
                A::is(Pm10, Low),
                A::is(NitrogenDioxide, Low),
                A::is(SulfurDioxide, Low),
                A::is(CarbonMonoxide, Low),
                A::is(Ozone, Low),
                A::is(Lead, Low),
                A::is(Cadmium, Low),
                A::is(Radiation, Safe),
            ]),
            Severity::Excellent,
        ),
        Rule::new(
            "R2",
            "moderate particulates with low gases",
            A::all([
                A::any([A::is(Pm2_5, Moderate), A::is(Pm10, Moderate)]),
                A::is(NitrogenDioxide, Low),
                A::is(SulfurDioxide, Low),
                A::is(CarbonMonoxide, Low),
                A::is(Ozone, Low),
            ]),
            Severity::Good,
        ),
        Rule::new(
            "R3",
            "low particulates with a moderate gas",
            A::all([
                A::is(Pm2_5, Low),
                A::any([
                    A::is(NitrogenDioxide, Moderate),
                    A::is(SulfurDioxide, Moderate),
                    A::is(CarbonMonoxide, Moderate),
                ]),
            ]),
            Severity::Moderate,
        ),
        Rule::new("R4", "high ozone", A::is(Ozone, High), Severity::Poor),
        Rule::new(
            "R5",
            "high heavy metals or radiation",
            A::any([
                A::is(Lead, High),
                A::is(Cadmium, High),
                A::is(Radiation, High),
            ]),
            Severity::Hazardous,
        ),
        Rule::new(
            "R6",
            "moderate particulates, gases and carbon monoxide together",
            A::all([
                A::any([A::is(Pm2_5, Moderate), A::is(Pm10, Moderate)]),
                A::any([A::is(NitrogenDioxide, Moderate), A::is(SulfurDioxide, Moderate)]),
                A::is(CarbonMonoxide, Moderate),
            ]),
            Severity::Poor,
        ),
        Rule::new(
            "R7",
            "high particulates",
            A::any([A::is(Pm2_5, High), A::is(Pm10, High)]),
            Severity::Poor,
        ),
        Rule::new(
            "R8",
            "high gases",
            A::any([
                A::is(NitrogenDioxide, High),
                A::is(SulfurDioxide, High),
                A::is(CarbonMonoxide, High),
            ]),
            Severity::Hazardous,
        ),
        Rule::new(
            "R9",
            "high particulates, NO2, SO2 and ozone at once",
            A::all([
                A::is(Pm2_5, High),
                A::is(NitrogenDioxide, High),
                A::is(SulfurDioxide, High),
                A::is(Ozone, High),
            ]),
            Severity::Hazardous,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_standard_rule_base_validates() {
        let model = MembershipModel::standard();
        let rules = RuleBase::new(standard_rules(), &model).unwrap();
        assert_eq!(rules.len(), 9);
        assert_eq!(rules, RuleBase::standard());
    }

    #[test]
    fn test_and_is_min_or_is_max() {
        let model = MembershipModel::standard();
        // pm2_5 low = 0.2, pm10 low = 0.6
        let inputs = PollutantLevels::default()
            .with(Variable::Pm2_5, 20.0)
            .with(Variable::Pm10, 20.0);
        let and = Antecedent::all([
            Antecedent::is(Variable::Pm2_5, Label::Low),
            Antecedent::is(Variable::Pm10, Label::Low),
        ]);
        let or = Antecedent::any([
            Antecedent::is(Variable::Pm2_5, Label::Low),
            Antecedent::is(Variable::Pm10, Label::Low),
        ]);
        assert!(approx(and.evaluate(&model, &inputs), 0.2));
        assert!(approx(or.evaluate(&model, &inputs), 0.6));
    }

    #[test]
    fn test_all_zero_fires_only_excellent() {
        let strengths = RuleBase::standard().fire(
            &MembershipModel::standard(),
            &PollutantLevels::default(),
        );
        assert_eq!(strengths.excellent, 1.0);
        assert_eq!(strengths.good, 0.0);
        assert_eq!(strengths.moderate, 0.0);
        assert_eq!(strengths.poor, 0.0);
        assert_eq!(strengths.hazardous, 0.0);
    }

    #[test]
    fn test_same_category_takes_strongest_rule() {
        // R4 (ozone high) fires 0.5, R7 (pm10 high) fires 1.0; both target poor.
        let inputs = PollutantLevels::default()
            .with(Variable::Ozone, 200.0)
            .with(Variable::Pm10, 200.0);
        let base = RuleBase::standard();
        let model = MembershipModel::standard();
        let strengths = base.fire(&model, &inputs);
        assert_eq!(strengths.poor, 1.0);

        let activations = base.activations(&model, &inputs);
        let r4 = activations.iter().find(|a| a.rule_id == "R4").unwrap();
        assert!(approx(r4.strength, 0.5));
    }

    #[test]
    fn test_rule_order_does_not_matter() {
        let model = MembershipModel::standard();
        let inputs = PollutantLevels {
            pm2_5: 73.07,
            pm10: 119.04,
            nitrogen_dioxide: 109.27,
            sulfur_dioxide: 383.24,
            carbon_monoxide: 13.67,
            ozone: 111.43,
            lead: 0.4096,
            cadmium: 0.1545,
            radiation_level: 2.39,
        };
        let forward = RuleBase::standard();
        let mut reversed_rules = standard_rules();
        reversed_rules.reverse();
        let reversed = RuleBase::new(reversed_rules, &model).unwrap();
        assert_eq!(forward.fire(&model, &inputs), reversed.fire(&model, &inputs));
    }

    #[test]
    fn test_rejects_undefined_term() {
        let model = MembershipModel::standard();
        let rule = Rule::new(
            "bad",
            "lead has no moderate term",
            Antecedent::is(Variable::Lead, Label::Moderate),
            Severity::Poor,
        );
        let err = RuleBase::new(vec![rule], &model).unwrap_err();
        assert!(err.to_string().contains("undefined term"));
    }

    #[test]
    fn test_rejects_empty_operator_and_empty_base() {
        let model = MembershipModel::standard();
        let rule = Rule::new(
            "empty",
            "",
            Antecedent::Or { operands: vec![] },
            Severity::Good,
        );
        assert!(matches!(
            RuleBase::new(vec![rule], &model),
            Err(AirQualityError::InvalidRule(_))
        ));
        assert!(RuleBase::new(Vec::new(), &model).is_err());
    }

    #[test]
    fn test_display_renders_expression() {
        let base = RuleBase::standard();
        let rule = &base.rules()[6];
        assert_eq!(rule.antecedent.to_string(), "(PM2.5 is high OR PM10 is high)");
    }

    #[test]
    fn test_antecedent_serde_shape() {
        let json = serde_json::to_value(Antecedent::is(Variable::Ozone, Label::High)).unwrap();
        assert_eq!(json["op"], "leaf");
        assert_eq!(json["variable"], "ozone");
        assert_eq!(json["label"], "high");
    }
}
