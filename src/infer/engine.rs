//! Inference pipeline: fuzzify, fire rules, implicate, aggregate, defuzzify.
//!
//! [`InferEngine`] only borrows the frozen configuration of a
//! [`crate::system::FuzzySystem`]; every buffer it fills belongs to the call.

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};
use crate::rules::{ActivationRecord, RuleBase};
use crate::variable::{LinguisticVariable, Memberships, VariableRegistry};

use super::{Defuzzifier, FuzzyOutputSet, InferenceResult, Inputs};

/// Number of rules named in a result's explanation.
pub const EXPLAINED_RULES: usize = 3;

/// Stateless view over a configured system.
pub struct InferEngine<'a> {
    registry: &'a VariableRegistry,
    rules: &'a RuleBase,
    output: &'a LinguisticVariable,
    output_grid: &'a [f64],
}

impl<'a> InferEngine<'a> {
    pub fn new(
        registry: &'a VariableRegistry,
        rules: &'a RuleBase,
        output: &'a LinguisticVariable,
        output_grid: &'a [f64],
    ) -> Self {
        Self {
            registry,
            rules,
            output,
            output_grid,
        }
    }

    /// Run one inference call.
    pub fn infer(&self, inputs: &Inputs, method: Defuzzifier) -> ConfigResult<InferenceResult> {
        let mut memberships = self.fuzzify_inputs(inputs)?;
        let fired = self.rules.evaluate(&memberships);
        let fallback = fired.is_empty();

        let set = if fallback {
            FuzzyOutputSet::spike(self.output.midpoint())
        } else {
            self.aggregate(&fired)
        };

        let score = self.output.clip(method.defuzzify(&set));
        let confidence = fired.iter().map(|r| r.degree).fold(0.0, f64::max);

        let output_degrees = self.output.fuzzify(score);
        let dominant_term = dominant(self.output, score);
        memberships.insert(self.output.name.clone(), output_degrees);

        let explanation = explain(score, confidence, dominant_term.as_deref(), &fired);

        tracing::debug!(
            score,
            confidence,
            fired = fired.len(),
            fallback,
            method = %method,
            "inference complete"
        );

        Ok(InferenceResult {
            score,
            confidence,
            fired_rules: fired,
            membership_degrees: memberships,
            explanation,
            dominant_term,
            defuzzifier: method,
            fallback,
        })
    }

    /// Validate the input map and fuzzify every declared input.
    pub fn fuzzify_inputs(&self, inputs: &Inputs) -> ConfigResult<Memberships> {
        let mut names: Vec<&String> = inputs.keys().collect();
        names.sort();
        if let Some(unknown) = names
            .into_iter()
            .find(|name| !self.registry.inputs().any(|v| &v.name == *name))
        {
            return Err(ConfigError::UnknownInput {
                name: unknown.clone(),
            });
        }

        let mut memberships = Memberships::new();
        for variable in self.registry.inputs() {
            let crisp = inputs
                .get(&variable.name)
                .copied()
                .ok_or_else(|| ConfigError::MissingInput {
                    name: variable.name.clone(),
                })?;
            let degrees = self.registry.fuzzify(&variable.name, crisp)?;
            memberships.insert(variable.name.clone(), degrees);
        }
        Ok(memberships)
    }

    /// Clip each concluded term at its strongest activation and take the
    /// pointwise maximum over terms.
    pub fn aggregate(&self, fired: &[ActivationRecord]) -> FuzzyOutputSet {
        let mut strongest: BTreeMap<&str, f64> = BTreeMap::new();
        for record in fired {
            let entry = strongest.entry(record.consequent.as_str()).or_insert(0.0);
            *entry = entry.max(record.degree);
        }

        let clipped: Vec<_> = strongest
            .into_iter()
            .filter_map(|(term, activation)| self.output.term(term).map(|t| (t, activation)))
            .collect();

        let degrees = self
            .output_grid
            .iter()
            .map(|&y| {
                clipped
                    .iter()
                    .map(|(term, activation)| activation.min(term.evaluate(y)))
                    .fold(0.0, f64::max)
            })
            .collect();

        FuzzyOutputSet::new(self.output_grid.to_vec(), degrees)
    }
}

/// Term with the highest positive degree at `score`; the first defined
/// term wins ties.
fn dominant(output: &LinguisticVariable, score: f64) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for term in &output.terms {
        let degree = term.evaluate(score);
        if degree > best.map_or(0.0, |(_, top)| top) {
            best = Some((term.name.as_str(), degree));
        }
    }
    best.map(|(name, _)| name.to_string())
}

fn explain(
    score: f64,
    confidence: f64,
    dominant_term: Option<&str>,
    fired: &[ActivationRecord],
) -> String {
    let label = dominant_term
        .map(|t| t.replace('_', " "))
        .unwrap_or_else(|| "no dominant term".to_string());
    if fired.is_empty() {
        return format!("{label} (no rule fired; midpoint score {score:.1})");
    }

    let mut top: Vec<&ActivationRecord> = fired.iter().collect();
    top.sort_by(|a, b| b.degree.total_cmp(&a.degree).then(a.rule_id.cmp(&b.rule_id)));
    let rules = top
        .iter()
        .take(EXPLAINED_RULES)
        .map(|r| format!("rule {} ({:.2})", r.rule_id, r.degree))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{label} (score {score:.1}, confidence {confidence:.2}): {rules}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::ShapeKind;
    use crate::rules::{Antecedent, Consequent, Rule};

    struct Fixture {
        registry: VariableRegistry,
        rules: RuleBase,
        grid: Vec<f64>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut registry = VariableRegistry::new();
            registry.define_variable("quality", 0.0, 10.0, 0.1).unwrap();
            registry
                .add_term("quality", "low", ShapeKind::Triangular, &[0.0, 0.0, 5.0])
                .unwrap();
            registry
                .add_term("quality", "high", ShapeKind::Triangular, &[5.0, 10.0, 10.0])
                .unwrap();
            registry.define_output_variable("score", 0.0, 100.0, 1.0).unwrap();
            registry
                .add_term("score", "bad", ShapeKind::Triangular, &[0.0, 0.0, 40.0])
                .unwrap();
            registry
                .add_term("score", "good", ShapeKind::Triangular, &[60.0, 100.0, 100.0])
                .unwrap();

            let mut rules = RuleBase::new();
            rules
                .add(
                    Rule::new(
                        1,
                        vec![Antecedent::new("quality", "high")],
                        Consequent::new("score", "good"),
                    ),
                    &registry,
                )
                .unwrap();
            rules
                .add(
                    Rule::new(
                        2,
                        vec![Antecedent::new("quality", "low")],
                        Consequent::new("score", "bad"),
                    )
                    .with_confidence(0.5),
                    &registry,
                )
                .unwrap();
            let grid = registry.discretize("score").unwrap();
            Self { registry, rules, grid }
        }

        fn engine(&self) -> InferEngine<'_> {
            InferEngine::new(
                &self.registry,
                &self.rules,
                self.registry.output().unwrap(),
                &self.grid,
            )
        }
    }

    fn inputs(quality: f64) -> Inputs {
        Inputs::from([("quality".to_string(), quality)])
    }

    #[test]
    fn aggregate_clips_each_term_at_its_activation() {
        let fx = Fixture::new();
        let fired = vec![
            ActivationRecord { rule_id: 1, consequent: "good".into(), degree: 0.3 },
            ActivationRecord { rule_id: 3, consequent: "good".into(), degree: 0.6 },
        ];
        let set = fx.engine().aggregate(&fired);
        assert_eq!(set.len(), 101);
        assert_eq!(set.max_degree(), 0.6);
        assert_eq!(set.degrees()[50], 0.0);
        assert_eq!(set.degrees()[100], 0.6);
        // good(70) = 0.25, below the activation.
        assert!((set.degrees()[70] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn high_quality_scores_high() {
        let fx = Fixture::new();
        let result = fx.engine().infer(&inputs(10.0), Defuzzifier::Centroid).unwrap();
        assert!(!result.fallback);
        assert_eq!(result.fired_rules.len(), 1);
        assert_eq!(result.confidence, 1.0);
        assert!(result.score > 80.0);
        assert_eq!(result.dominant_term.as_deref(), Some("good"));
        assert!(result.explanation.starts_with("good (score"));
        assert!(result.explanation.contains("rule 1 (1.00)"));
        assert!(result.membership_degrees.contains_key("score"));
    }

    #[test]
    fn nothing_fires_in_the_gap() {
        let fx = Fixture::new();
        // quality 5 is exactly where low ends and high starts.
        let result = fx.engine().infer(&inputs(5.0), Defuzzifier::Centroid).unwrap();
        assert!(result.fallback);
        assert_eq!(result.score, 50.0);
        assert_eq!(result.confidence, 0.0);
        assert!(result.fired_rules.is_empty());
        assert_eq!(result.dominant_term, None);
        assert_eq!(result.explanation, "no dominant term (no rule fired; midpoint score 50.0)");
    }

    #[test]
    fn fallback_explanation_names_the_dominant_term() {
        let text = explain(50.0, 0.0, Some("possibly_recommended"), &[]);
        assert_eq!(text, "possibly recommended (no rule fired; midpoint score 50.0)");
    }

    #[test]
    fn input_validation() {
        let fx = Fixture::new();
        let engine = fx.engine();

        assert!(matches!(
            engine.infer(&Inputs::new(), Defuzzifier::Centroid),
            Err(ConfigError::MissingInput { .. })
        ));

        let mut extra = inputs(3.0);
        extra.insert("colour".into(), 1.0);
        assert!(matches!(
            engine.infer(&extra, Defuzzifier::Centroid),
            Err(ConfigError::UnknownInput { name }) if name == "colour"
        ));

        let mut output_as_input = inputs(3.0);
        output_as_input.insert("score".into(), 1.0);
        assert!(matches!(
            engine.infer(&output_as_input, Defuzzifier::Centroid),
            Err(ConfigError::UnknownInput { .. })
        ));

        assert!(matches!(
            engine.infer(&inputs(f64::INFINITY), Defuzzifier::Centroid),
            Err(ConfigError::NonFiniteInput { .. })
        ));
    }

    #[test]
    fn explanation_lists_strongest_rules_first() {
        let fired = vec![
            ActivationRecord { rule_id: 4, consequent: "a".into(), degree: 0.2 },
            ActivationRecord { rule_id: 2, consequent: "a".into(), degree: 0.9 },
            ActivationRecord { rule_id: 1, consequent: "b".into(), degree: 0.9 },
            ActivationRecord { rule_id: 3, consequent: "b".into(), degree: 0.5 },
        ];
        let text = explain(42.0, 0.9, Some("fairly_good"), &fired);
        assert_eq!(
            text,
            "fairly good (score 42.0, confidence 0.90): rule 1 (0.90), rule 2 (0.90), rule 3 (0.50)"
        );
    }
}
