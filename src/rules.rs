//! Weighted fuzzy rules and the rule base that evaluates them.
//!
//! A rule reads `IF a is x AND b is y THEN output is z` with a confidence
//! weight. Evaluation uses the Zadeh operators (AND = min, OR = max) and
//! scales the result by the rule's confidence.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::variable::{Memberships, VariableRegistry, VariableRole};

/// Confidence given to rules that do not specify one.
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Rule types
// ---------------------------------------------------------------------------

/// How the antecedent degrees of a rule are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Minimum of the antecedent degrees.
    #[default]
    And,
    /// Maximum of the antecedent degrees.
    Or,
}

impl Combinator {
    /// Combine antecedent degrees. A single degree passes through unchanged.
    pub fn combine(self, degrees: impl IntoIterator<Item = f64>) -> f64 {
        let mut iter = degrees.into_iter();
        let Some(first) = iter.next() else {
            return 0.0;
        };
        match self {
            Self::And => iter.fold(first, f64::min),
            Self::Or => iter.fold(first, f64::max),
        }
    }
}

impl std::fmt::Display for Combinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// One `variable is term` condition, optionally negated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Antecedent {
    pub variable: String,
    pub term: String,
    pub negated: bool,
}

impl Antecedent {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
            negated: false,
        }
    }

    /// `NOT variable is term`: degree becomes `1 - degree`.
    pub fn not(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            negated: true,
            ..Self::new(variable, term)
        }
    }

    /// Degree of this condition, or `None` if the membership is absent.
    fn degree(&self, memberships: &Memberships) -> Option<f64> {
        let degree = *memberships.get(&self.variable)?.get(&self.term)?;
        Some(if self.negated { 1.0 - degree } else { degree })
    }
}

impl std::fmt::Display for Antecedent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "NOT ")?;
        }
        write!(f, "{} is {}", self.variable, self.term)
    }
}

/// The conclusion of a rule: a term of the output variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consequent {
    pub variable: String,
    pub term: String,
}

impl Consequent {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
        }
    }
}

/// A single weighted reasoning step.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: u32,
    pub antecedents: Vec<Antecedent>,
    pub combinator: Combinator,
    pub consequent: Consequent,
    /// Weight in `[0, 1]` applied to the combined antecedent degree.
    pub confidence: f64,
    pub description: String,
}

impl Rule {
    /// An AND rule with full confidence and no description.
    pub fn new(id: u32, antecedents: Vec<Antecedent>, consequent: Consequent) -> Self {
        Self {
            id,
            antecedents,
            combinator: Combinator::And,
            consequent,
            confidence: DEFAULT_CONFIDENCE,
            description: String::new(),
        }
    }

    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Activation degree of this rule: combined antecedents times confidence.
    ///
    /// A missing membership means the rule cannot fire.
    pub fn activation(&self, memberships: &Memberships) -> f64 {
        let degrees: Option<Vec<f64>> = self
            .antecedents
            .iter()
            .map(|a| a.degree(memberships))
            .collect();
        match degrees {
            Some(degrees) => self.combinator.combine(degrees) * self.confidence,
            None => 0.0,
        }
    }

    /// Sorted antecedent conditions, used to detect conflicting rules.
    fn signature(&self) -> (Combinator, Vec<String>) {
        let mut parts: Vec<String> = self.antecedents.iter().map(|a| a.to_string()).collect();
        parts.sort();
        (self.combinator, parts)
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rule {}: IF ", self.id)?;
        for (i, antecedent) in self.antecedents.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.combinator)?;
            }
            write!(f, "{antecedent}")?;
        }
        write!(
            f,
            " THEN {} is {}",
            self.consequent.variable, self.consequent.term
        )
    }
}

// ---------------------------------------------------------------------------
// Evaluation results
// ---------------------------------------------------------------------------

/// A rule that fired during one inference call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivationRecord {
    pub rule_id: u32,
    /// Output term the rule concludes.
    pub consequent: String,
    /// Activation degree in `(0, 1]`.
    pub degree: f64,
}

/// Human-readable account of one fired rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleExplanation {
    pub rule_id: u32,
    pub strength: f64,
    pub confidence: f64,
    pub description: String,
    pub rule_text: String,
}

/// Coverage findings for a rule base. None of these are errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleAudit {
    /// Output terms that no rule concludes.
    pub uncovered_terms: Vec<String>,
    /// Rule pairs with identical antecedents but different conclusions.
    pub conflicts: Vec<(u32, u32)>,
}

impl RuleAudit {
    pub fn is_clean(&self) -> bool {
        self.uncovered_terms.is_empty() && self.conflicts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Rule base
// ---------------------------------------------------------------------------

/// Ordered collection of validated rules.
#[derive(Debug, Clone, Default)]
pub struct RuleBase {
    rules: Vec<Rule>,
}

impl RuleBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `rule` against the registry and append it.
    pub fn add(&mut self, rule: Rule, registry: &VariableRegistry) -> ConfigResult<()> {
        if rule.antecedents.is_empty() {
            return Err(ConfigError::EmptyAntecedents { rule_id: rule.id });
        }
        if !(0.0..=1.0).contains(&rule.confidence) {
            return Err(ConfigError::InvalidConfidence {
                rule_id: rule.id,
                confidence: rule.confidence,
            });
        }
        if self.get(rule.id).is_some() {
            return Err(ConfigError::DuplicateRule { rule_id: rule.id });
        }

        for antecedent in &rule.antecedents {
            let variable = registry.get(&antecedent.variable).ok_or_else(|| {
                ConfigError::UnknownVariable {
                    name: antecedent.variable.clone(),
                }
            })?;
            if variable.role != VariableRole::Input {
                return Err(ConfigError::AntecedentNotInput {
                    rule_id: rule.id,
                    variable: antecedent.variable.clone(),
                });
            }
            if variable.term(&antecedent.term).is_none() {
                return Err(ConfigError::UnknownTerm {
                    variable: antecedent.variable.clone(),
                    term: antecedent.term.clone(),
                });
            }
        }

        let output = registry.output().ok_or(ConfigError::NoOutputVariable)?;
        if rule.consequent.variable != output.name {
            return Err(ConfigError::ConsequentNotOutput {
                rule_id: rule.id,
                variable: rule.consequent.variable.clone(),
                output: output.name.clone(),
            });
        }
        if output.term(&rule.consequent.term).is_none() {
            return Err(ConfigError::UnknownTerm {
                variable: output.name.clone(),
                term: rule.consequent.term.clone(),
            });
        }

        self.rules.push(rule);
        Ok(())
    }

    /// Evaluate every rule against fuzzified inputs.
    ///
    /// Only rules with a positive activation are returned, in rule order.
    pub fn evaluate(&self, memberships: &Memberships) -> Vec<ActivationRecord> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let degree = rule.activation(memberships);
                (degree > 0.0).then(|| ActivationRecord {
                    rule_id: rule.id,
                    consequent: rule.consequent.term.clone(),
                    degree,
                })
            })
            .collect()
    }

    /// Group fired rules by consequent, strongest first, keeping `top_n` each.
    pub fn explain(
        &self,
        records: &[ActivationRecord],
        top_n: usize,
    ) -> BTreeMap<String, Vec<RuleExplanation>> {
        let mut grouped: BTreeMap<String, Vec<&ActivationRecord>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(record.consequent.clone())
                .or_default()
                .push(record);
        }

        grouped
            .into_iter()
            .map(|(term, mut fired)| {
                fired.sort_by(|a, b| b.degree.total_cmp(&a.degree).then(a.rule_id.cmp(&b.rule_id)));
                let explanations = fired
                    .into_iter()
                    .take(top_n)
                    .filter_map(|record| {
                        self.get(record.rule_id).map(|rule| RuleExplanation {
                            rule_id: rule.id,
                            strength: record.degree,
                            confidence: rule.confidence,
                            description: rule.description.clone(),
                            rule_text: rule.to_string(),
                        })
                    })
                    .collect();
                (term, explanations)
            })
            .collect()
    }

    /// Report output terms no rule concludes and conflicting rule pairs.
    pub fn audit(&self, registry: &VariableRegistry) -> RuleAudit {
        let uncovered_terms = registry
            .output()
            .map(|output| {
                output
                    .terms
                    .iter()
                    .filter(|t| !self.rules.iter().any(|r| r.consequent.term == t.name))
                    .map(|t| t.name.clone())
                    .collect()
            })
            .unwrap_or_default();

        let mut conflicts = Vec::new();
        let mut seen: HashMap<(Combinator, Vec<String>), &Rule> = HashMap::new();
        for rule in &self.rules {
            match seen.get(&rule.signature()) {
                Some(first) if first.consequent.term != rule.consequent.term => {
                    conflicts.push((first.id, rule.id));
                }
                Some(_) => {}
                None => {
                    seen.insert(rule.signature(), rule);
                }
            }
        }

        RuleAudit {
            uncovered_terms,
            conflicts,
        }
    }

    pub fn get(&self, id: u32) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
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
}
