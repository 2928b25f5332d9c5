//! Linguistic variables and the registry that owns them.
//!
//! A [`LinguisticVariable`] is a bounded universe of discourse sampled at a
//! fixed resolution and partitioned into named [`Term`]s. The
//! [`VariableRegistry`] holds every input variable plus the single output
//! variable of a fuzzy system.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::membership::{MembershipShape, ShapeKind};

/// Slack used when deciding whether the sample grid lands on `max`.
const GRID_EPSILON: f64 = 1e-9;

/// Upper bound on the number of sample points of one universe.
const MAX_SAMPLES: f64 = 1_000_000.0;

/// Degrees of membership keyed by variable name, then term name.
pub type Memberships = BTreeMap<String, BTreeMap<String, f64>>;

/// Whether a variable is read from the caller or produced by inference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableRole {
    #[default]
    Input,
    Output,
}

impl std::fmt::Display for VariableRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// A named fuzzy category within a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub name: String,
    pub shape: MembershipShape,
}

impl Term {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.shape.evaluate(x)
    }
}

/// A named axis of reasoning with a bounded numeric domain.
#[derive(Debug, Clone, PartialEq)]
pub struct LinguisticVariable {
    pub name: String,
    pub min: f64,
    pub max: f64,
    /// Step between consecutive sample points of the universe.
    pub resolution: f64,
    pub role: VariableRole,
    /// Terms in definition order.
    pub terms: Vec<Term>,
}

impl LinguisticVariable {
    fn new(
        name: &str,
        min: f64,
        max: f64,
        resolution: f64,
        role: VariableRole,
    ) -> ConfigResult<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ConfigError::InvalidDomain {
                name: name.to_string(),
                min,
                max,
            });
        }
        if !resolution.is_finite() || resolution <= 0.0 || (max - min) / resolution > MAX_SAMPLES {
            return Err(ConfigError::InvalidResolution {
                name: name.to_string(),
                resolution,
            });
        }
        Ok(Self {
            name: name.to_string(),
            min,
            max,
            resolution,
            role,
            terms: Vec::new(),
        })
    }

    /// Look up a term by name.
    pub fn term(&self, name: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.name == name)
    }

    /// Clamp a crisp value into `[min, max]`.
    pub fn clip(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Degree of every term at the clipped value.
    pub fn fuzzify(&self, x: f64) -> BTreeMap<String, f64> {
        let x = self.clip(x);
        self.terms
            .iter()
            .map(|t| (t.name.clone(), t.evaluate(x)))
            .collect()
    }

    /// Sample points `min, min + step, ...` ending exactly on `max`.
    pub fn discretize(&self) -> Vec<f64> {
        let steps = ((self.max - self.min) / self.resolution + GRID_EPSILON).floor() as usize;
        let mut grid: Vec<f64> = (0..=steps)
            .map(|i| self.min + i as f64 * self.resolution)
            .collect();
        let last = grid.last().copied().unwrap_or(self.min);
        if self.max - last <= GRID_EPSILON * self.resolution {
            if let Some(last) = grid.last_mut() {
                *last = self.max;
            }
        } else {
            grid.push(self.max);
        }
        grid
    }
}

/// Owns every linguistic variable of a fuzzy system.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    variables: Vec<LinguisticVariable>,
    output: Option<usize>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define an input variable.
    pub fn define_variable(
        &mut self,
        name: &str,
        min: f64,
        max: f64,
        resolution: f64,
    ) -> ConfigResult<()> {
        self.insert(name, min, max, resolution, VariableRole::Input)
    }

    /// Define the single output variable.
    pub fn define_output_variable(
        &mut self,
        name: &str,
        min: f64,
        max: f64,
        resolution: f64,
    ) -> ConfigResult<()> {
        if let Some(existing) = self.output() {
            return Err(ConfigError::OutputAlreadyDefined {
                existing: existing.name.clone(),
                name: name.to_string(),
            });
        }
        self.insert(name, min, max, resolution, VariableRole::Output)?;
        self.output = Some(self.variables.len() - 1);
        Ok(())
    }

    fn insert(
        &mut self,
        name: &str,
        min: f64,
        max: f64,
        resolution: f64,
        role: VariableRole,
    ) -> ConfigResult<()> {
        if self.get(name).is_some() {
            return Err(ConfigError::DuplicateVariable {
                name: name.to_string(),
            });
        }
        let variable = LinguisticVariable::new(name, min, max, resolution, role)?;
        self.variables.push(variable);
        Ok(())
    }

    /// Attach a term to a variable.
    ///
    /// Fails if the variable is unknown, the term already exists, or the
    /// parameters are malformed or leave the variable's universe.
    pub fn add_term(
        &mut self,
        variable: &str,
        term: &str,
        kind: ShapeKind,
        params: &[f64],
    ) -> ConfigResult<()> {
        let var = self
            .variables
            .iter_mut()
            .find(|v| v.name == variable)
            .ok_or_else(|| ConfigError::UnknownVariable {
                name: variable.to_string(),
            })?;

        if var.term(term).is_some() {
            return Err(ConfigError::DuplicateTerm {
                variable: variable.to_string(),
                term: term.to_string(),
            });
        }

        let shape = MembershipShape::from_params(term, kind, params)?;
        if let Some(&value) = shape
            .anchors()
            .iter()
            .find(|&&p| p < var.min || p > var.max)
        {
            return Err(ConfigError::ParameterOutOfDomain {
                variable: variable.to_string(),
                term: term.to_string(),
                value,
                min: var.min,
                max: var.max,
            });
        }

        var.terms.push(Term {
            name: term.to_string(),
            shape,
        });
        Ok(())
    }

    /// Degree of every term of `variable` at the clipped crisp value.
    pub fn fuzzify(&self, variable: &str, crisp: f64) -> ConfigResult<BTreeMap<String, f64>> {
        let var = self.require(variable)?;
        if !crisp.is_finite() {
            return Err(ConfigError::NonFiniteInput {
                name: variable.to_string(),
                value: crisp,
            });
        }
        Ok(var.fuzzify(crisp))
    }

    /// Sample points spanning the universe of `variable`.
    pub fn discretize(&self, variable: &str) -> ConfigResult<Vec<f64>> {
        Ok(self.require(variable)?.discretize())
    }

    pub fn get(&self, name: &str) -> Option<&LinguisticVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    fn require(&self, name: &str) -> ConfigResult<&LinguisticVariable> {
        self.get(name).ok_or_else(|| ConfigError::UnknownVariable {
            name: name.to_string(),
        })
    }

    /// All variables in definition order.
    pub fn variables(&self) -> &[LinguisticVariable] {
        &self.variables
    }

    /// Input variables in definition order.
    pub fn inputs(&self) -> impl Iterator<Item = &LinguisticVariable> {
        self.variables
            .iter()
            .filter(|v| v.role == VariableRole::Input)
    }

    pub fn output(&self) -> Option<&LinguisticVariable> {
        self.output.and_then(|i| self.variables.get(i))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating_registry() -> VariableRegistry {
        let mut reg = VariableRegistry::new();
        reg.define_variable("user_rating", 1.0, 10.0, 0.1).unwrap();
        reg.add_term("user_rating", "low", ShapeKind::Triangular, &[1.0, 1.0, 4.0])
            .unwrap();
        reg.add_term("user_rating", "medium", ShapeKind::Triangular, &[2.0, 5.5, 8.0])
            .unwrap();
        reg.add_term("user_rating", "high", ShapeKind::Triangular, &[6.0, 10.0, 10.0])
            .unwrap();
        reg
    }

    #[test]
    fn duplicate_variable_rejected() {
        let mut reg = rating_registry();
        let err = reg.define_variable("user_rating", 0.0, 1.0, 0.1).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateVariable { .. }));
    }

    #[test]
    fn empty_domain_rejected() {
        let mut reg = VariableRegistry::new();
        assert!(matches!(
            reg.define_variable("x", 5.0, 5.0, 1.0),
            Err(ConfigError::InvalidDomain { .. })
        ));
        assert!(matches!(
            reg.define_variable("x", 10.0, 0.0, 1.0),
            Err(ConfigError::InvalidDomain { .. })
        ));
        assert!(matches!(
            reg.define_variable("x", 0.0, 10.0, 0.0),
            Err(ConfigError::InvalidResolution { .. })
        ));
    }

    #[test]
    fn only_one_output_variable() {
        let mut reg = VariableRegistry::new();
        reg.define_output_variable("score", 0.0, 100.0, 1.0).unwrap();
        assert!(matches!(
            reg.define_output_variable("other", 0.0, 100.0, 1.0),
            Err(ConfigError::OutputAlreadyDefined { .. })
        ));
        assert_eq!(reg.output().unwrap().name, "score");
        assert_eq!(reg.inputs().count(), 0);
    }

    #[test]
    fn add_term_validation() {
        let mut reg = rating_registry();
        assert!(matches!(
            reg.add_term("nope", "low", ShapeKind::Triangular, &[1.0, 2.0, 3.0]),
            Err(ConfigError::UnknownVariable { .. })
        ));
        assert!(matches!(
            reg.add_term("user_rating", "low", ShapeKind::Triangular, &[1.0, 2.0, 3.0]),
            Err(ConfigError::DuplicateTerm { .. })
        ));
        assert!(matches!(
            reg.add_term("user_rating", "odd", ShapeKind::Triangular, &[5.0, 3.0, 8.0]),
            Err(ConfigError::NonMonotonic { .. })
        ));
        assert!(matches!(
            reg.add_term("user_rating", "wide", ShapeKind::Triangular, &[0.0, 5.0, 8.0]),
            Err(ConfigError::ParameterOutOfDomain { .. })
        ));
    }

    #[test]
    fn fuzzify_clips_out_of_domain_values() {
        let reg = rating_registry();
        let above = reg.fuzzify("user_rating", 42.0).unwrap();
        assert_eq!(above["high"], 1.0);
        assert_eq!(above["low"], 0.0);

        let below = reg.fuzzify("user_rating", -3.0).unwrap();
        assert_eq!(below["low"], 1.0);
        assert_eq!(below["medium"], 0.0);
    }

    #[test]
    fn fuzzify_overlapping_terms() {
        let reg = rating_registry();
        let m = reg.fuzzify("user_rating", 7.0).unwrap();
        assert_eq!(m.len(), 3);
        assert!((m["medium"] - 0.4).abs() < 1e-12);
        assert!((m["high"] - 0.25).abs() < 1e-12);
        assert_eq!(m["low"], 0.0);
    }

    #[test]
    fn fuzzify_rejects_nan() {
        let reg = rating_registry();
        assert!(matches!(
            reg.fuzzify("user_rating", f64::NAN),
            Err(ConfigError::NonFiniteInput { .. })
        ));
    }

    #[test]
    fn discretize_spans_the_domain() {
        let reg = rating_registry();
        let grid = reg.discretize("user_rating").unwrap();
        assert_eq!(grid.len(), 91);
        assert_eq!(grid[0], 1.0);
        assert_eq!(*grid.last().unwrap(), 10.0);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));

        let mut reg = VariableRegistry::new();
        reg.define_output_variable("score", 0.0, 100.0, 1.0).unwrap();
        let grid = reg.discretize("score").unwrap();
        assert_eq!(grid.len(), 101);
        assert_eq!(grid[50], 50.0);
    }

    #[test]
    fn discretize_appends_max_when_step_overshoots() {
        let mut reg = VariableRegistry::new();
        reg.define_variable("x", 0.0, 10.0, 3.0).unwrap();
        assert_eq!(reg.discretize("x").unwrap(), vec![0.0, 3.0, 6.0, 9.0, 10.0]);
    }
}
