//! Configured fuzzy systems.
//!
//! A [`FuzzySystemBuilder`] collects variables, terms and rules, validating
//! each as it arrives. [`FuzzySystemBuilder::build`] freezes the result into
//! an immutable [`FuzzySystem`] that can be shared across threads and
//! queried concurrently without locking.

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult, FuzzyResult};
use crate::infer::engine::InferEngine;
use crate::infer::{Defuzzifier, InferenceResult, Inputs};
use crate::membership::ShapeKind;
use crate::rules::{Rule, RuleAudit, RuleBase, RuleExplanation};
use crate::variable::{LinguisticVariable, VariableRegistry};

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Incrementally assembles a [`FuzzySystem`].
#[derive(Debug, Clone, Default)]
pub struct FuzzySystemBuilder {
    name: String,
    description: String,
    registry: VariableRegistry,
    rules: RuleBase,
    defuzzifier: Defuzzifier,
}

impl FuzzySystemBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_defuzzifier(mut self, defuzzifier: Defuzzifier) -> Self {
        self.defuzzifier = defuzzifier;
        self
    }

    /// Define an input variable over `[min, max]` sampled every `resolution`.
    pub fn define_variable(
        &mut self,
        name: &str,
        min: f64,
        max: f64,
        resolution: f64,
    ) -> ConfigResult<&mut Self> {
        self.registry.define_variable(name, min, max, resolution)?;
        Ok(self)
    }

    /// Define the single output variable.
    pub fn define_output_variable(
        &mut self,
        name: &str,
        min: f64,
        max: f64,
        resolution: f64,
    ) -> ConfigResult<&mut Self> {
        self.registry
            .define_output_variable(name, min, max, resolution)?;
        Ok(self)
    }

    pub fn add_term(
        &mut self,
        variable: &str,
        term: &str,
        kind: ShapeKind,
        params: &[f64],
    ) -> ConfigResult<&mut Self> {
        self.registry.add_term(variable, term, kind, params)?;
        Ok(self)
    }

    /// Validate `rule` against the variables defined so far and append it.
    pub fn add_rule(&mut self, rule: Rule) -> ConfigResult<&mut Self> {
        self.rules.add(rule, &self.registry)?;
        Ok(self)
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Check completeness and freeze the configuration.
    ///
    /// Coverage gaps found by [`RuleBase::audit`] are logged, not rejected.
    pub fn build(self) -> ConfigResult<FuzzySystem> {
        if self.registry.inputs().next().is_none() {
            return Err(ConfigError::NoInputVariables);
        }
        let output = self.registry.output().ok_or(ConfigError::NoOutputVariable)?;
        if output.terms.is_empty() {
            return Err(ConfigError::OutputWithoutTerms {
                name: output.name.clone(),
            });
        }

        for input in self.registry.inputs().filter(|v| v.terms.is_empty()) {
            tracing::warn!(variable = %input.name, "input variable has no terms");
        }
        let audit = self.rules.audit(&self.registry);
        for term in &audit.uncovered_terms {
            tracing::warn!(%term, "no rule concludes output term");
        }
        for (first, second) in &audit.conflicts {
            tracing::warn!(first, second, "rules share antecedents but conclude different terms");
        }

        let output_grid = output.discretize();

        tracing::info!(
            system = %self.name,
            variables = self.registry.len(),
            rules = self.rules.len(),
            samples = output_grid.len(),
            defuzzifier = %self.defuzzifier,
            "fuzzy system built"
        );

        Ok(FuzzySystem {
            name: self.name,
            description: self.description,
            registry: self.registry,
            rules: self.rules,
            output_grid,
            defuzzifier: self.defuzzifier,
        })
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// An immutable, validated fuzzy inference system.
#[derive(Debug, Clone)]
pub struct FuzzySystem {
    name: String,
    description: String,
    registry: VariableRegistry,
    rules: RuleBase,
    output_grid: Vec<f64>,
    defuzzifier: Defuzzifier,
}

impl FuzzySystem {
    /// Score one set of crisp inputs with the configured defuzzifier.
    pub fn infer(&self, inputs: &Inputs) -> FuzzyResult<InferenceResult> {
        self.infer_with(inputs, self.defuzzifier)
    }

    /// Score one set of crisp inputs with an explicit defuzzifier.
    pub fn infer_with(&self, inputs: &Inputs, method: Defuzzifier) -> FuzzyResult<InferenceResult> {
        let output = self.output()?;
        let engine = InferEngine::new(&self.registry, &self.rules, output, &self.output_grid);
        Ok(engine.infer(inputs, method)?)
    }

    /// Score many input sets in parallel. Results keep the input order.
    pub fn infer_batch(&self, batch: &[Inputs]) -> Vec<FuzzyResult<InferenceResult>> {
        use rayon::prelude::*;

        batch.par_iter().map(|inputs| self.infer(inputs)).collect()
    }

    /// Fired rules of `result` grouped by consequent, `top_n` per term.
    pub fn explain(
        &self,
        result: &InferenceResult,
        top_n: usize,
    ) -> BTreeMap<String, Vec<RuleExplanation>> {
        self.rules.explain(&result.fired_rules, top_n)
    }

    pub fn audit(&self) -> RuleAudit {
        self.rules.audit(&self.registry)
    }

    /// Copy of this system using a different default defuzzifier.
    pub fn with_defuzzifier(mut self, defuzzifier: Defuzzifier) -> Self {
        self.defuzzifier = defuzzifier;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn defuzzifier(&self) -> Defuzzifier {
        self.defuzzifier
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleBase {
        &self.rules
    }

    /// Sample points of the output universe.
    pub fn output_grid(&self) -> &[f64] {
        &self.output_grid
    }

    fn output(&self) -> ConfigResult<&LinguisticVariable> {
        self.registry.output().ok_or(ConfigError::NoOutputVariable)
    }

    /// Overview of the configuration.
    pub fn summary(&self) -> SystemSummary {
        SystemSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            defuzzifier: self.defuzzifier,
            variables: self
                .registry
                .variables()
                .iter()
                .map(|v| VariableSummary {
                    name: v.name.clone(),
                    role: v.role.to_string(),
                    min: v.min,
                    max: v.max,
                    resolution: v.resolution,
                    terms: v.terms.iter().map(|t| t.name.clone()).collect(),
                })
                .collect(),
            rule_count: self.rules.len(),
            output_samples: self.output_grid.len(),
        }
    }
}

/// Serializable overview of a [`FuzzySystem`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct SystemSummary {
    pub name: String,
    pub description: String,
    pub defuzzifier: Defuzzifier,
    pub variables: Vec<VariableSummary>,
    pub rule_count: usize,
    pub output_samples: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub role: String,
    pub min: f64,
    pub max: f64,
    pub resolution: f64,
    pub terms: Vec<String>,
}

impl std::fmt::Display for SystemSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "System: {}", self.name)?;
        if !self.description.is_empty() {
            writeln!(f, "  {}", self.description)?;
        }
        writeln!(f, "Defuzzifier: {}", self.defuzzifier)?;
        writeln!(f, "Variables: {}", self.variables.len())?;
        for v in &self.variables {
            writeln!(
                f,
                "  {:<20} {:<6} [{}, {}] step {}  terms: {}",
                v.name,
                v.role,
                v.min,
                v.max,
                v.resolution,
                v.terms.join(", ")
            )?;
        }
        writeln!(f, "Rules: {}", self.rule_count)?;
        write!(f, "Output samples: {}", self.output_samples)
    }
}
