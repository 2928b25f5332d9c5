//! Declarative system manifests.
//!
//! A manifest describes a complete fuzzy system in TOML: a `[system]` table,
//! one `[[variables]]` entry per variable with its terms inline, and one
//! `[[rules]]` entry per rule. Parsing only checks the TOML structure; all
//! semantic validation happens when the manifest is turned into a
//! [`FuzzySystemBuilder`].
//!
//! ```toml
//! [system]
//! name = "example"
//! defuzzifier = "centroid"
//!
//! [[variables]]
//! name = "quality"
//! min = 0.0
//! max = 10.0
//! resolution = 0.1
//! terms = [
//!     { name = "low", shape = "triangular", params = [0.0, 0.0, 5.0] },
//!     { name = "high", shape = "triangular", params = [5.0, 10.0, 10.0] },
//! ]
//!
//! [[variables]]
//! name = "score"
//! role = "output"
//! min = 0.0
//! max = 100.0
//! resolution = 1.0
//! terms = [{ name = "good", shape = "triangular", params = [50.0, 100.0, 100.0] }]
//!
//! [[rules]]
//! id = 1
//! when = [{ variable = "quality", term = "high" }]
//! then = "good"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, FuzzyResult, ManifestError, ManifestResult};
use crate::infer::Defuzzifier;
use crate::membership::ShapeKind;
use crate::rules::{Antecedent, Combinator, Consequent, Rule, DEFAULT_CONFIDENCE};
use crate::system::{FuzzySystem, FuzzySystemBuilder};
use crate::variable::VariableRole;

/// A complete fuzzy system, as written in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemManifest {
    pub system: SystemMeta,
    #[serde(default)]
    pub variables: Vec<VariableSpec>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub defuzzifier: Defuzzifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(default)]
    pub role: VariableRole,
    pub min: f64,
    pub max: f64,
    pub resolution: f64,
    #[serde(default)]
    pub terms: Vec<TermSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermSpec {
    pub name: String,
    pub shape: ShapeKind,
    pub params: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: u32,
    pub when: Vec<ConditionSpec>,
    #[serde(default)]
    pub combinator: Combinator,
    /// Term of the output variable this rule concludes.
    pub then: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionSpec {
    pub variable: String,
    pub term: String,
    #[serde(default)]
    pub negated: bool,
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

impl SystemManifest {
    /// Parse a manifest from TOML text.
    pub fn from_toml(text: &str) -> ManifestResult<Self> {
        toml::from_str(text).map_err(|e| ManifestError::Parse {
            message: e.to_string(),
        })
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> ManifestResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Feed every variable, term and rule into a builder.
    ///
    /// Variables are defined first so rules may reference any of them
    /// regardless of their position in the file.
    pub fn into_builder(self) -> ConfigResult<FuzzySystemBuilder> {
        let mut builder = FuzzySystemBuilder::new(self.system.name)
            .with_description(self.system.description)
            .with_defuzzifier(self.system.defuzzifier);

        for var in &self.variables {
            match var.role {
                VariableRole::Input => {
                    builder.define_variable(&var.name, var.min, var.max, var.resolution)?
                }
                VariableRole::Output => {
                    builder.define_output_variable(&var.name, var.min, var.max, var.resolution)?
                }
            };
            for term in &var.terms {
                builder.add_term(&var.name, &term.name, term.shape, &term.params)?;
            }
        }

        let output = builder
            .registry()
            .output()
            .map(|v| v.name.clone())
            .ok_or(ConfigError::NoOutputVariable)?;

        for spec in self.rules {
            let antecedents = spec
                .when
                .into_iter()
                .map(|c| Antecedent {
                    variable: c.variable,
                    term: c.term,
                    negated: c.negated,
                })
                .collect();
            let rule = Rule::new(spec.id, antecedents, Consequent::new(&output, spec.then))
                .with_combinator(spec.combinator)
                .with_confidence(spec.confidence)
                .with_description(spec.description);
            builder.add_rule(rule)?;
        }

        Ok(builder)
    }

    /// Validate and build the system.
    pub fn build(self) -> FuzzyResult<FuzzySystem> {
        Ok(self.into_builder()?.build()?)
    }
}
