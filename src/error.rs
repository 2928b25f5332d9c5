//! Rich diagnostic error types for the fuzzy-advisor engine.
//!
//! Configuration mistakes are reported through [`ConfigError`], manifest
//! loading problems through [`ManifestError`]. Both carry miette error codes
//! and help text so the CLI can tell the user exactly what to fix.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the fuzzy-advisor engine.
#[derive(Debug, Error, Diagnostic)]
pub enum FuzzyError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Manifest(#[from] ManifestError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors raised while building a fuzzy system or calling it with bad inputs.
///
/// These are programmer or configuration errors: they are never recovered
/// silently and always propagate to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("variable \"{name}\" is already defined")]
    #[diagnostic(
        code(fuzzy::config::duplicate_variable),
        help("Variable names must be unique across inputs and the output. Rename one of them.")
    )]
    DuplicateVariable { name: String },

    #[error("variable \"{name}\" has an empty domain: min {min} must be below max {max}")]
    #[diagnostic(
        code(fuzzy::config::invalid_domain),
        help("Give the variable a finite universe of discourse with min < max.")
    )]
    InvalidDomain { name: String, min: f64, max: f64 },

    #[error("variable \"{name}\" has an invalid sample resolution {resolution}")]
    #[diagnostic(
        code(fuzzy::config::invalid_resolution),
        help(
            "The resolution is the step between sample points of the universe. \
             It must be positive, finite, and coarse enough to keep the grid \
             below one million samples."
        )
    )]
    InvalidResolution { name: String, resolution: f64 },

    #[error("cannot define output variable \"{name}\": \"{existing}\" is already the output")]
    #[diagnostic(
        code(fuzzy::config::output_defined),
        help("A fuzzy system has exactly one output variable.")
    )]
    OutputAlreadyDefined { existing: String, name: String },

    #[error("no output variable has been defined")]
    #[diagnostic(
        code(fuzzy::config::no_output),
        help("Call `define_output_variable`, or set `role = \"output\"` in the manifest.")
    )]
    NoOutputVariable,

    #[error("output variable \"{name}\" has no terms")]
    #[diagnostic(
        code(fuzzy::config::output_without_terms),
        help("Rules conclude output terms; add at least one term to the output variable.")
    )]
    OutputWithoutTerms { name: String },

    #[error("no input variables have been defined")]
    #[diagnostic(
        code(fuzzy::config::no_inputs),
        help("Define at least one input variable with `define_variable`.")
    )]
    NoInputVariables,

    #[error("unknown variable \"{name}\"")]
    #[diagnostic(
        code(fuzzy::config::unknown_variable),
        help("Define the variable before adding terms or rules that reference it.")
    )]
    UnknownVariable { name: String },

    #[error("term \"{term}\" is already defined on variable \"{variable}\"")]
    #[diagnostic(
        code(fuzzy::config::duplicate_term),
        help("Term names must be unique within a variable.")
    )]
    DuplicateTerm { variable: String, term: String },

    #[error("unknown term \"{term}\" on variable \"{variable}\"")]
    #[diagnostic(
        code(fuzzy::config::unknown_term),
        help("Add the term to the variable before referencing it from a rule.")
    )]
    UnknownTerm { variable: String, term: String },

    #[error("{kind} term \"{term}\" expects {expected} parameters, got {actual}")]
    #[diagnostic(
        code(fuzzy::config::parameter_count),
        help(
            "triangular takes [a, b, c], trapezoidal takes [a, b, c, d], \
             gaussian takes [mean, sigma], sigmoid takes [slope, crossover]."
        )
    )]
    ParameterCount {
        term: String,
        kind: String,
        expected: usize,
        actual: usize,
    },

    #[error("breakpoints of term \"{term}\" are not non-decreasing: {params:?}")]
    #[diagnostic(
        code(fuzzy::config::non_monotonic),
        help("Order the breakpoints so that a <= b <= c (<= d). Equal neighbours are allowed.")
    )]
    NonMonotonic { term: String, params: Vec<f64> },

    #[error("invalid parameter for term \"{term}\": {message}")]
    #[diagnostic(
        code(fuzzy::config::invalid_parameter),
        help("Parameters must be finite, gaussian sigma positive and sigmoid slopes non-zero.")
    )]
    InvalidParameter { term: String, message: String },

    #[error("parameter {value} of term \"{term}\" lies outside [{min}, {max}] of \"{variable}\"")]
    #[diagnostic(
        code(fuzzy::config::parameter_out_of_domain),
        help("Every breakpoint must lie within the universe of its variable.")
    )]
    ParameterOutOfDomain {
        variable: String,
        term: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("rule {rule_id} has no antecedents")]
    #[diagnostic(
        code(fuzzy::config::empty_antecedents),
        help("Every rule needs at least one `variable is term` condition.")
    )]
    EmptyAntecedents { rule_id: u32 },

    #[error("rule {rule_id} has confidence {confidence}, expected a value in [0, 1]")]
    #[diagnostic(
        code(fuzzy::config::invalid_confidence),
        help("Use 1.0 for fully trusted rules and lower weights for tentative ones.")
    )]
    InvalidConfidence { rule_id: u32, confidence: f64 },

    #[error("rule id {rule_id} is already used")]
    #[diagnostic(
        code(fuzzy::config::duplicate_rule),
        help("Rule ids identify fired rules in explanations; give each rule its own id.")
    )]
    DuplicateRule { rule_id: u32 },

    #[error("rule {rule_id} uses \"{variable}\" as an antecedent, but it is not an input variable")]
    #[diagnostic(
        code(fuzzy::config::antecedent_not_input),
        help("Antecedents may only test input variables.")
    )]
    AntecedentNotInput { rule_id: u32, variable: String },

    #[error("rule {rule_id} concludes \"{variable}\", but the output variable is \"{output}\"")]
    #[diagnostic(
        code(fuzzy::config::consequent_not_output),
        help("Every rule concludes a term of the single output variable.")
    )]
    ConsequentNotOutput {
        rule_id: u32,
        variable: String,
        output: String,
    },

    #[error("input variable \"{name}\" is missing")]
    #[diagnostic(
        code(fuzzy::config::missing_input),
        help("Supply a crisp value for every declared input variable.")
    )]
    MissingInput { name: String },

    #[error("\"{name}\" is not a declared input variable")]
    #[diagnostic(
        code(fuzzy::config::unknown_input),
        help("Check the spelling of the input name against the configured variables.")
    )]
    UnknownInput { name: String },

    #[error("input \"{name}\" is not a finite number: {value}")]
    #[diagnostic(
        code(fuzzy::config::non_finite_input),
        help("Out-of-range values are clipped to the domain, but NaN and infinity cannot be.")
    )]
    NonFiniteInput { name: String, value: f64 },

    #[error("unknown defuzzification method \"{name}\"")]
    #[diagnostic(
        code(fuzzy::config::unknown_defuzzifier),
        help("Choose one of: centroid, bisector, mom, som, lom.")
    )]
    UnknownDefuzzifier { name: String },
}

// ---------------------------------------------------------------------------
// Manifest errors
// ---------------------------------------------------------------------------

/// Errors raised while reading a declarative system manifest.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("failed to read manifest {path}")]
    #[diagnostic(
        code(fuzzy::manifest::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {message}")]
    #[diagnostic(
        code(fuzzy::manifest::parse),
        help(
            "A manifest has a [system] table, [[variables]] entries with inline \
             `terms`, and [[rules]] entries with `when` conditions and a `then` term."
        )
    )]
    Parse { message: String },
}

/// Result type for the fuzzy-advisor engine.
pub type FuzzyResult<T> = std::result::Result<T, FuzzyError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type for manifest loading.
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;
