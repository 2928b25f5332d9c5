//! Mamdani inference: implication, aggregation, defuzzification.
//!
//! The pipeline itself lives in [`engine`]; this module holds the per-call
//! value types it produces.

pub mod defuzz;
pub mod engine;

use std::collections::HashMap;

use serde::Serialize;

use crate::rules::ActivationRecord;
use crate::variable::Memberships;

pub use defuzz::Defuzzifier;

/// Crisp inputs keyed by input variable name.
pub type Inputs = HashMap<String, f64>;

/// Aggregated output membership sampled over the output universe.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyOutputSet {
    points: Vec<f64>,
    degrees: Vec<f64>,
}

impl FuzzyOutputSet {
    /// Pair sample points with their degrees. Degrees are clamped to `[0, 1]`.
    ///
    /// Both lists must have the same length. A mismatch is a caller bug: it
    /// panics in debug builds and is truncated to the shorter list otherwise.
    pub fn new(mut points: Vec<f64>, degrees: Vec<f64>) -> Self {
        debug_assert_eq!(
            points.len(),
            degrees.len(),
            "every sample point needs exactly one degree"
        );
        let mut degrees: Vec<f64> = degrees.into_iter().map(|d| d.clamp(0.0, 1.0)).collect();
        let len = points.len().min(degrees.len());
        points.truncate(len);
        degrees.truncate(len);
        Self { points, degrees }
    }

    /// A single sample at `point` with full membership.
    pub fn spike(point: f64) -> Self {
        Self {
            points: vec![point],
            degrees: vec![1.0],
        }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// `(sample point, degree)` pairs in ascending point order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied().zip(self.degrees.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Midpoint of the sampled universe, or 0 for an empty set.
    pub fn midpoint(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first + last) / 2.0,
            _ => 0.0,
        }
    }

    pub fn max_degree(&self) -> f64 {
        self.degrees.iter().copied().fold(0.0, f64::max)
    }
}

/// Everything one inference call produces.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceResult {
    /// Crisp recommendation strength within the output domain.
    pub score: f64,
    /// Strongest rule activation, 0 when nothing fired.
    pub confidence: f64,
    pub fired_rules: Vec<ActivationRecord>,
    /// Input degrees at the clipped inputs, plus output degrees at the score.
    pub membership_degrees: Memberships,
    pub explanation: String,
    /// Output term with the highest membership at the score.
    pub dominant_term: Option<String>,
    pub defuzzifier: Defuzzifier,
    /// True when no rule fired and the midpoint was returned.
    pub fallback: bool,
}

impl InferenceResult {
    /// Degree of `term` of `variable`, or 0 if either is unknown.
    pub fn degree(&self, variable: &str, term: &str) -> f64 {
        self.membership_degrees
            .get(variable)
            .and_then(|terms| terms.get(term))
            .copied()
            .unwrap_or(0.0)
    }
}
