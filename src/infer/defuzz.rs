//! Defuzzification: reducing an aggregated fuzzy set to one crisp value.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::FuzzyOutputSet;

/// Strategy used to turn the aggregated output set into a score.
///
/// Every strategy is total: an empty or all-zero set yields the midpoint of
/// the sampled universe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Defuzzifier {
    /// Membership-weighted mean of the sample points.
    #[default]
    #[serde(rename = "centroid")]
    Centroid,
    /// Sample point splitting the total membership into two equal halves.
    #[serde(rename = "bisector")]
    Bisector,
    #[serde(rename = "mom", alias = "mean_of_maximum")]
    MeanOfMaximum,
    #[serde(rename = "som", alias = "smallest_of_maximum")]
    SmallestOfMaximum,
    #[serde(rename = "lom", alias = "largest_of_maximum")]
    LargestOfMaximum,
}

impl Defuzzifier {
    /// Every strategy, in presentation order.
    pub const ALL: [Defuzzifier; 5] = [
        Self::Centroid,
        Self::Bisector,
        Self::MeanOfMaximum,
        Self::SmallestOfMaximum,
        Self::LargestOfMaximum,
    ];

    /// Short configuration name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Centroid => "centroid",
            Self::Bisector => "bisector",
            Self::MeanOfMaximum => "mom",
            Self::SmallestOfMaximum => "som",
            Self::LargestOfMaximum => "lom",
        }
    }

    /// Reduce `set` to a crisp value.
    pub fn defuzzify(self, set: &FuzzyOutputSet) -> f64 {
        let total: f64 = set.degrees().iter().sum();
        if set.is_empty() || total <= 0.0 {
            return set.midpoint();
        }
        match self {
            Self::Centroid => centroid(set, total),
            Self::Bisector => bisector(set, total),
            Self::MeanOfMaximum => {
                let maxima = maxima(set);
                maxima.iter().sum::<f64>() / maxima.len() as f64
            }
            Self::SmallestOfMaximum => maxima(set)
                .first()
                .copied()
                .unwrap_or_else(|| set.midpoint()),
            Self::LargestOfMaximum => maxima(set)
                .last()
                .copied()
                .unwrap_or_else(|| set.midpoint()),
        }
    }
}

fn centroid(set: &FuzzyOutputSet, total: f64) -> f64 {
    let moment: f64 = set.iter().map(|(y, mu)| y * mu).sum();
    moment / total
}

/// First index `k` minimising `|sum(mu[..k]) - sum(mu[k+1..])|`.
fn bisector(set: &FuzzyOutputSet, total: f64) -> f64 {
    let mut left = 0.0;
    let mut best = (f64::INFINITY, set.midpoint());
    for (y, mu) in set.iter() {
        let right = total - left - mu;
        let imbalance = (left - right).abs();
        if imbalance < best.0 {
            best = (imbalance, y);
        }
        left += mu;
    }
    best.1
}

/// Sample points whose membership equals the maximum, in ascending order.
fn maxima(set: &FuzzyOutputSet) -> Vec<f64> {
    let peak = set.max_degree();
    set.iter()
        .filter(|&(_, mu)| mu == peak)
        .map(|(y, _)| y)
        .collect()
}

impl std::fmt::Display for Defuzzifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Defuzzifier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "centroid" | "centre_of_gravity" | "center_of_gravity" | "cog" => Ok(Self::Centroid),
            "bisector" => Ok(Self::Bisector),
            "mom" | "mean_of_maximum" => Ok(Self::MeanOfMaximum),
            "som" | "smallest_of_maximum" => Ok(Self::SmallestOfMaximum),
            "lom" | "largest_of_maximum" => Ok(Self::LargestOfMaximum),
            _ => Err(ConfigError::UnknownDefuzzifier {
                name: s.to_string(),
            }),
        }
    }
}
