//! Rule activation statistics.
//!
//! Systems never record anything themselves; callers that want to know
//! which rules carry their workload feed results into a [`RuleStatistics`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::infer::InferenceResult;

/// Activation totals for one rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RuleActivity {
    pub activations: u64,
    pub total_strength: f64,
}

impl RuleActivity {
    pub fn mean_strength(&self) -> f64 {
        if self.activations == 0 {
            0.0
        } else {
            self.total_strength / self.activations as f64
        }
    }
}

/// Accumulates rule activity across inference results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleStatistics {
    inferences: u64,
    fallbacks: u64,
    rules: BTreeMap<u32, RuleActivity>,
}

impl RuleStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &InferenceResult) {
        self.inferences += 1;
        if result.fallback {
            self.fallbacks += 1;
        }
        for fired in &result.fired_rules {
            let entry = self.rules.entry(fired.rule_id).or_default();
            entry.activations += 1;
            entry.total_strength += fired.degree;
        }
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: &RuleStatistics) {
        self.inferences += other.inferences;
        self.fallbacks += other.fallbacks;
        for (id, activity) in &other.rules {
            let entry = self.rules.entry(*id).or_default();
            entry.activations += activity.activations;
            entry.total_strength += activity.total_strength;
        }
    }

    pub fn inferences(&self) -> u64 {
        self.inferences
    }

    /// Results for which no rule fired.
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks
    }

    pub fn get(&self, rule_id: u32) -> Option<&RuleActivity> {
        self.rules.get(&rule_id)
    }

    /// Up to `n` rules ordered by activation count, then by id.
    pub fn most_active(&self, n: usize) -> Vec<(u32, RuleActivity)> {
        let mut ranked: Vec<(u32, RuleActivity)> =
            self.rules.iter().map(|(id, a)| (*id, *a)).collect();
        ranked.sort_by(|a, b| b.1.activations.cmp(&a.1.activations).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl<'a> Extend<&'a InferenceResult> for RuleStatistics {
    fn extend<I: IntoIterator<Item = &'a InferenceResult>>(&mut self, iter: I) {
        for result in iter {
            self.record(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::Defuzzifier;
    use crate::rules::ActivationRecord;
    use crate::variable::Memberships;

    fn result(fired: &[(u32, f64)]) -> InferenceResult {
        InferenceResult {
            score: 50.0,
            confidence: fired.iter().map(|f| f.1).fold(0.0, f64::max),
            fired_rules: fired
                .iter()
                .map(|&(rule_id, degree)| ActivationRecord {
                    rule_id,
                    consequent: "x".into(),
                    degree,
                })
                .collect(),
            membership_degrees: Memberships::new(),
            explanation: String::new(),
            dominant_term: None,
            defuzzifier: Defuzzifier::Centroid,
            fallback: fired.is_empty(),
        }
    }

    #[test]
    fn accumulates_counts_and_strength() {
        let mut stats = RuleStatistics::new();
        stats.record(&result(&[(1, 0.5), (2, 1.0)]));
        stats.record(&result(&[(1, 0.25)]));
        stats.record(&result(&[]));

        assert_eq!(stats.inferences(), 3);
        assert_eq!(stats.fallbacks(), 1);
        let first = stats.get(1).unwrap();
        assert_eq!(first.activations, 2);
        assert!((first.mean_strength() - 0.375).abs() < 1e-12);
        assert!(stats.get(3).is_none());

        let top = stats.most_active(1);
        assert_eq!(top[0].0, 1);
    }

    #[test]
    fn merge_and_extend_agree() {
        let results = [result(&[(1, 0.5)]), result(&[(2, 0.8)]), result(&[(1, 0.1)])];

        let mut whole = RuleStatistics::new();
        whole.extend(results.iter());

        let mut left = RuleStatistics::new();
        left.extend(results[..1].iter());
        let mut right = RuleStatistics::new();
        right.extend(results[1..].iter());
        left.merge(&right);

        assert_eq!(left.inferences(), whole.inferences());
        assert_eq!(left.get(1), whole.get(1));
        assert_eq!(left.get(2), whole.get(2));

        whole.reset();
        assert_eq!(whole.inferences(), 0);
    }
}
