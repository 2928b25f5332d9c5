//! Bundled system configurations.
//!
//! Presets are TOML manifests compiled into the binary, so the canonical
//! movie recommender is available without any file on disk.

use crate::error::FuzzyResult;
use crate::manifest::SystemManifest;
use crate::system::FuzzySystem;

/// Input: the user's rating of the movie, 1 to 10.
pub const USER_RATING: &str = "user_rating";
/// Input: popularity of the lead actors, 0 to 100.
pub const ACTOR_POPULARITY: &str = "actor_popularity";
/// Input: overlap between the movie's genres and the user's, 0 to 100.
pub const GENRE_MATCH: &str = "genre_match";
/// Output: recommendation strength, 0 to 100.
pub const RECOMMENDATION: &str = "recommendation";

const MOVIES_TOML: &str = include_str!("../data/presets/movies.toml");

/// Names of the bundled presets.
pub const PRESETS: &[&str] = &["movies"];

/// Raw TOML of a bundled preset.
pub fn source(name: &str) -> Option<&'static str> {
    match name {
        "movies" => Some(MOVIES_TOML),
        _ => None,
    }
}

/// The movie recommendation manifest.
pub fn movie_manifest() -> FuzzyResult<SystemManifest> {
    Ok(SystemManifest::from_toml(MOVIES_TOML)?)
}

/// The canonical movie recommender: three inputs, fifteen rules, centroid.
pub fn movie_recommender() -> FuzzyResult<FuzzySystem> {
    movie_manifest()?.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::Defuzzifier;

    #[test]
    fn movie_preset_builds() {
        let system = movie_recommender().unwrap();
        assert_eq!(system.name(), "movie-recommender");
        assert_eq!(system.defuzzifier(), Defuzzifier::Centroid);
        assert_eq!(system.registry().inputs().count(), 3);
        assert_eq!(system.registry().output().unwrap().name, RECOMMENDATION);
        assert_eq!(system.rules().len(), 15);
        assert_eq!(system.output_grid().len(), 101);
        assert!(system.audit().is_clean());
    }

    #[test]
    fn rule_weights_follow_confidence_levels() {
        let system = movie_recommender().unwrap();
        let weights: Vec<f64> = system.rules().rules().iter().map(|r| r.confidence).collect();
        assert_eq!(
            weights,
            vec![1.0, 1.0, 0.8, 1.0, 0.8, 0.8, 0.8, 0.8, 0.6, 0.6, 0.6, 1.0, 1.0, 0.8, 0.6]
        );
        assert!(system.rules().rules().iter().all(|r| !r.description.is_empty()));
    }

    #[test]
    fn every_preset_has_a_source() {
        for name in PRESETS {
            assert!(source(name).is_some());
        }
        assert!(source("books").is_none());
    }
}
