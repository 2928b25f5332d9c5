// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # fuzzy-advisor
//!
//! A Mamdani fuzzy inference engine for recommendation scoring. Crisp inputs
//! (a quality rating, a popularity figure, a category affinity) are fuzzified
//! into linguistic terms, combined by weighted rules, aggregated into an
//! output fuzzy set and defuzzified into one recommendation strength with an
//! explanation of the rules that fired.
//!
//! ## Architecture
//!
//! - **Membership functions** (`membership`): triangular, trapezoidal, gaussian, sigmoid, pi-shaped
//! - **Variables** (`variable`): bounded universes partitioned into named terms
//! - **Rules** (`rules`): weighted AND/OR rules with negation, audit and explanation
//! - **Inference** (`infer`): implication, max aggregation, five defuzzifiers
//! - **Systems** (`system`): validated builder and immutable, thread-safe system
//! - **Manifests** (`manifest`, `presets`): TOML configuration, bundled movie preset
//!
//! ## Library usage
//!
//! ```no_run
//! use fuzzy_advisor::infer::Inputs;
//! use fuzzy_advisor::presets;
//!
//! let system = presets::movie_recommender().unwrap();
//! let inputs = Inputs::from([
//!     (presets::USER_RATING.to_string(), 9.8),
//!     (presets::ACTOR_POPULARITY.to_string(), 95.0),
//!     (presets::GENRE_MATCH.to_string(), 100.0),
//! ]);
//! let result = system.infer(&inputs).unwrap();
//! println!("{:.1}: {}", result.score, result.explanation);
//! ```

pub mod error;
pub mod infer;
pub mod manifest;
pub mod membership;
pub mod presets;
pub mod rules;
pub mod stats;
pub mod system;
pub mod variable;
