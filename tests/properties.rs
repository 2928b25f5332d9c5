//! Property-based tests for membership shapes, defuzzification and the
//! movie recommender.

use std::sync::LazyLock;

use fuzzy_advisor::infer::{Defuzzifier, FuzzyOutputSet, Inputs};
use fuzzy_advisor::membership::{MembershipShape, ShapeKind};
use fuzzy_advisor::presets::{self, ACTOR_POPULARITY, GENRE_MATCH, USER_RATING};
use fuzzy_advisor::system::FuzzySystem;
use proptest::prelude::*;

static MOVIES: LazyLock<FuzzySystem> =
    LazyLock::new(|| presets::movie_recommender().expect("bundled preset builds"));

/// Float noise allowed when a sweep should leave the score unchanged.
const EPSILON: f64 = 1e-9;

fn movie(rating: f64, popularity: f64, genre: f64) -> Inputs {
    Inputs::from([
        (USER_RATING.to_string(), rating),
        (ACTOR_POPULARITY.to_string(), popularity),
        (GENRE_MATCH.to_string(), genre),
    ])
}

fn score(rating: f64, popularity: f64, genre: f64) -> f64 {
    MOVIES.infer(&movie(rating, popularity, genre)).unwrap().score
}

/// Three sorted breakpoints in `[0, 100]`, possibly coinciding.
fn triangle_strategy() -> impl Strategy<Value = (f64, f64, f64)> {
    prop::array::uniform3(0u8..=100).prop_map(|mut p| {
        p.sort_unstable();
        (f64::from(p[0]), f64::from(p[1]), f64::from(p[2]))
    })
}

/// Four sorted breakpoints in `[0, 100]`, possibly coinciding.
fn trapezoid_strategy() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    prop::array::uniform4(0u8..=100).prop_map(|mut p| {
        p.sort_unstable();
        (
            f64::from(p[0]),
            f64::from(p[1]),
            f64::from(p[2]),
            f64::from(p[3]),
        )
    })
}

fn sorted_pair(lo: f64, hi: f64) -> impl Strategy<Value = (f64, f64)> {
    (lo..=hi, lo..=hi).prop_map(|(x, y)| if x <= y { (x, y) } else { (y, x) })
}

proptest! {
    #[test]
    fn triangle_breakpoints((a, b, c) in triangle_strategy()) {
        let t = MembershipShape::from_params("t", ShapeKind::Triangular, &[a, b, c]).unwrap();
        prop_assert_eq!(t.evaluate(b), 1.0);
        prop_assert_eq!(t.evaluate(a), if a == b { 1.0 } else { 0.0 });
        prop_assert_eq!(t.evaluate(c), if b == c { 1.0 } else { 0.0 });
    }

    #[test]
    fn triangle_rises_then_falls(
        (a, b, c) in triangle_strategy(),
        s in 0.0f64..=1.0,
        t in 0.0f64..=1.0,
    ) {
        let shape = MembershipShape::from_params("t", ShapeKind::Triangular, &[a, b, c])
            .unwrap();
        let (lo, hi) = if s <= t { (s, t) } else { (t, s) };

        let (x1, x2) = (a + lo * (b - a), a + hi * (b - a));
        prop_assert!(shape.evaluate(x1) <= shape.evaluate(x2));

        let (x1, x2) = (b + lo * (c - b), b + hi * (c - b));
        prop_assert!(shape.evaluate(x1) >= shape.evaluate(x2));
    }

    #[test]
    fn trapezoid_plateau_and_slopes(
        (a, b, c, d) in trapezoid_strategy(),
        s in 0.0f64..=1.0,
        t in 0.0f64..=1.0,
    ) {
        let shape = MembershipShape::from_params("t", ShapeKind::Trapezoidal, &[a, b, c, d])
            .unwrap();
        let (lo, hi) = if s <= t { (s, t) } else { (t, s) };

        prop_assert_eq!(shape.evaluate(b + lo * (c - b)), 1.0);

        let (x1, x2) = (a + lo * (b - a), a + hi * (b - a));
        prop_assert!(shape.evaluate(x1) <= shape.evaluate(x2));

        let (x1, x2) = (c + lo * (d - c), c + hi * (d - c));
        prop_assert!(shape.evaluate(x1) >= shape.evaluate(x2));
    }

    #[test]
    fn every_shape_stays_in_unit_interval(
        (a, b, c, d) in trapezoid_strategy(),
        x in -1.0e6f64..1.0e6,
        sigma in 0.01f64..50.0,
        slope in prop_oneof![-10.0f64..-0.01, 0.01f64..10.0],
    ) {
        let shapes = [
            MembershipShape::from_params("t", ShapeKind::Triangular, &[a, b, c]).unwrap(),
            MembershipShape::from_params("t", ShapeKind::Trapezoidal, &[a, b, c, d]).unwrap(),
            MembershipShape::from_params("t", ShapeKind::Gaussian, &[b, sigma]).unwrap(),
            MembershipShape::from_params("t", ShapeKind::Sigmoid, &[slope, c]).unwrap(),
            MembershipShape::from_params("t", ShapeKind::PiShaped, &[slope, b, slope, c]).unwrap(),
        ];
        for shape in shapes {
            let mu = shape.evaluate(x);
            prop_assert!((0.0..=1.0).contains(&mu), "{:?} at {} gave {}", shape, x, mu);
        }
    }

    #[test]
    fn centroid_of_symmetric_triangle_is_its_peak(center in 2u8..=98, half_width in 2u8..=50) {
        let center = f64::from(center);
        let half_width = f64::from(half_width).min(center).min(100.0 - center);
        prop_assume!(half_width >= 2.0);

        let shape = MembershipShape::from_params(
            "peak",
            ShapeKind::Triangular,
            &[center - half_width, center, center + half_width],
        )
        .unwrap();
        let points: Vec<f64> = (0..=100).map(f64::from).collect();
        let degrees = points.iter().map(|&y| shape.evaluate(y)).collect();
        let set = FuzzyOutputSet::new(points, degrees);

        prop_assert!((Defuzzifier::Centroid.defuzzify(&set) - center).abs() <= 1.0);
        prop_assert_eq!(Defuzzifier::MeanOfMaximum.defuzzify(&set), center);
    }

    #[test]
    fn inference_is_deterministic_and_bounded(
        rating in -5.0f64..15.0,
        popularity in -50.0f64..150.0,
        genre in -50.0f64..150.0,
    ) {
        let inputs = movie(rating, popularity, genre);
        let first = MOVIES.infer(&inputs).unwrap();
        let second = MOVIES.infer(&inputs).unwrap();

        prop_assert_eq!(first.score.to_bits(), second.score.to_bits());
        prop_assert!((0.0..=100.0).contains(&first.score));
        prop_assert!((0.0..=1.0).contains(&first.confidence));
        prop_assert_eq!(first.fallback, first.fired_rules.is_empty());
        prop_assert!(first.fired_rules.iter().all(|r| r.degree > 0.0 && r.degree <= 1.0));
    }

    /// Better genre match never hurts a well-rated movie with unknown actors,
    /// while the match moves from poor towards moderate.
    #[test]
    fn genre_match_is_monotonic_up_to_moderate(
        (g1, g2) in sorted_pair(0.0, 50.0),
        rating in 8.0f64..=10.0,
        popularity in 0.0f64..=20.0,
    ) {
        prop_assert!(score(rating, popularity, g2) >= score(rating, popularity, g1) - EPSILON);
    }

    /// Same, once the match has started to become excellent.
    #[test]
    fn genre_match_is_monotonic_towards_excellent(
        (g1, g2) in sorted_pair(65.0, 100.0),
        rating in 8.0f64..=10.0,
        popularity in 0.0f64..=20.0,
    ) {
        prop_assert!(score(rating, popularity, g2) >= score(rating, popularity, g1) - EPSILON);
    }

    /// A higher rating never hurts a famous cast in a poorly matched genre.
    #[test]
    fn rating_is_monotonic_for_famous_casts(
        (r1, r2) in sorted_pair(1.0, 10.0),
        popularity in 80.0f64..=100.0,
        genre in 0.0f64..=20.0,
    ) {
        prop_assert!(score(r2, popularity, genre) >= score(r1, popularity, genre) - EPSILON);
    }

    /// More popular actors never hurt a poorly rated, poorly matched movie.
    #[test]
    fn popularity_is_monotonic_for_poor_movies(
        (p1, p2) in sorted_pair(0.0, 100.0),
        rating in 1.0f64..=2.0,
        genre in 0.0f64..=20.0,
    ) {
        prop_assert!(score(rating, p2, genre) >= score(rating, p1, genre) - EPSILON);
    }
}
