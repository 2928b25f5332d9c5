//! Membership function shapes.
//!
//! Every shape maps a crisp value to a degree in `[0, 1]`. Triangles and
//! trapezoids may be degenerate: when two adjacent breakpoints coincide the
//! corresponding edge becomes a step (a shoulder) instead of a division by
//! zero. Clipping a value into the variable's universe is done by the caller
//! ([`crate::variable::LinguisticVariable::clip`]).

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Largest magnitude passed to `exp` by the sigmoid shape.
const SIGMOID_EXP_LIMIT: f64 = 500.0;

/// The kind of a membership function, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Triangular,
    Trapezoidal,
    Gaussian,
    Sigmoid,
    PiShaped,
}

impl ShapeKind {
    /// Number of parameters the shape takes.
    pub fn param_count(self) -> usize {
        match self {
            Self::Triangular => 3,
            Self::Trapezoidal | Self::PiShaped => 4,
            Self::Gaussian | Self::Sigmoid => 2,
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Triangular => write!(f, "triangular"),
            Self::Trapezoidal => write!(f, "trapezoidal"),
            Self::Gaussian => write!(f, "gaussian"),
            Self::Sigmoid => write!(f, "sigmoid"),
            Self::PiShaped => write!(f, "pi_shaped"),
        }
    }
}

/// A validated membership function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MembershipShape {
    /// Rises from `a` to a peak at `b`, falls to `c`.
    Triangular { a: f64, b: f64, c: f64 },
    /// Rises from `a` to `b`, full membership on `[b, c]`, falls to `d`.
    Trapezoidal { a: f64, b: f64, c: f64, d: f64 },
    /// Bell curve centred on `mean`.
    Gaussian { mean: f64, sigma: f64 },
    /// Crosses 0.5 at `crossover`; positive slope rises, negative falls.
    Sigmoid { slope: f64, crossover: f64 },
    /// A rising sigmoid capped by a falling one: `min(sig(rise_slope,
    /// rise_crossover), sig(-fall_slope, fall_crossover))`.
    PiShaped {
        rise_slope: f64,
        rise_crossover: f64,
        fall_slope: f64,
        fall_crossover: f64,
    },
}

impl MembershipShape {
    /// Build a shape from its kind and raw parameter list.
    ///
    /// `term` is only used for error reporting.
    pub fn from_params(term: &str, kind: ShapeKind, params: &[f64]) -> ConfigResult<Self> {
        if params.len() != kind.param_count() {
            return Err(ConfigError::ParameterCount {
                term: term.to_string(),
                kind: kind.to_string(),
                expected: kind.param_count(),
                actual: params.len(),
            });
        }
        if let Some(bad) = params.iter().find(|p| !p.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                term: term.to_string(),
                message: format!("{bad} is not finite"),
            });
        }

        let shape = match kind {
            ShapeKind::Triangular => Self::Triangular {
                a: params[0],
                b: params[1],
                c: params[2],
            },
            ShapeKind::Trapezoidal => Self::Trapezoidal {
                a: params[0],
                b: params[1],
                c: params[2],
                d: params[3],
            },
            ShapeKind::Gaussian => {
                if params[1] <= 0.0 {
                    return Err(ConfigError::InvalidParameter {
                        term: term.to_string(),
                        message: format!("gaussian sigma must be positive, got {}", params[1]),
                    });
                }
                Self::Gaussian {
                    mean: params[0],
                    sigma: params[1],
                }
            }
            ShapeKind::Sigmoid => {
                if params[0] == 0.0 {
                    return Err(ConfigError::InvalidParameter {
                        term: term.to_string(),
                        message: "sigmoid slope must be non-zero".into(),
                    });
                }
                Self::Sigmoid {
                    slope: params[0],
                    crossover: params[1],
                }
            }
            ShapeKind::PiShaped => {
                if params[0] == 0.0 || params[2] == 0.0 {
                    return Err(ConfigError::InvalidParameter {
                        term: term.to_string(),
                        message: "pi-shaped slopes must be non-zero".into(),
                    });
                }
                Self::PiShaped {
                    rise_slope: params[0],
                    rise_crossover: params[1],
                    fall_slope: params[2],
                    fall_crossover: params[3],
                }
            }
        };

        if matches!(kind, ShapeKind::Triangular | ShapeKind::Trapezoidal)
            && params.windows(2).any(|w| w[0] > w[1])
        {
            return Err(ConfigError::NonMonotonic {
                term: term.to_string(),
                params: params.to_vec(),
            });
        }

        Ok(shape)
    }

    /// The kind of this shape.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Triangular { .. } => ShapeKind::Triangular,
            Self::Trapezoidal { .. } => ShapeKind::Trapezoidal,
            Self::Gaussian { .. } => ShapeKind::Gaussian,
            Self::Sigmoid { .. } => ShapeKind::Sigmoid,
            Self::PiShaped { .. } => ShapeKind::PiShaped,
        }
    }

    /// Parameters in configuration order.
    pub fn params(&self) -> Vec<f64> {
        match *self {
            Self::Triangular { a, b, c } => vec![a, b, c],
            Self::Trapezoidal { a, b, c, d } => vec![a, b, c, d],
            Self::Gaussian { mean, sigma } => vec![mean, sigma],
            Self::Sigmoid { slope, crossover } => vec![slope, crossover],
            Self::PiShaped {
                rise_slope,
                rise_crossover,
                fall_slope,
                fall_crossover,
            } => vec![rise_slope, rise_crossover, fall_slope, fall_crossover],
        }
    }

    /// Points that must lie inside the variable's universe.
    ///
    /// Sigma and slope are widths, not locations, so they are excluded.
    pub fn anchors(&self) -> Vec<f64> {
        match *self {
            Self::Triangular { a, b, c } => vec![a, b, c],
            Self::Trapezoidal { a, b, c, d } => vec![a, b, c, d],
            Self::Gaussian { mean, .. } => vec![mean],
            Self::Sigmoid { crossover, .. } => vec![crossover],
            Self::PiShaped {
                rise_crossover,
                fall_crossover,
                ..
            } => vec![rise_crossover, fall_crossover],
        }
    }

    /// Degree of membership of `x`, always within `[0, 1]`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let degree = match *self {
            Self::Triangular { a, b, c } => rising_edge(a, b, x).min(falling_edge(b, c, x)),
            Self::Trapezoidal { a, b, c, d } => {
                rising_edge(a, b, x).min(1.0).min(falling_edge(c, d, x))
            }
            Self::Gaussian { mean, sigma } => (-0.5 * ((x - mean) / sigma).powi(2)).exp(),
            Self::Sigmoid { slope, crossover } => sigmoid(slope, crossover, x),
            Self::PiShaped {
                rise_slope,
                rise_crossover,
                fall_slope,
                fall_crossover,
            } => sigmoid(rise_slope, rise_crossover, x)
                .min(sigmoid(-fall_slope, fall_crossover, x)),
        };
        degree.clamp(0.0, 1.0)
    }
}

fn sigmoid(slope: f64, crossover: f64, x: f64) -> f64 {
    let z = (slope * (x - crossover)).clamp(-SIGMOID_EXP_LIMIT, SIGMOID_EXP_LIMIT);
    1.0 / (1.0 + (-z).exp())
}

/// `(x - from) / (to - from)`, or a constant 1 when the edge is vertical.
fn rising_edge(from: f64, to: f64, x: f64) -> f64 {
    if to > from {
        (x - from) / (to - from)
    } else {
        1.0
    }
}

/// `(to - x) / (to - from)`, or a constant 1 when the edge is vertical.
fn falling_edge(from: f64, to: f64, x: f64) -> f64 {
    if to > from {
        (to - x) / (to - from)
    } else {
        1.0
    }
}
