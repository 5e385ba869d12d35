//! CSS timing functions.
//!
//! Easings are carried on every command and rendered into the clone's
//! `transition` declaration, so they round-trip through CSS text:
//!
//! ```
//! use between_flip::animation::easing::EasingFunction;
//!
//! let easing: EasingFunction = "cubic-bezier(0.4, 0, 0.2, 1)".parse().unwrap();
//! assert_eq!(easing.to_string(), "cubic-bezier(0.4, 0, 0.2, 1)");
//! assert!(easing.evaluate(0.5) > 0.5);
//! ```
//!
//! `evaluate` is only needed by hosts that interpolate on their own (the
//! headless document); browsers run the curve themselves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FlipError, Result};

/// Jump position for `steps()`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// `jump-start` / `start`.
    Start,
    /// `jump-end` / `end`.
    #[default]
    End,
    /// `jump-both`.
    Both,
    /// `jump-none`.
    None,
}

impl StepPosition {
    fn css_name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Both => "jump-both",
            Self::None => "jump-none",
        }
    }
}

/// Easing function for transition timing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    Linear,

    /// `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    #[default]
    Ease,

    /// `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,

    /// `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,

    /// `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,

    /// Custom curve; x values are within [0, 1].
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },

    /// Discrete jumps; `count` is at least 1.
    Steps { count: u32, position: StepPosition },
}

impl EasingFunction {
    /// Evaluate the easing function at the given progress.
    ///
    /// Input is clamped to [0, 1]; output may leave that range for
    /// overshooting bezier curves.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::Steps { count, position } => stepped(*count, *position, t),
        }
    }

    /// Create a custom cubic bezier easing function.
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            return Err(FlipError::InvalidEasing(format!(
                "cubic-bezier x values must be in [0, 1], got {} and {}",
                x1, x2
            )));
        }
        Ok(Self::CubicBezier { x1, y1, x2, y2 })
    }

    /// Create a stepped easing function.
    pub fn steps(count: u32, position: StepPosition) -> Result<Self> {
        if count == 0 {
            return Err(FlipError::InvalidEasing("steps() needs at least 1 step".into()));
        }
        Ok(Self::Steps { count, position })
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Ease => f.write_str("ease"),
            Self::EaseIn => f.write_str("ease-in"),
            Self::EaseOut => f.write_str("ease-out"),
            Self::EaseInOut => f.write_str("ease-in-out"),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
            Self::Steps { count, position } => {
                write!(f, "steps({}, {})", count, position.css_name())
            }
        }
    }
}

impl FromStr for EasingFunction {
    type Err = FlipError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim().to_ascii_lowercase();
        let invalid = || FlipError::InvalidEasing(s.to_string());

        match text.as_str() {
            "linear" => return Ok(Self::Linear),
            "ease" => return Ok(Self::Ease),
            "ease-in" => return Ok(Self::EaseIn),
            "ease-out" => return Ok(Self::EaseOut),
            "ease-in-out" => return Ok(Self::EaseInOut),
            "step-start" => return Self::steps(1, StepPosition::Start),
            "step-end" => return Self::steps(1, StepPosition::End),
            _ => {}
        }

        let (name, args) = text
            .strip_suffix(')')
            .and_then(|t| t.split_once('('))
            .ok_or_else(invalid)?;
        let args: Vec<&str> = args.split(',').map(str::trim).collect();

        match name.trim() {
            "cubic-bezier" => {
                let values = args
                    .iter()
                    .map(|a| a.parse::<f32>())
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| invalid())?;
                match values.as_slice() {
                    [x1, y1, x2, y2] => Self::cubic_bezier(*x1, *y1, *x2, *y2),
                    _ => Err(invalid()),
                }
            }
            "steps" => {
                let count = args
                    .first()
                    .and_then(|a| a.parse::<u32>().ok())
                    .ok_or_else(invalid)?;
                let position = match args.get(1).copied() {
                    None | Some("end") | Some("jump-end") => StepPosition::End,
                    Some("start") | Some("jump-start") => StepPosition::Start,
                    Some("jump-both") => StepPosition::Both,
                    Some("jump-none") => StepPosition::None,
                    Some(_) => return Err(invalid()),
                };
                if args.len() > 2 {
                    return Err(invalid());
                }
                Self::steps(count, position)
            }
            _ => Err(invalid()),
        }
    }
}

/// Evaluate a cubic bezier curve at the given progress.
///
/// Newton-Raphson finds the curve parameter whose x matches the progress,
/// then the y coordinate at that parameter is returned.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, progress: f32) -> f32 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_y(y1, y2, t)
}

fn solve_bezier_x(x1: f32, x2: f32, target_x: f32) -> f32 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = bezier_x(x1, x2, t) - target_x;
        if x.abs() < 1e-6 {
            break;
        }

        let dx = bezier_x_derivative(x1, x2, t);
        if dx.abs() < 1e-6 {
            break;
        }

        t = (t - x / dx).clamp(0.0, 1.0);
    }

    t
}

/// x(t) = 3(1-t)²t·x1 + 3(1-t)t²·x2 + t³
#[inline]
fn bezier_x(x1: f32, x2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * x1 + 3.0 * mt * t * t * x2 + t * t * t
}

#[inline]
fn bezier_y(y1: f32, y2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * y1 + 3.0 * mt * t * t * y2 + t * t * t
}

/// dx/dt = 3(1-t)²·x1 + 6(1-t)t·(x2-x1) + 3t²·(1-x2)
#[inline]
fn bezier_x_derivative(x1: f32, x2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}

fn stepped(steps: u32, position: StepPosition, t: f32) -> f32 {
    if steps == 0 {
        return t;
    }

    let n = steps as f32;
    match position {
        StepPosition::Start => (t * n).ceil() / n,
        StepPosition::End => (t * n).floor() / n,
        StepPosition::Both => ((t * (n + 1.0)).floor() / n).min(1.0),
        StepPosition::None if steps == 1 => 0.5,
        StepPosition::None => ((t * n).floor() / (n - 1.0)).min(1.0),
    }
}
