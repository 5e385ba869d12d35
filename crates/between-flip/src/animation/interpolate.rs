//! Interpolation of CSS values.
//!
//! Browsers interpolate the clone themselves; this is what the headless
//! document uses to report in-flight values. Numeric values sharing a unit
//! interpolate linearly, everything else flips at the midpoint like a CSS
//! discrete animation.

use std::fmt;

/// Trait for types that can be interpolated between two values.
pub trait Interpolate: Sized {
    /// Interpolate between self and another value.
    ///
    /// When t = 0.0, returns self. When t = 1.0, returns to.
    fn interpolate(&self, to: &Self, t: f32) -> Self;
}

#[inline]
fn lerp_f64(from: f64, to: f64, t: f32) -> f64 {
    from + (to - from) * t as f64
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        lerp_f64(*self, *to, t)
    }
}

impl Interpolate for f32 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

/// A single numeric CSS value with an optional unit (`12px`, `0.5`, `1.5em`).
#[derive(Debug, Clone, PartialEq)]
pub struct CssNumber {
    pub value: f64,
    pub unit: String,
}

impl CssNumber {
    /// Parse a numeric value. Keywords and compound values yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let split = text
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .unwrap_or(text.len());
        let (number, unit) = text.split_at(split);
        if unit.chars().any(|c| !c.is_ascii_alphabetic() && c != '%') {
            return None;
        }
        Some(Self {
            value: number.parse().ok()?,
            unit: unit.to_string(),
        })
    }
}

impl fmt::Display for CssNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

impl Interpolate for CssNumber {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        if self.unit == to.unit {
            Self {
                value: self.value.interpolate(&to.value, t),
                unit: self.unit.clone(),
            }
        } else if t < 0.5 {
            self.clone()
        } else {
            to.clone()
        }
    }
}

/// Interpolate two CSS value strings at eased progress `t`.
pub fn interpolate_css(from: &str, to: &str, t: f32) -> String {
    if t <= 0.0 {
        return from.to_string();
    }
    if t >= 1.0 {
        return to.to_string();
    }
    match (CssNumber::parse(from), CssNumber::parse(to)) {
        (Some(a), Some(b)) => a.interpolate(&b, t).to_string(),
        _ if t < 0.5 => from.to_string(),
        _ => to.to_string(),
    }
}
