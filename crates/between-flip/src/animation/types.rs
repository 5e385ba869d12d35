//! Core value types shared by the controller and its hosts.
//!
//! This module defines:
//! - `NodeId`: Opaque handle for an element owned by a host
//! - `BoundingBox`: Viewport-space geometry of an element
//! - `StyleProperty`: Every style property the controller reads or writes
//! - `ComputedStyle`: Owned copy of transitionable computed values
//! - `VisualSnapshot`: Geometry plus style captured at one instant

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::FlipError;

/// Handle for an element known to a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element's position and size in viewport coordinates.
///
/// Like `getBoundingClientRect`, the box excludes margin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// Format a length in CSS pixels (`12px`, `12.5px`).
pub fn px(value: f64) -> String {
    format!("{}px", value)
}

/// Parse a CSS pixel length. Bare numbers are accepted as pixels.
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    value
        .strip_suffix("px")
        .unwrap_or(value)
        .trim()
        .parse::<f64>()
        .ok()
}

/// Style properties the controller reads or writes.
///
/// Most variants are transitionable and take part in snapshots (see
/// [`StyleProperty::TRANSITIONABLE`]). `Position`, `Margin`, `Transition` and
/// `PointerEvents` are control properties: they are written inline on clones
/// and hidden elements but never captured or diffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleProperty {
    Background,
    BackgroundColor,
    Border,
    BorderColor,
    BorderWidth,
    BorderStyle,
    BorderRadius,
    BoxShadow,
    BoxSizing,
    Clip,
    Color,
    Opacity,
    Font,
    FontFamily,
    FontSize,
    FontStyle,
    FontWeight,
    LetterSpacing,
    LineHeight,
    TextAlign,
    TextDecoration,
    TextIndent,
    TextShadow,
    TextTransform,
    Top,
    Left,
    Right,
    Bottom,
    Height,
    Width,
    Padding,
    Overflow,
    Position,
    Margin,
    Transition,
    PointerEvents,
}

impl StyleProperty {
    /// The fixed allow-list of properties carried from the last state onto the clone.
    pub const TRANSITIONABLE: [StyleProperty; 32] = [
        Self::Background,
        Self::BackgroundColor,
        Self::Border,
        Self::BorderColor,
        Self::BorderWidth,
        Self::BorderStyle,
        Self::BorderRadius,
        Self::BoxShadow,
        Self::BoxSizing,
        Self::Clip,
        Self::Color,
        Self::Opacity,
        Self::Font,
        Self::FontFamily,
        Self::FontSize,
        Self::FontStyle,
        Self::FontWeight,
        Self::LetterSpacing,
        Self::LineHeight,
        Self::TextAlign,
        Self::TextDecoration,
        Self::TextIndent,
        Self::TextShadow,
        Self::TextTransform,
        Self::Top,
        Self::Left,
        Self::Right,
        Self::Bottom,
        Self::Height,
        Self::Width,
        Self::Padding,
        Self::Overflow,
    ];

    /// CSS property name.
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::BackgroundColor => "background-color",
            Self::Border => "border",
            Self::BorderColor => "border-color",
            Self::BorderWidth => "border-width",
            Self::BorderStyle => "border-style",
            Self::BorderRadius => "border-radius",
            Self::BoxShadow => "box-shadow",
            Self::BoxSizing => "box-sizing",
            Self::Clip => "clip",
            Self::Color => "color",
            Self::Opacity => "opacity",
            Self::Font => "font",
            Self::FontFamily => "font-family",
            Self::FontSize => "font-size",
            Self::FontStyle => "font-style",
            Self::FontWeight => "font-weight",
            Self::LetterSpacing => "letter-spacing",
            Self::LineHeight => "line-height",
            Self::TextAlign => "text-align",
            Self::TextDecoration => "text-decoration",
            Self::TextIndent => "text-indent",
            Self::TextShadow => "text-shadow",
            Self::TextTransform => "text-transform",
            Self::Top => "top",
            Self::Left => "left",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Height => "height",
            Self::Width => "width",
            Self::Padding => "padding",
            Self::Overflow => "overflow",
            Self::Position => "position",
            Self::Margin => "margin",
            Self::Transition => "transition",
            Self::PointerEvents => "pointer-events",
        }
    }

    /// Whether the property belongs to the transition allow-list.
    pub fn is_transitionable(self) -> bool {
        !matches!(
            self,
            Self::Position | Self::Margin | Self::Transition | Self::PointerEvents
        )
    }
}

impl fmt::Display for StyleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

impl FromStr for StyleProperty {
    type Err = FlipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::TRANSITIONABLE
            .iter()
            .chain(&[
                Self::Position,
                Self::Margin,
                Self::Transition,
                Self::PointerEvents,
            ])
            .copied()
            .find(|p| p.css_name() == name)
            .ok_or_else(|| FlipError::InvalidStyleProperty(s.to_string()))
    }
}

/// Owned copy of computed style values, restricted to transitionable properties.
///
/// Values are plain CSS strings copied out of the host at capture time, so a
/// later change to the live element never reaches an existing snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    values: BTreeMap<StyleProperty, String>,
}

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ComputedStyle::insert`].
    pub fn with(mut self, property: StyleProperty, value: impl Into<String>) -> Self {
        self.insert(property, value);
        self
    }

    /// Set a value. Control properties are dropped.
    pub fn insert(&mut self, property: StyleProperty, value: impl Into<String>) {
        if property.is_transitionable() {
            self.values.insert(property, value.into());
        }
    }

    pub fn get(&self, property: StyleProperty) -> Option<&str> {
        self.values.get(&property).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleProperty, &str)> {
        self.values.iter().map(|(p, v)| (*p, v.as_str()))
    }
}

impl FromIterator<(StyleProperty, String)> for ComputedStyle {
    fn from_iter<I: IntoIterator<Item = (StyleProperty, String)>>(iter: I) -> Self {
        let mut style = Self::new();
        for (property, value) in iter {
            style.insert(property, value);
        }
        style
    }
}

/// Geometry and style of an element at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualSnapshot {
    pub bounds: BoundingBox,
    pub style: ComputedStyle,
}

impl VisualSnapshot {
    pub fn new(bounds: BoundingBox, style: ComputedStyle) -> Self {
        Self { bounds, style }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_round_trip() {
        assert_eq!(px(100.0), "100px");
        assert_eq!(px(12.5), "12.5px");
        assert_eq!(parse_px("100px"), Some(100.0));
        assert_eq!(parse_px(" 0.5 "), Some(0.5));
        assert_eq!(parse_px("auto"), None);
    }

    #[test]
    fn test_transitionable_list_excludes_control_properties() {
        for property in StyleProperty::TRANSITIONABLE {
            assert!(property.is_transitionable(), "{} should transition", property);
        }
        assert!(!StyleProperty::Position.is_transitionable());
        assert!(!StyleProperty::Margin.is_transitionable());
        assert!(!StyleProperty::Transition.is_transitionable());
        assert!(!StyleProperty::PointerEvents.is_transitionable());
    }

    #[test]
    fn test_property_names_parse_back() {
        assert_eq!("border-radius".parse::<StyleProperty>(), Ok(StyleProperty::BorderRadius));
        assert_eq!("Pointer-Events".parse::<StyleProperty>(), Ok(StyleProperty::PointerEvents));
        assert_eq!(
            "float".parse::<StyleProperty>(),
            Err(FlipError::InvalidStyleProperty("float".to_string()))
        );
    }

    #[test]
    fn test_computed_style_drops_control_properties() {
        let style = ComputedStyle::new()
            .with(StyleProperty::Opacity, "1")
            .with(StyleProperty::Position, "fixed");

        assert_eq!(style.len(), 1);
        assert_eq!(style.get(StyleProperty::Opacity), Some("1"));
        assert_eq!(style.get(StyleProperty::Position), None);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut live = ComputedStyle::new().with(StyleProperty::Color, "red");
        let snapshot = VisualSnapshot::new(BoundingBox::default(), live.clone());

        live.insert(StyleProperty::Color, "blue");
        assert_eq!(snapshot.style.get(StyleProperty::Color), Some("red"));
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = VisualSnapshot::new(
            BoundingBox::new(10.0, 20.0, 30.0, 40.0),
            ComputedStyle::new().with(StyleProperty::BorderRadius, "4px"),
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("border-radius"));

        let parsed: VisualSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
