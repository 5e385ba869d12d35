//! Transition timing configuration and in-flight transition state.
//!
//! This module provides:
//! - `TransitionOptions`: Resolved per-command configuration
//! - `OptionsOverride`: Partial configuration layered over defaults
//! - `ActiveTransition`: Runtime state for one property transitioning on a node
//!
//! Options resolve in three layers, later layers winning:
//!
//! ```
//! use between_flip::animation::transition::{OptionsOverride, TransitionOptions};
//! use between_flip::animation::easing::EasingFunction;
//!
//! let controller = OptionsOverride::new().duration_ms(500);
//! let call = OptionsOverride::new().easing(EasingFunction::Linear);
//!
//! let resolved = TransitionOptions::default().merged(&controller).merged(&call);
//! assert_eq!(resolved.duration_ms, 500);
//! assert_eq!(resolved.easing, EasingFunction::Linear);
//! assert_eq!(resolved.transition_css(), "all 500ms linear");
//! ```

use between_config::TransitionDefaults;
use serde::{Deserialize, Serialize};

use super::easing::EasingFunction;
use super::interpolate::interpolate_css;
use super::types::{NodeId, StyleProperty};
use crate::error::Result;

/// Fully resolved configuration carried by a command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionOptions {
    /// Duration of the clone's flight in milliseconds.
    pub duration_ms: u32,
    /// Timing function of the flight.
    pub easing: EasingFunction,
    /// For move/copy: force the captured destination opacity to 1 and hide
    /// the live destination until commit.
    pub override_incoming_opacity: bool,
}

impl Default for TransitionOptions {
    fn default() -> Self {
        Self {
            duration_ms: 300,
            easing: EasingFunction::Ease,
            override_incoming_opacity: true,
        }
    }
}

impl TransitionOptions {
    /// Layer an override on top of these options.
    pub fn merged(&self, layer: &OptionsOverride) -> Self {
        Self {
            duration_ms: layer.duration_ms.unwrap_or(self.duration_ms),
            easing: layer.easing.unwrap_or(self.easing),
            override_incoming_opacity: layer
                .override_incoming_opacity
                .unwrap_or(self.override_incoming_opacity),
        }
    }

    /// CSS `transition` declaration for the clone.
    pub fn transition_css(&self) -> String {
        format!("all {}ms {}", self.duration_ms, self.easing)
    }
}

/// Partial options; unset fields fall through to the layer below.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsOverride {
    pub duration_ms: Option<u32>,
    pub easing: Option<EasingFunction>,
    pub override_incoming_opacity: Option<bool>,
}

impl OptionsOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration_ms(mut self, duration_ms: u32) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn easing(mut self, easing: EasingFunction) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn override_incoming_opacity(mut self, enabled: bool) -> Self {
        self.override_incoming_opacity = Some(enabled);
        self
    }

    /// Build the constructor layer from loaded configuration.
    pub fn from_config(defaults: &TransitionDefaults) -> Result<Self> {
        Ok(Self {
            duration_ms: Some(defaults.duration_ms),
            easing: Some(defaults.easing.parse()?),
            override_incoming_opacity: Some(defaults.override_incoming_opacity),
        })
    }
}

/// A single property transitioning on a node.
///
/// Hosts that run transitions themselves (the headless document) track one of
/// these per changed property and report its end like a `transitionend` event.
#[derive(Debug, Clone)]
pub struct ActiveTransition {
    pub node: NodeId,
    pub property: StyleProperty,
    pub from_value: String,
    pub to_value: String,
    pub duration_ms: f32,
    pub elapsed_ms: f32,
    pub easing: EasingFunction,
}

impl ActiveTransition {
    pub fn new(
        node: NodeId,
        property: StyleProperty,
        from_value: impl Into<String>,
        to_value: impl Into<String>,
        duration_ms: f32,
        easing: EasingFunction,
    ) -> Self {
        Self {
            node,
            property,
            from_value: from_value.into(),
            to_value: to_value.into(),
            duration_ms,
            elapsed_ms: 0.0,
            easing,
        }
    }

    /// Linear progress in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.duration_ms > 0.0 {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Current interpolated value.
    pub fn current_value(&self) -> String {
        let eased = self.easing.evaluate(self.progress());
        interpolate_css(&self.from_value, &self.to_value, eased)
    }

    /// Advance time. Returns `true` while the transition is still running.
    pub fn update(&mut self, delta_ms: f32) -> bool {
        self.elapsed_ms += delta_ms;
        self.elapsed_ms < self.duration_ms
    }

    /// Point the transition at a new value, starting from where it is now.
    pub fn retarget(&mut self, to_value: impl Into<String>, duration_ms: f32, easing: EasingFunction) {
        self.from_value = self.current_value();
        self.to_value = to_value.into();
        self.duration_ms = duration_ms;
        self.elapsed_ms = 0.0;
        self.easing = easing;
    }
}
