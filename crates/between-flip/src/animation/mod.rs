//! Value types, timing and events shared by the controller and its hosts.
//!
//! This module provides:
//! - **Types**: Node handles, bounding boxes, style properties and snapshots
//! - **Easing Functions**: Standard CSS timing functions
//! - **Transitions**: Resolved options plus per-property runtime state
//! - **Events**: `done` / `all_done` notifications
//!
//! # Architecture
//!
//! ```text
//! TransitionOptions  <- OptionsOverride (constructor) <- OptionsOverride (call)
//!        │
//!        └── transition_css() ──> clone's inline `transition`
//!
//! ActiveTransition
//!   └── sampled by the headless host through Interpolate
//! ```

pub mod easing;
pub mod events;
pub mod interpolate;
pub mod transition;
pub mod types;

pub use easing::{EasingFunction, StepPosition};
pub use events::{ControllerEvent, EventKind, EventQueue, Notifier};
pub use interpolate::{interpolate_css, CssNumber, Interpolate};
pub use transition::{ActiveTransition, OptionsOverride, TransitionOptions};
pub use types::{BoundingBox, ComputedStyle, NodeId, StyleProperty, VisualSnapshot};
