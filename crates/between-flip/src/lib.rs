//! FLIP transitions for DOM-like element trees.
//!
//! A [`TransitionController`] is bound to one subject element and animates
//! four kinds of visual change: adding a class, removing a class, moving the
//! element onto another one and copying it onto another one. Each command
//! measures the first and last state, flies a fixed-position clone between
//! them, then commits the real change. Commands run strictly one after
//! another; `done` fires per command and `all_done` when the queue drains.
//!
//! Everything environment-specific sits behind the [`Host`] trait. The crate
//! ships [`headless::HeadlessDocument`] for tests and tools, and a `web-sys`
//! host behind the `web` feature.

pub mod animation;
pub mod controller;
pub mod error;
pub mod headless;
pub mod host;
#[cfg(feature = "web")]
pub mod web;

pub use animation::{
    BoundingBox, ComputedStyle, ControllerEvent, EasingFunction, EventKind, NodeId, OptionsOverride,
    StyleProperty, TransitionOptions, VisualSnapshot,
};
pub use controller::command::{CommandId, CommandKind};
pub use controller::state::StatusKind;
pub use controller::TransitionController;
pub use error::{FlipError, Result};
pub use headless::HeadlessDocument;
pub use host::Host;
