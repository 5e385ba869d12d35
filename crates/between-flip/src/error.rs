//! Error types for the transition controller.

use thiserror::Error;

use crate::animation::types::NodeId;

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, FlipError>;

/// Errors that can occur when issuing commands or driving a host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlipError {
    /// Class commands need a non-empty class name without whitespace.
    #[error("invalid class name: {0:?}")]
    InvalidClassName(String),

    /// The host does not know the referenced element.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Easing text could not be parsed as a CSS timing function.
    #[error("invalid easing: {0:?}")]
    InvalidEasing(String),

    /// Style property name outside the supported set.
    #[error("unsupported style property: {0:?}")]
    InvalidStyleProperty(String),

    /// A driven controller did not reach idle within the frame budget.
    #[error("controller still busy after {frames} frames")]
    Stalled { frames: u32 },

    /// Host-specific failure.
    #[error("host error: {0}")]
    Host(String),
}
