//! Controller status and the single frame-continuation slot.
//!
//! ```text
//! Idle --execute--> Transitioning --transition end--> Settling --frame(Dispose)--> Idle
//!   ^                                                                               |
//!   +------------------------- frame(ExecuteNext) <----- queue not empty -----------+
//! ```

use serde::{Deserialize, Serialize};

use super::command::Command;
use crate::animation::types::{NodeId, StyleProperty, VisualSnapshot};

/// An inline style value to put back at commit. `None` means the property
/// had no inline value and is removed.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedStyle {
    pub node: NodeId,
    pub property: StyleProperty,
    pub value: Option<String>,
}

/// Everything owned by the command currently executing.
#[derive(Debug)]
pub struct Flight {
    pub command: Command,
    /// Subject at the moment execution started.
    pub source: NodeId,
    pub first: VisualSnapshot,
    pub last: VisualSnapshot,
    pub clone: NodeId,
    pub saved: Vec<SavedStyle>,
}

/// Controller status. A flight exists exactly while not idle.
#[derive(Debug, Default)]
pub enum Status {
    #[default]
    Idle,
    /// The clone is animating toward the last state.
    Transitioning(Flight),
    /// The mutation is committed; the clone waits for disposal on the next frame.
    Settling(Flight),
}

impl Status {
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Idle => StatusKind::Idle,
            Self::Transitioning(_) => StatusKind::Transitioning,
            Self::Settling(_) => StatusKind::Settling,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn flight(&self) -> Option<&Flight> {
        match self {
            Self::Idle => None,
            Self::Transitioning(flight) | Self::Settling(flight) => Some(flight),
        }
    }
}

/// Data-free view of [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Idle,
    Transitioning,
    Settling,
}

/// Work deferred to the next host frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTask {
    /// Write the last state onto the clone once its start style is laid out.
    ApplyTarget,
    /// Remove the clone, fire `done`, continue or fire `all_done`.
    Dispose,
    /// Start the next queued command.
    ExecuteNext,
}
