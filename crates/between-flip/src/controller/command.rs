//! Commands and the FIFO queue that holds them until execution.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::animation::transition::TransitionOptions;
use crate::animation::types::NodeId;

/// Per-controller command sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd-{}", self.0)
    }
}

/// What a command does to the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    AddClass(String),
    RemoveClass(String),
    /// Fly the subject to the destination; the destination becomes the subject.
    MoveToElement(NodeId),
    /// Fly a copy of the subject to the destination; the subject stays.
    CopyToElement(NodeId),
}

impl CommandKind {
    pub fn is_class_change(&self) -> bool {
        matches!(self, Self::AddClass(_) | Self::RemoveClass(_))
    }

    /// Destination element for move/copy.
    pub fn destination(&self) -> Option<NodeId> {
        match self {
            Self::MoveToElement(node) | Self::CopyToElement(node) => Some(*node),
            _ => None,
        }
    }
}

/// One requested transition step with its resolved options.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: CommandId,
    pub kind: CommandKind,
    pub options: TransitionOptions,
}

/// Pending commands in submission order.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    pub fn pop(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}

/// State the subject will be in once every queued command has committed.
///
/// No-op checks for new commands run against this projection, not the live
/// DOM, so a command queued behind an in-flight one sees its predecessors'
/// effects. The projection is reset to the live state whenever the queue
/// drains.
#[derive(Debug)]
pub struct Projection {
    subject: NodeId,
    classes: HashMap<(NodeId, String), bool>,
}

impl Projection {
    pub fn new(subject: NodeId) -> Self {
        Self {
            subject,
            classes: HashMap::new(),
        }
    }

    pub fn subject(&self) -> NodeId {
        self.subject
    }

    /// Projected membership of `class` on `node`, if a queued command decides it.
    pub fn class_state(&self, node: NodeId, class: &str) -> Option<bool> {
        self.classes.get(&(node, class.to_string())).copied()
    }

    /// Record the effect of a newly enqueued command.
    pub fn apply(&mut self, kind: &CommandKind) {
        match kind {
            CommandKind::AddClass(class) => {
                self.classes.insert((self.subject, class.clone()), true);
            }
            CommandKind::RemoveClass(class) => {
                self.classes.insert((self.subject, class.clone()), false);
            }
            CommandKind::MoveToElement(node) => self.subject = *node,
            CommandKind::CopyToElement(_) => {}
        }
    }

    /// Reset to the live state once nothing is queued or in flight.
    pub fn reset(&mut self, subject: NodeId) {
        self.subject = subject;
        self.classes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(id: u64, kind: CommandKind) -> Command {
        Command {
            id: CommandId(id),
            kind,
            options: TransitionOptions::default(),
        }
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = CommandQueue::new();
        queue.push(command(1, CommandKind::AddClass("a".into())));
        queue.push(command(2, CommandKind::MoveToElement(NodeId(9))));
        queue.push(command(3, CommandKind::RemoveClass("a".into())));

        assert_eq!(queue.len(), 3);
        let ids: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_kind_helpers() {
        assert!(CommandKind::AddClass("x".into()).is_class_change());
        assert!(!CommandKind::CopyToElement(NodeId(1)).is_class_change());
        assert_eq!(CommandKind::CopyToElement(NodeId(4)).destination(), Some(NodeId(4)));
        assert_eq!(CommandKind::RemoveClass("x".into()).destination(), None);
    }

    #[test]
    fn test_projection_follows_moves() {
        let mut projection = Projection::new(NodeId(1));
        projection.apply(&CommandKind::AddClass("active".into()));
        projection.apply(&CommandKind::MoveToElement(NodeId(2)));
        projection.apply(&CommandKind::RemoveClass("active".into()));

        assert_eq!(projection.subject(), NodeId(2));
        assert_eq!(projection.class_state(NodeId(1), "active"), Some(true));
        assert_eq!(projection.class_state(NodeId(2), "active"), Some(false));
        assert_eq!(projection.class_state(NodeId(2), "other"), None);

        projection.reset(NodeId(2));
        assert_eq!(projection.class_state(NodeId(1), "active"), None);
    }

    #[test]
    fn test_copy_keeps_projected_subject() {
        let mut projection = Projection::new(NodeId(1));
        projection.apply(&CommandKind::CopyToElement(NodeId(5)));
        assert_eq!(projection.subject(), NodeId(1));
    }
}
