//! Controller lifecycle events.
//!
//! Two events exist: `done` after each command settles and `all_done` when
//! the queue drains. Listeners are invoked synchronously, per kind, in
//! registration order:
//!
//! ```ignore
//! controller
//!     .on(EventKind::Done, |event| println!("settled: {:?}", event))
//!     .on(EventKind::AllDone, |_| println!("queue drained"));
//! ```
//!
//! Hosts that poll instead of subscribing can turn on recording and drain
//! the [`EventQueue`] after each frame.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::controller::command::{CommandId, CommandKind};

/// Which event a listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Done,
    AllDone,
}

/// Event emitted by the notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// A command settled: the clone is gone and the live element is updated.
    Done {
        command_id: CommandId,
        command: CommandKind,
    },
    /// The queue became empty after a settle.
    AllDone,
}

impl ControllerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Done { .. } => EventKind::Done,
            Self::AllDone => EventKind::AllDone,
        }
    }
}

/// Queue of emitted events for polling hosts.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<ControllerEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ControllerEvent) {
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<ControllerEvent> {
        self.events.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = ControllerEvent> + '_ {
        self.events.drain(..)
    }
}

type Listener = Box<dyn FnMut(&ControllerEvent)>;

/// Fan-out of controller events to registered listeners.
#[derive(Default)]
pub struct Notifier {
    listeners: Vec<(EventKind, Listener)>,
    recorded: Option<EventQueue>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .field("recorded", &self.recorded)
            .finish()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listener panics are not caught.
    pub fn subscribe(&mut self, kind: EventKind, listener: impl FnMut(&ControllerEvent) + 'static) {
        self.listeners.push((kind, Box::new(listener)));
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Start or stop keeping emitted events for [`Notifier::drain`].
    pub fn set_recording(&mut self, enabled: bool) {
        match (enabled, self.recorded.is_some()) {
            (true, false) => self.recorded = Some(EventQueue::new()),
            (false, true) => self.recorded = None,
            _ => {}
        }
    }

    pub fn emit(&mut self, event: ControllerEvent) {
        let kind = event.kind();
        for (_, listener) in self.listeners.iter_mut().filter(|(k, _)| *k == kind) {
            listener(&event);
        }
        if let Some(queue) = self.recorded.as_mut() {
            queue.push(event);
        }
    }

    /// Take every recorded event. Empty unless recording is enabled.
    pub fn drain(&mut self) -> Vec<ControllerEvent> {
        self.recorded
            .as_mut()
            .map(|queue| queue.drain().collect())
            .unwrap_or_default()
    }
}
