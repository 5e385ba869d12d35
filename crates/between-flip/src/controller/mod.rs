//! The transition controller: one subject, a FIFO of commands, at most one
//! clone in flight.
//!
//! # Architecture
//!
//! ```text
//! TransitionController<H: Host>
//!   ├── CommandQueue + Projection   (what is waiting, what it will leave behind)
//!   ├── Status                      (Idle | Transitioning(Flight) | Settling(Flight))
//!   ├── FrameTask slot              (the single pending continuation)
//!   └── Notifier                    (done / all_done)
//! ```
//!
//! Commands are executed one at a time. Execution captures the first and last
//! states, spawns the clone, hides the live elements and waits a frame before
//! writing the target style. The clone's transition end commits the mutation
//! (`Settling`); the following frame disposes of the clone, fires `done` and
//! either schedules the next command or fires `all_done`.

pub mod command;
pub mod driver;
pub mod snapshot;
pub mod state;

use tracing::{debug, error, trace, warn};

use crate::animation::events::{ControllerEvent, EventKind, Notifier};
use crate::animation::transition::{OptionsOverride, TransitionOptions};
use crate::animation::types::{NodeId, VisualSnapshot};
use crate::error::{FlipError, Result};
use crate::host::Host;

use command::{Command, CommandId, CommandKind, CommandQueue, Projection};
use snapshot::Capture;
use state::{Flight, FrameTask, Status, StatusKind};

/// Serializes visual transitions of one subject element.
///
/// Command methods return `Result<&mut Self>` so calls chain with `?`:
///
/// ```ignore
/// controller
///     .add_class("active", OptionsOverride::new())?
///     .move_to_element(slot, OptionsOverride::new().duration_ms(500))?
///     .on(EventKind::AllDone, |_| println!("settled"));
/// ```
#[derive(Debug)]
pub struct TransitionController<H: Host> {
    host: H,
    subject: NodeId,
    defaults: TransitionOptions,
    queue: CommandQueue,
    projection: Projection,
    status: Status,
    scheduled: Option<FrameTask>,
    notifier: Notifier,
    next_id: u64,
}

impl<H: Host> TransitionController<H> {
    /// Bind a controller to `subject` with default options.
    pub fn new(host: H, subject: NodeId) -> Self {
        Self::with_options(host, subject, OptionsOverride::default())
    }

    /// Bind a controller to `subject`, layering `options` over the defaults.
    pub fn with_options(host: H, subject: NodeId, options: OptionsOverride) -> Self {
        if !host.contains(subject) {
            error!("[TransitionController] subject {} is not a known element", subject);
        }
        Self {
            host,
            subject,
            defaults: TransitionOptions::default().merged(&options),
            queue: CommandQueue::new(),
            projection: Projection::new(subject),
            status: Status::Idle,
            scheduled: None,
            notifier: Notifier::new(),
            next_id: 1,
        }
    }

    pub fn add_class(&mut self, class: &str, options: OptionsOverride) -> Result<&mut Self> {
        validate_class(class)?;
        self.enqueue(CommandKind::AddClass(class.to_string()), &options)
    }

    pub fn remove_class(&mut self, class: &str, options: OptionsOverride) -> Result<&mut Self> {
        validate_class(class)?;
        self.enqueue(CommandKind::RemoveClass(class.to_string()), &options)
    }

    /// Fly the subject onto `target`; once settled `target` is the subject.
    pub fn move_to_element(&mut self, target: NodeId, options: OptionsOverride) -> Result<&mut Self> {
        self.validate_node(target)?;
        self.enqueue(CommandKind::MoveToElement(target), &options)
    }

    /// Fly a copy of the subject onto `target`; the subject stays bound.
    pub fn copy_to_element(&mut self, target: NodeId, options: OptionsOverride) -> Result<&mut Self> {
        self.validate_node(target)?;
        self.enqueue(CommandKind::CopyToElement(target), &options)
    }

    /// Register a listener for `done` or `all_done`.
    pub fn on(&mut self, kind: EventKind, listener: impl FnMut(&ControllerEvent) + 'static) -> &mut Self {
        self.notifier.subscribe(kind, listener);
        self
    }

    /// Keep emitted events for [`TransitionController::drain_events`].
    pub fn record_events(&mut self, enabled: bool) -> &mut Self {
        self.notifier.set_recording(enabled);
        self
    }

    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        self.notifier.drain()
    }

    /// Host callback: the frame requested through [`Host::request_frame`] arrived.
    pub fn frame(&mut self) {
        let Some(task) = self.scheduled.take() else {
            trace!("frame with nothing scheduled");
            return;
        };
        trace!("frame task {:?} in {:?}", task, self.status.kind());
        match task {
            FrameTask::ApplyTarget => self.apply_target(),
            FrameTask::Dispose => self.dispose(),
            FrameTask::ExecuteNext => self.execute_next(),
        }
    }

    /// Host callback: a transition ended on `node`.
    ///
    /// Only the first end signal of the in-flight clone after its target style
    /// was applied counts; repeats (one per transitioned property) and signals
    /// from other nodes are ignored.
    pub fn transition_ended(&mut self, node: NodeId) {
        let current = self.scheduled.is_none()
            && matches!(&self.status, Status::Transitioning(flight) if flight.clone == node);
        if current {
            self.complete();
        } else {
            trace!("ignoring transition end on {} in {:?}", node, self.status.kind());
        }
    }

    /// Element currently represented by this controller.
    pub fn subject(&self) -> NodeId {
        self.subject
    }

    pub fn status(&self) -> StatusKind {
        self.status.kind()
    }

    /// Number of commands waiting behind the current one.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is in flight, queued or scheduled.
    pub fn is_quiescent(&self) -> bool {
        self.status.is_idle() && self.queue.is_empty() && self.scheduled.is_none()
    }

    pub fn defaults(&self) -> &TransitionOptions {
        &self.defaults
    }

    /// Clone of the executing command, if any.
    pub fn in_flight_clone(&self) -> Option<NodeId> {
        self.status.flight().map(|flight| flight.clone)
    }

    /// First and last state of the executing command.
    pub fn snapshots(&self) -> Option<(&VisualSnapshot, &VisualSnapshot)> {
        self.status.flight().map(|flight| (&flight.first, &flight.last))
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn validate_node(&self, node: NodeId) -> Result<()> {
        if self.host.contains(node) {
            Ok(())
        } else {
            Err(FlipError::UnknownNode(node))
        }
    }

    fn enqueue(&mut self, kind: CommandKind, options: &OptionsOverride) -> Result<&mut Self> {
        if !self.host.contains(self.subject) {
            error!(
                "[TransitionController] no subject element bound ({}); ignoring {:?}",
                self.subject, kind
            );
            return Ok(self);
        }
        if self.is_noop(&kind) {
            trace!("skipping no-op {:?} on {}", kind, self.projection.subject());
            return Ok(self);
        }

        let command = Command {
            id: CommandId(self.next_id),
            kind,
            options: self.defaults.merged(options),
        };
        self.next_id += 1;
        self.projection.apply(&command.kind);

        let start_now = self.queue.is_empty() && self.status.is_idle();
        debug!("queued {} {:?} (start now: {})", command.id, command.kind, start_now);
        self.queue.push(command);
        if start_now {
            self.execute_next();
        }
        Ok(self)
    }

    fn is_noop(&self, kind: &CommandKind) -> bool {
        let subject = self.projection.subject();
        match kind {
            CommandKind::AddClass(class) => self.projected_has_class(subject, class),
            CommandKind::RemoveClass(class) => !self.projected_has_class(subject, class),
            CommandKind::MoveToElement(target) | CommandKind::CopyToElement(target) => {
                *target == subject
            }
        }
    }

    fn projected_has_class(&self, node: NodeId, class: &str) -> bool {
        self.projection
            .class_state(node, class)
            .unwrap_or_else(|| self.host.has_class(node, class))
    }

    fn schedule(&mut self, task: FrameTask) {
        debug_assert!(self.scheduled.is_none(), "frame slot already holds {:?}", self.scheduled);
        self.scheduled = Some(task);
        self.host.request_frame();
    }

    fn execute_next(&mut self) {
        debug_assert!(self.status.is_idle());
        let Some(command) = self.queue.pop() else {
            return;
        };
        let source = self.subject;

        if let Some(destination) = command.kind.destination() {
            if !self.host.contains(destination) {
                warn!("{}: destination {} vanished before execution; skipping", command.id, destination);
                self.finish(command);
                return;
            }
        }

        let Capture { first, last } = match &command.kind {
            CommandKind::AddClass(class) => {
                snapshot::capture_class_change(&mut self.host, source, class, true)
            }
            CommandKind::RemoveClass(class) => {
                snapshot::capture_class_change(&mut self.host, source, class, false)
            }
            CommandKind::MoveToElement(destination) | CommandKind::CopyToElement(destination) => {
                snapshot::capture_handoff(&self.host, source, *destination, &command.options)
            }
        };

        let Some(clone) = driver::spawn_clone(&mut self.host, source, &first, &command.options) else {
            warn!("{}: could not clone subject {}; skipping", command.id, source);
            self.finish(command);
            return;
        };
        let saved = driver::hide_live(&mut self.host, source, &command.kind, &command.options);
        debug!(
            "executing {} {:?}: {:?} -> {:?} via clone {}",
            command.id, command.kind, first.bounds, last.bounds, clone
        );

        self.status = Status::Transitioning(Flight {
            command,
            source,
            first,
            last,
            clone,
            saved,
        });
        self.schedule(FrameTask::ApplyTarget);
    }

    fn apply_target(&mut self) {
        let Status::Transitioning(flight) = &self.status else {
            return;
        };
        let written = driver::apply_target(&mut self.host, flight.clone, &flight.last);
        if written == 0 || flight.command.options.duration_ms == 0 {
            debug!(
                "{}: no transition will run ({} properties, {}ms); completing now",
                flight.command.id, written, flight.command.options.duration_ms
            );
            self.complete();
        }
    }

    /// Commit the mutation to the live elements and enter `Settling`.
    fn complete(&mut self) {
        let Status::Transitioning(flight) = std::mem::take(&mut self.status) else {
            return;
        };
        self.host.unwatch_transition_end(flight.clone);

        match &flight.command.kind {
            CommandKind::AddClass(class) => self.host.add_class(flight.source, class),
            CommandKind::RemoveClass(class) => self.host.remove_class(flight.source, class),
            CommandKind::MoveToElement(destination) => self.subject = *destination,
            CommandKind::CopyToElement(_) => {}
        }
        driver::restore(&mut self.host, &flight.saved);
        debug!("{} committed; subject is {}", flight.command.id, self.subject);

        self.status = Status::Settling(flight);
        self.schedule(FrameTask::Dispose);
    }

    fn dispose(&mut self) {
        let Status::Settling(flight) = std::mem::take(&mut self.status) else {
            return;
        };
        driver::dispose_clone(&mut self.host, flight.clone);
        self.finish(flight.command);
    }

    fn finish(&mut self, command: Command) {
        debug!("{} done", command.id);
        self.notifier.emit(ControllerEvent::Done {
            command_id: command.id,
            command: command.kind,
        });
        if self.queue.is_empty() {
            self.projection.reset(self.subject);
            self.notifier.emit(ControllerEvent::AllDone);
        } else {
            self.schedule(FrameTask::ExecuteNext);
        }
    }
}

fn validate_class(class: &str) -> Result<()> {
    if class.is_empty() || class.chars().any(char::is_whitespace) {
        return Err(FlipError::InvalidClassName(class.to_string()));
    }
    Ok(())
}
