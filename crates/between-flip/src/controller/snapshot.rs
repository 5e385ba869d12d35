//! First/last state capture around a command's mutation.

use crate::animation::transition::TransitionOptions;
use crate::animation::types::{NodeId, StyleProperty, VisualSnapshot};
use crate::host::Host;

/// Snapshots taken for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub first: VisualSnapshot,
    pub last: VisualSnapshot,
}

/// Measure `subject`, toggle `class` to its requested state, measure again,
/// and put the class back so the live DOM is unchanged.
pub fn capture_class_change<H: Host>(
    host: &mut H,
    subject: NodeId,
    class: &str,
    adding: bool,
) -> Capture {
    let first = host.measure(subject);

    let had = host.has_class(subject, class);
    let toggled = had != adding;
    if toggled {
        set_class(host, subject, class, adding);
    }
    let last = host.measure(subject);
    if toggled {
        set_class(host, subject, class, had);
    }

    Capture { first, last }
}

/// Measure the subject and the destination of a move/copy.
///
/// With `override_incoming_opacity` the captured destination opacity is
/// forced to `1`, since the live destination is hidden during the flight.
pub fn capture_handoff<H: Host>(
    host: &H,
    subject: NodeId,
    destination: NodeId,
    options: &TransitionOptions,
) -> Capture {
    let first = host.measure(subject);
    let mut last = host.measure(destination);
    if options.override_incoming_opacity {
        last.style.insert(StyleProperty::Opacity, "1");
    }
    Capture { first, last }
}

fn set_class<H: Host>(host: &mut H, node: NodeId, class: &str, present: bool) {
    if present {
        host.add_class(node, class);
    } else {
        host.remove_class(node, class);
    }
}
