//! Clone construction and the style writes that drive it.

use tracing::trace;

use super::command::CommandKind;
use super::state::SavedStyle;
use crate::animation::transition::TransitionOptions;
use crate::animation::types::{px, NodeId, StyleProperty, VisualSnapshot};
use crate::host::Host;

/// Clone the subject and pin it over the first state's box.
///
/// Only a lone text child is cloned along with the element; anything richer
/// would need its own positioning. `None` when the host could not clone.
pub fn spawn_clone<H: Host>(
    host: &mut H,
    subject: NodeId,
    first: &VisualSnapshot,
    options: &TransitionOptions,
) -> Option<NodeId> {
    let deep = host.has_single_text_child(subject);
    let clone = host.clone_node(subject, deep)?;

    host.set_style(clone, StyleProperty::Position, "fixed");
    host.set_style(clone, StyleProperty::Top, &px(first.bounds.top));
    host.set_style(clone, StyleProperty::Left, &px(first.bounds.left));
    // bounding boxes exclude margin
    host.set_style(clone, StyleProperty::Margin, "0");
    host.set_style(clone, StyleProperty::Transition, &options.transition_css());

    host.append_to_body(clone);
    host.watch_transition_end(clone);
    trace!("spawned clone {} of {} (deep: {})", clone, subject, deep);
    Some(clone)
}

/// Hide the live elements for the duration of the flight.
///
/// Returns the inline values to restore at commit.
pub fn hide_live<H: Host>(
    host: &mut H,
    subject: NodeId,
    kind: &CommandKind,
    options: &TransitionOptions,
) -> Vec<SavedStyle> {
    let mut saved = Vec::new();
    for (property, value) in [
        (StyleProperty::Transition, "none"),
        (StyleProperty::Opacity, "0"),
        (StyleProperty::PointerEvents, "none"),
    ] {
        save_and_set(host, &mut saved, subject, property, value);
    }

    if let Some(destination) = kind.destination() {
        if options.override_incoming_opacity {
            save_and_set(host, &mut saved, destination, StyleProperty::Transition, "none");
            save_and_set(host, &mut saved, destination, StyleProperty::Opacity, "0");
        }
    }
    saved
}

fn save_and_set<H: Host>(
    host: &mut H,
    saved: &mut Vec<SavedStyle>,
    node: NodeId,
    property: StyleProperty,
    value: &str,
) {
    saved.push(SavedStyle {
        node,
        property,
        value: host.inline_style(node, property),
    });
    host.set_style(node, property, value);
}

/// Target declarations for the clone: the last style with `top`/`left` taken
/// from the last box.
pub fn target_style(last: &VisualSnapshot) -> Vec<(StyleProperty, String)> {
    let mut target: Vec<(StyleProperty, String)> = last
        .style
        .iter()
        .filter(|(property, _)| !matches!(property, StyleProperty::Top | StyleProperty::Left))
        .map(|(property, value)| (property, value.to_string()))
        .collect();
    target.push((StyleProperty::Top, px(last.bounds.top)));
    target.push((StyleProperty::Left, px(last.bounds.left)));
    target
}

/// Write the target style onto the clone, skipping values it already has.
///
/// Returns how many properties were written. The count is of writes handed to
/// the host; zero means no transition will start and no end signal will
/// arrive, provided the host applies every write it is given.
pub fn apply_target<H: Host>(host: &mut H, clone: NodeId, last: &VisualSnapshot) -> usize {
    let current = host.measure(clone);
    let mut written = 0;
    for (property, value) in target_style(last) {
        if current.style.get(property) != Some(value.as_str()) {
            host.set_style(clone, property, &value);
            written += 1;
        }
    }
    trace!("clone {}: {} properties differ from target", clone, written);
    written
}

/// Put saved inline values back.
pub fn restore<H: Host>(host: &mut H, saved: &[SavedStyle]) {
    // reverse order so the transition override is lifted last
    for entry in saved.iter().rev() {
        match &entry.value {
            Some(value) => host.set_style(entry.node, entry.property, value),
            None => host.remove_style(entry.node, entry.property),
        }
    }
}

pub fn dispose_clone<H: Host>(host: &mut H, clone: NodeId) {
    host.unwatch_transition_end(clone);
    host.remove_node(clone);
}
