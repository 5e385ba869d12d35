//! The collaborator boundary: measurement, DOM mutation and timing.
//!
//! A [`Host`] owns the real elements; the controller only holds [`NodeId`]s.
//! Timing is inverted: instead of handing callbacks to the host, the
//! controller asks for a frame or a transition-end subscription and the
//! host's own loop calls back into the controller:
//!
//! ```text
//! host.request_frame()              -> later: controller.frame()
//! host.watch_transition_end(clone)  -> later: controller.transition_ended(clone)
//! ```

use crate::animation::types::{NodeId, StyleProperty, VisualSnapshot};

/// Capabilities the transition controller needs from its environment.
pub trait Host {
    /// Whether `node` refers to a live element.
    fn contains(&self, node: NodeId) -> bool;

    /// Bounding box and transitionable computed style of `node`, as copies.
    fn measure(&self, node: NodeId) -> VisualSnapshot;

    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Whether the element's only child is a text node.
    fn has_single_text_child(&self, node: NodeId) -> bool;

    /// Clone `node` (with descendants when `deep`) and return the detached copy,
    /// or `None` when the element could not be cloned.
    fn clone_node(&mut self, node: NodeId, deep: bool) -> Option<NodeId>;

    fn append_to_body(&mut self, node: NodeId);

    /// Detach and forget `node`.
    fn remove_node(&mut self, node: NodeId);

    /// Inline (not computed) value of a property.
    fn inline_style(&self, node: NodeId, property: StyleProperty) -> Option<String>;
    fn set_style(&mut self, node: NodeId, property: StyleProperty, value: &str);
    fn remove_style(&mut self, node: NodeId, property: StyleProperty);

    /// Ask for exactly one `frame()` call after the next layout pass.
    fn request_frame(&mut self);

    /// Start reporting transition-end signals on `node`.
    fn watch_transition_end(&mut self, node: NodeId);
    fn unwatch_transition_end(&mut self, node: NodeId);
}
