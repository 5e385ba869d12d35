//! An in-memory document that implements [`Host`] without a browser.
//!
//! Elements carry classes, a base style, an inline style and a layout box.
//! Computed style is layered the way a cascade would be:
//!
//! ```text
//! base  <  class rules (in class order)  <  inline  <  running transitions
//! ```
//!
//! Inline writes of a transitionable property on an element whose
//! `transition` declaration has a positive duration start an
//! [`ActiveTransition`]; [`HeadlessDocument::advance`] moves time forward and
//! queues one transition-end signal per finished property, like
//! `transitionend`. Elements appended since the last layout pass (see
//! [`HeadlessDocument::take_frame_requests`]) never start transitions.
//!
//! `TransitionController<HeadlessDocument>` gets a small driver loop:
//!
//! ```
//! use between_flip::animation::types::BoundingBox;
//! use between_flip::headless::HeadlessDocument;
//! use between_flip::{OptionsOverride, TransitionController};
//!
//! let mut doc = HeadlessDocument::new();
//! let a = doc.create_element(BoundingBox::new(0.0, 0.0, 100.0, 40.0));
//! let b = doc.create_element(BoundingBox::new(100.0, 50.0, 100.0, 40.0));
//!
//! let mut controller = TransitionController::new(doc, a);
//! controller.move_to_element(b, OptionsOverride::new()).unwrap();
//! controller.run_until_idle(16.0, 100).unwrap();
//! assert_eq!(controller.subject(), b);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use tracing::trace;

use crate::animation::easing::EasingFunction;
use crate::animation::transition::ActiveTransition;
use crate::animation::types::{
    parse_px, px, BoundingBox, ComputedStyle, NodeId, StyleProperty, VisualSnapshot,
};
use crate::controller::TransitionController;
use crate::error::{FlipError, Result};
use crate::host::Host;

#[derive(Debug, Clone, Default)]
struct Element {
    classes: Vec<String>,
    base: BTreeMap<StyleProperty, String>,
    inline: BTreeMap<StyleProperty, String>,
    layout: BoundingBox,
    text: Option<String>,
    children: Vec<NodeId>,
    attached: bool,
    clone_of: Option<NodeId>,
}

/// Headless [`Host`] with simulated layout, cascade and transitions.
#[derive(Debug, Default)]
pub struct HeadlessDocument {
    elements: HashMap<NodeId, Element>,
    rules: HashMap<String, ComputedStyle>,
    body: Vec<NodeId>,
    fresh: HashSet<NodeId>,
    watched: HashSet<NodeId>,
    transitions: HashMap<(NodeId, StyleProperty), ActiveTransition>,
    transition_ends: VecDeque<NodeId>,
    frame_requests: u32,
    next_id: u64,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Create an attached element laid out at `bounds`.
    pub fn create_element(&mut self, bounds: BoundingBox) -> NodeId {
        let id = self.allocate();
        let mut element = Element {
            layout: bounds,
            attached: true,
            ..Element::default()
        };
        element.base.insert(StyleProperty::Width, px(bounds.width));
        element.base.insert(StyleProperty::Height, px(bounds.height));
        element.base.insert(StyleProperty::Top, "auto".to_string());
        element.base.insert(StyleProperty::Left, "auto".to_string());
        self.elements.insert(id, element);
        id
    }

    /// Register a class rule. Later calls for the same class replace it.
    pub fn add_rule(&mut self, class: &str, style: ComputedStyle) {
        self.rules.insert(class.to_string(), style);
    }

    /// Set a stylesheet-level value on one element.
    pub fn set_base_style(&mut self, node: NodeId, property: StyleProperty, value: &str) {
        if let Some(element) = self.elements.get_mut(&node) {
            element.base.insert(property, value.to_string());
        }
    }

    /// Move the element's layout box (as if surrounding content reflowed).
    pub fn set_layout(&mut self, node: NodeId, bounds: BoundingBox) {
        if let Some(element) = self.elements.get_mut(&node) {
            element.layout = bounds;
        }
    }

    /// Give the element a single text child.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(element) = self.elements.get_mut(&node) {
            element.text = Some(text.to_string());
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let Some(attached) = self.elements.get(&parent).map(|p| p.attached) else {
            return;
        };
        if let Some(element) = self.elements.get_mut(&child) {
            element.attached = attached;
        }
        if let Some(element) = self.elements.get_mut(&parent) {
            element.children.push(child);
        }
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.elements.get(&node).is_some_and(|e| e.attached)
    }

    pub fn is_watched(&self, node: NodeId) -> bool {
        self.watched.contains(&node)
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.elements.get(&node).and_then(|e| e.text.as_deref())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.elements
            .get(&node)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    /// Attached clones, in append order.
    pub fn attached_clones(&self) -> Vec<NodeId> {
        self.body
            .iter()
            .copied()
            .filter(|node| self.elements.get(node).is_some_and(|e| e.clone_of.is_some()))
            .collect()
    }

    /// Element the given clone was made from.
    pub fn clone_source(&self, node: NodeId) -> Option<NodeId> {
        self.elements.get(&node).and_then(|e| e.clone_of)
    }

    /// Number of attached elements, clones included.
    pub fn attached_count(&self) -> usize {
        self.elements.values().filter(|e| e.attached).count()
    }

    /// Frames requested since the last [`HeadlessDocument::take_frame_requests`].
    pub fn frame_requests(&self) -> u32 {
        self.frame_requests
    }

    /// Run a layout pass: freshly appended elements now transition normally.
    /// Returns how many frame callbacks are owed.
    pub fn take_frame_requests(&mut self) -> u32 {
        self.fresh.clear();
        std::mem::take(&mut self.frame_requests)
    }

    /// Advance all running transitions by `delta_ms`.
    ///
    /// Finished transitions on watched, attached elements queue an end signal.
    pub fn advance(&mut self, delta_ms: f32) {
        let mut finished = Vec::new();
        for (key, transition) in self.transitions.iter_mut() {
            if !transition.update(delta_ms) {
                finished.push(*key);
            }
        }
        finished.sort();
        for key in finished {
            self.transitions.remove(&key);
            let (node, property) = key;
            if self.is_watched(node) && self.is_attached(node) {
                trace!("transition end on {} ({})", node, property);
                self.transition_ends.push_back(node);
            }
        }
    }

    pub fn pop_transition_end(&mut self) -> Option<NodeId> {
        self.transition_ends.pop_front()
    }

    /// Queue an end signal by hand, e.g. a stray one from another element.
    pub fn push_transition_end(&mut self, node: NodeId) {
        self.transition_ends.push_back(node);
    }

    pub fn is_animating(&self, node: NodeId) -> bool {
        self.transitions.keys().any(|(n, _)| *n == node)
    }

    /// Current computed value, including running transitions.
    pub fn computed(&self, node: NodeId, property: StyleProperty) -> Option<String> {
        if let Some(transition) = self.transitions.get(&(node, property)) {
            return Some(transition.current_value());
        }
        self.resolve(node).remove(&property)
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Cascade without transitions.
    fn resolve(&self, node: NodeId) -> BTreeMap<StyleProperty, String> {
        let Some(element) = self.elements.get(&node) else {
            return BTreeMap::new();
        };
        let mut style = element.base.clone();
        for class in &element.classes {
            if let Some(rule) = self.rules.get(class) {
                for (property, value) in rule.iter() {
                    style.insert(property, value.to_string());
                }
            }
        }
        style.extend(element.inline.iter().map(|(p, v)| (*p, v.clone())));
        style
    }

    fn transition_timing(&self, node: NodeId) -> Option<(f32, EasingFunction)> {
        let declaration = self.resolve(node).remove(&StyleProperty::Transition)?;
        parse_transition(&declaration)
    }

    fn style_changed(&mut self, node: NodeId, property: StyleProperty, before: Option<String>) {
        if !property.is_transitionable() {
            return;
        }
        let key = (node, property);
        let after = self.resolve(node).remove(&property);
        let timing = if self.is_attached(node) && !self.fresh.contains(&node) {
            self.transition_timing(node).filter(|(duration, _)| *duration > 0.0)
        } else {
            None
        };

        match (before, after, timing) {
            (Some(from), Some(to), Some((duration, easing))) if from != to => {
                if let Some(running) = self.transitions.get_mut(&key) {
                    running.retarget(to, duration, easing);
                } else {
                    trace!("{} {}: {} -> {} over {}ms", node, property, from, to, duration);
                    self.transitions
                        .insert(key, ActiveTransition::new(node, property, from, to, duration, easing));
                }
            }
            (before, after, _) if before == after => {}
            _ => {
                self.transitions.remove(&key);
            }
        }
    }

    fn deep_clone(&mut self, node: NodeId, deep: bool) -> Option<NodeId> {
        let element = self.elements.get(&node)?;
        let mut copy = Element {
            text: if deep { element.text.clone() } else { None },
            children: Vec::new(),
            attached: false,
            clone_of: Some(node),
            ..element.clone()
        };
        if deep {
            let children = self.children(node).to_vec();
            copy.children = children
                .into_iter()
                .filter_map(|child| self.deep_clone(child, true))
                .collect();
        }
        let id = self.allocate();
        self.elements.insert(id, copy);
        Some(id)
    }
}

/// Parse a single `transition` declaration such as `all 300ms ease-out`.
fn parse_transition(declaration: &str) -> Option<(f32, EasingFunction)> {
    let declaration = declaration.trim();
    if declaration == "none" {
        return None;
    }
    let mut parts = declaration.splitn(3, char::is_whitespace);
    let _property = parts.next()?;
    let duration = parse_duration(parts.next()?)?;
    let easing = match parts.next() {
        Some(text) => text.parse().ok()?,
        None => EasingFunction::Ease,
    };
    Some((duration, easing))
}

fn parse_duration(text: &str) -> Option<f32> {
    if let Some(ms) = text.strip_suffix("ms") {
        ms.parse().ok()
    } else {
        text.strip_suffix('s')?.parse::<f32>().ok().map(|s| s * 1000.0)
    }
}

impl Host for HeadlessDocument {
    fn contains(&self, node: NodeId) -> bool {
        self.elements.contains_key(&node)
    }

    fn measure(&self, node: NodeId) -> VisualSnapshot {
        let Some(element) = self.elements.get(&node) else {
            return VisualSnapshot::default();
        };
        let mut resolved = self.resolve(node);
        for ((n, property), transition) in &self.transitions {
            if *n == node {
                resolved.insert(*property, transition.current_value());
            }
        }

        let fixed = resolved.get(&StyleProperty::Position).map(String::as_str) == Some("fixed");
        let length = |property: StyleProperty| resolved.get(&property).and_then(|v| parse_px(v));
        let layout = element.layout;
        let bounds = BoundingBox {
            top: (if fixed { length(StyleProperty::Top) } else { None }).unwrap_or(layout.top),
            left: (if fixed { length(StyleProperty::Left) } else { None }).unwrap_or(layout.left),
            width: length(StyleProperty::Width).unwrap_or(layout.width),
            height: length(StyleProperty::Height).unwrap_or(layout.height),
        };

        VisualSnapshot::new(bounds, resolved.into_iter().collect::<ComputedStyle>())
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.elements
            .get(&node)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.elements.get_mut(&node) {
            if !element.classes.iter().any(|c| c == class) {
                element.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.elements.get_mut(&node) {
            element.classes.retain(|c| c != class);
        }
    }

    fn has_single_text_child(&self, node: NodeId) -> bool {
        self.elements
            .get(&node)
            .is_some_and(|e| e.text.is_some() && e.children.is_empty())
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Option<NodeId> {
        self.deep_clone(node, deep)
    }

    fn append_to_body(&mut self, node: NodeId) {
        if let Some(element) = self.elements.get_mut(&node) {
            element.attached = true;
            self.fresh.insert(node);
            self.body.push(node);
        }
    }

    fn remove_node(&mut self, node: NodeId) {
        let Some(element) = self.elements.remove(&node) else {
            return;
        };
        for child in element.children {
            self.remove_node(child);
        }
        for other in self.elements.values_mut() {
            other.children.retain(|c| *c != node);
        }
        self.body.retain(|n| *n != node);
        self.fresh.remove(&node);
        self.watched.remove(&node);
        self.transitions.retain(|(n, _), _| *n != node);
    }

    fn inline_style(&self, node: NodeId, property: StyleProperty) -> Option<String> {
        self.elements.get(&node)?.inline.get(&property).cloned()
    }

    fn set_style(&mut self, node: NodeId, property: StyleProperty, value: &str) {
        let before = self.computed(node, property);
        let Some(element) = self.elements.get_mut(&node) else {
            return;
        };
        element.inline.insert(property, value.to_string());
        self.style_changed(node, property, before);
    }

    fn remove_style(&mut self, node: NodeId, property: StyleProperty) {
        let before = self.computed(node, property);
        let Some(element) = self.elements.get_mut(&node) else {
            return;
        };
        element.inline.remove(&property);
        self.style_changed(node, property, before);
    }

    fn request_frame(&mut self) {
        self.frame_requests += 1;
    }

    fn watch_transition_end(&mut self, node: NodeId) {
        self.watched.insert(node);
    }

    fn unwatch_transition_end(&mut self, node: NodeId) {
        self.watched.remove(&node);
    }
}

impl TransitionController<HeadlessDocument> {
    /// One frame of the host loop: deliver owed frames, advance time by
    /// `frame_ms`, then deliver transition-end signals.
    pub fn step(&mut self, frame_ms: f32) {
        let owed = self.host_mut().take_frame_requests();
        for _ in 0..owed {
            self.frame();
        }
        self.host_mut().advance(frame_ms);
        while let Some(node) = self.host_mut().pop_transition_end() {
            self.transition_ended(node);
        }
    }

    /// Step until every queued command has finished.
    ///
    /// Returns the number of frames taken, or [`FlipError::Stalled`] after
    /// `max_frames` frames without settling.
    pub fn run_until_idle(&mut self, frame_ms: f32, max_frames: u32) -> Result<u32> {
        let mut frames = 0;
        while !self.is_quiescent() {
            if frames >= max_frames {
                return Err(FlipError::Stalled { frames });
            }
            self.step(frame_ms);
            frames += 1;
        }
        Ok(frames)
    }
}
