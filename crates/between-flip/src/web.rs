//! Browser host over `web-sys`.
//!
//! The controller owns the [`WebHost`]; the browser owns the callbacks. Each
//! callback holds a `Weak` handle to the shared controller and re-enters it
//! through `frame()` or `transition_ended()`:
//!
//! ```ignore
//! let controller = between_flip::web::controller(card, OptionsOverride::new())?;
//! let slot = controller.borrow_mut().host_mut().register(slot_element);
//! controller.borrow_mut().move_to_element(slot, OptionsOverride::new())?;
//! ```
//!
//! Event listeners run while the controller is mutably borrowed, so they must
//! not call back into it synchronously.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{error, trace, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, HtmlElement, Node, Window};

use crate::animation::transition::OptionsOverride;
use crate::animation::types::{BoundingBox, ComputedStyle, NodeId, StyleProperty, VisualSnapshot};
use crate::controller::TransitionController;
use crate::error::{FlipError, Result};
use crate::host::Host;

/// Controller shared between the page and the browser callbacks.
pub type WebController = Rc<RefCell<TransitionController<WebHost>>>;

const TRANSITION_END: &str = "transitionend";

/// [`Host`] backed by live DOM elements.
#[derive(Debug)]
pub struct WebHost {
    window: Window,
    document: Document,
    nodes: HashMap<NodeId, HtmlElement>,
    listeners: HashMap<NodeId, Closure<dyn FnMut(Event)>>,
    // unwatched from inside their own callback; dropped on the next watch
    retired: Vec<Closure<dyn FnMut(Event)>>,
    controller: Weak<RefCell<TransitionController<WebHost>>>,
    next_id: u64,
}

/// Bind a controller to `subject` in the current window.
pub fn controller(subject: HtmlElement, options: OptionsOverride) -> Result<WebController> {
    let window = web_sys::window().ok_or_else(|| FlipError::Host("no window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| FlipError::Host("window has no document".into()))?;

    Ok(Rc::new_cyclic(|weak| {
        let mut host = WebHost {
            window,
            document,
            nodes: HashMap::new(),
            listeners: HashMap::new(),
            retired: Vec::new(),
            controller: weak.clone(),
            next_id: 1,
        };
        let subject = host.register(subject);
        RefCell::new(TransitionController::with_options(host, subject, options))
    }))
}

impl WebHost {
    /// Hand an element to the host and get its handle.
    ///
    /// Registering the same element twice returns the existing handle.
    pub fn register(&mut self, element: HtmlElement) -> NodeId {
        if let Some((id, _)) = self.nodes.iter().find(|(_, known)| **known == element) {
            return *id;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, element);
        id
    }

    pub fn element(&self, node: NodeId) -> Option<&HtmlElement> {
        self.nodes.get(&node)
    }

    /// Forget a handle without touching the element.
    pub fn unregister(&mut self, node: NodeId) {
        self.unwatch_transition_end(node);
        self.nodes.remove(&node);
    }
}

fn with_controller(
    weak: &Weak<RefCell<TransitionController<WebHost>>>,
    callback: impl FnOnce(&mut TransitionController<WebHost>),
) {
    let Some(controller) = weak.upgrade() else {
        trace!("controller dropped; ignoring browser callback");
        return;
    };
    match controller.try_borrow_mut() {
        Ok(mut controller) => callback(&mut controller),
        Err(_) => warn!("controller busy; dropping re-entrant browser callback"),
    };
}

impl Host for WebHost {
    fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn measure(&self, node: NodeId) -> VisualSnapshot {
        let Some(element) = self.nodes.get(&node) else {
            return VisualSnapshot::default();
        };
        let rect = element.get_bounding_client_rect();
        let bounds = BoundingBox::new(rect.top(), rect.left(), rect.width(), rect.height());

        let mut style = ComputedStyle::new();
        match self.window.get_computed_style(element) {
            Ok(Some(declaration)) => {
                for property in StyleProperty::TRANSITIONABLE {
                    if let Ok(value) = declaration.get_property_value(property.css_name()) {
                        if !value.is_empty() {
                            style.insert(property, value);
                        }
                    }
                }
            }
            _ => warn!("no computed style for {}", node),
        }
        VisualSnapshot::new(bounds, style)
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|element| element.class_list().contains(class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.nodes.get(&node) {
            if let Err(err) = element.class_list().add_1(class) {
                warn!("add class {:?} on {}: {:?}", class, node, err);
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.nodes.get(&node) {
            if let Err(err) = element.class_list().remove_1(class) {
                warn!("remove class {:?} on {}: {:?}", class, node, err);
            }
        }
    }

    fn has_single_text_child(&self, node: NodeId) -> bool {
        let Some(element) = self.nodes.get(&node) else {
            return false;
        };
        let children = element.child_nodes();
        children.length() == 1
            && children
                .item(0)
                .is_some_and(|child| child.node_type() == Node::TEXT_NODE)
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Option<NodeId> {
        let copy = self
            .nodes
            .get(&node)
            .ok_or_else(|| format!("unknown node {}", node))
            .and_then(|element| {
                element
                    .clone_node_with_deep(deep)
                    .map_err(|err| format!("{:?}", err))
            })
            .and_then(|copy| {
                copy.dyn_into::<HtmlElement>()
                    .map_err(|_| "clone is not an HTML element".to_string())
            });
        match copy {
            Ok(copy) => Some(self.register(copy)),
            Err(err) => {
                error!("cloning {} failed: {}", node, err);
                None
            }
        }
    }

    fn append_to_body(&mut self, node: NodeId) {
        let (Some(element), Some(body)) = (self.nodes.get(&node), self.document.body()) else {
            return;
        };
        if let Err(err) = body.append_child(element) {
            error!("appending {} to body: {:?}", node, err);
        }
    }

    fn remove_node(&mut self, node: NodeId) {
        if let Some(element) = self.nodes.get(&node) {
            element.remove();
        }
        self.unregister(node);
    }

    fn inline_style(&self, node: NodeId, property: StyleProperty) -> Option<String> {
        let value = self
            .nodes
            .get(&node)?
            .style()
            .get_property_value(property.css_name())
            .ok()?;
        (!value.is_empty()).then_some(value)
    }

    fn set_style(&mut self, node: NodeId, property: StyleProperty, value: &str) {
        if let Some(element) = self.nodes.get(&node) {
            if let Err(err) = element.style().set_property(property.css_name(), value) {
                warn!("set {} on {}: {:?}", property, node, err);
            }
        }
    }

    fn remove_style(&mut self, node: NodeId, property: StyleProperty) {
        if let Some(element) = self.nodes.get(&node) {
            if let Err(err) = element.style().remove_property(property.css_name()) {
                warn!("remove {} on {}: {:?}", property, node, err);
            }
        }
    }

    fn request_frame(&mut self) {
        let weak = self.controller.clone();
        let callback = Closure::once_into_js(move |_timestamp: f64| {
            with_controller(&weak, |controller| controller.frame());
        });
        if let Err(err) = self.window.request_animation_frame(callback.unchecked_ref()) {
            error!("requestAnimationFrame failed: {:?}", err);
        }
    }

    fn watch_transition_end(&mut self, node: NodeId) {
        self.retired.clear();
        let Some(element) = self.nodes.get(&node) else {
            return;
        };
        let weak = self.controller.clone();
        let listener = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            with_controller(&weak, |controller| controller.transition_ended(node));
        });
        match element.add_event_listener_with_callback(TRANSITION_END, listener.as_ref().unchecked_ref()) {
            Ok(()) => {
                self.listeners.insert(node, listener);
            }
            Err(err) => error!("watching {}: {:?}", node, err),
        }
    }

    fn unwatch_transition_end(&mut self, node: NodeId) {
        let Some(listener) = self.listeners.remove(&node) else {
            return;
        };
        if let Some(element) = self.nodes.get(&node) {
            if let Err(err) = element
                .remove_event_listener_with_callback(TRANSITION_END, listener.as_ref().unchecked_ref())
            {
                warn!("unwatching {}: {:?}", node, err);
            }
        }
        self.retired.push(listener);
    }
}
