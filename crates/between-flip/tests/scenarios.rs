use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use between_config::BetweenConfig;
use between_flip::{
    BoundingBox, CommandKind, ComputedStyle, ControllerEvent, EventKind, FlipError, HeadlessDocument,
    Host, NodeId, OptionsOverride, StatusKind, StyleProperty, TransitionController,
};

const FRAME_MS: f32 = 16.0;

struct Page {
    controller: TransitionController<HeadlessDocument>,
    a: NodeId,
    b: NodeId,
    c: NodeId,
}

fn page() -> Page {
    let mut doc = HeadlessDocument::new();
    doc.add_rule(
        "active",
        ComputedStyle::new()
            .with(StyleProperty::Width, "160px")
            .with(StyleProperty::BackgroundColor, "rgb(255, 0, 0)"),
    );
    let a = doc.create_element(BoundingBox::new(0.0, 0.0, 100.0, 40.0));
    let b = doc.create_element(BoundingBox::new(100.0, 50.0, 100.0, 40.0));
    let c = doc.create_element(BoundingBox::new(300.0, 20.0, 60.0, 60.0));
    Page {
        controller: TransitionController::new(doc, a),
        a,
        b,
        c,
    }
}

fn event_log(controller: &mut TransitionController<HeadlessDocument>) -> Rc<RefCell<Vec<EventKind>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in [EventKind::Done, EventKind::AllDone] {
        let log = log.clone();
        controller.on(kind, move |event| log.borrow_mut().push(event.kind()));
    }
    log
}

#[test]
fn n_commands_fire_n_done_then_one_all_done() -> Result<()> {
    let Page {
        mut controller, a, b, c,
    } = page();
    let log = event_log(&mut controller);
    controller.record_events(true);

    controller
        .add_class("active", OptionsOverride::new())?
        .move_to_element(b, OptionsOverride::new())?
        .add_class("active", OptionsOverride::new())?
        .copy_to_element(c, OptionsOverride::new())?;
    assert_eq!(controller.pending(), 3);

    let mut frames = 0;
    while !controller.is_quiescent() {
        controller.step(FRAME_MS);
        frames += 1;
        assert!(frames < 1_000, "controller never settled");

        assert!(controller.host().attached_clones().len() <= 1);
        let events = controller.drain_events();
        if events.iter().any(|e| e.kind() == EventKind::Done) {
            assert!(controller.host().attached_clones().is_empty());
        }
    }

    let mut expected = vec![EventKind::Done; 4];
    expected.push(EventKind::AllDone);
    assert_eq!(*log.borrow(), expected);

    let doc = controller.host();
    assert_eq!(controller.subject(), b);
    assert!(doc.has_class(a, "active"));
    assert!(doc.has_class(b, "active"));
    assert!(!doc.has_class(c, "active"));
    assert_eq!(doc.attached_count(), 3);
    Ok(())
}

#[test]
fn move_flies_clone_from_subject_to_target() -> Result<()> {
    let Page {
        mut controller, a, b, ..
    } = page();
    let log = event_log(&mut controller);

    controller.move_to_element(b, OptionsOverride::new())?;
    let clone = controller.in_flight_clone().expect("clone in flight");
    assert_eq!(controller.host().attached_clones(), vec![clone]);
    assert_eq!(controller.host().clone_source(clone), Some(a));

    let start = controller.host().measure(clone).bounds;
    assert_eq!((start.top, start.left), (0.0, 0.0));
    assert_eq!(
        controller.host().inline_style(clone, StyleProperty::Transition).as_deref(),
        Some("all 300ms ease")
    );

    // hidden live elements during the flight
    assert_eq!(controller.host().inline_style(a, StyleProperty::Opacity).as_deref(), Some("0"));
    assert_eq!(controller.host().inline_style(b, StyleProperty::Opacity).as_deref(), Some("0"));

    let mut frames = 0;
    while controller.status() == StatusKind::Transitioning {
        controller.step(FRAME_MS);
        frames += 1;
        assert!(frames < 100);
    }
    assert_eq!(controller.status(), StatusKind::Settling);
    assert!(frames as f32 * FRAME_MS >= 300.0);

    let end = controller.host().measure(clone).bounds;
    assert_eq!((end.top, end.left), (100.0, 50.0));
    assert!(log.borrow().is_empty());

    controller.run_until_idle(FRAME_MS, 10)?;
    assert_eq!(*log.borrow(), vec![EventKind::Done, EventKind::AllDone]);
    assert_eq!(controller.subject(), b);
    assert!(!controller.host().contains(clone));

    let doc = controller.host();
    assert_eq!(doc.inline_style(b, StyleProperty::Opacity), None);
    assert_eq!(doc.inline_style(a, StyleProperty::Opacity), None);
    assert_eq!(doc.inline_style(a, StyleProperty::PointerEvents), None);
    assert_eq!(doc.inline_style(a, StyleProperty::Transition), None);
    Ok(())
}

#[test]
fn move_there_and_back_leaves_both_visible() -> Result<()> {
    let Page {
        mut controller, a, b, ..
    } = page();

    controller.move_to_element(b, OptionsOverride::new())?;
    controller.run_until_idle(FRAME_MS, 100)?;
    controller.move_to_element(a, OptionsOverride::new())?;
    controller.run_until_idle(FRAME_MS, 100)?;

    assert_eq!(controller.subject(), a);
    let doc = controller.host();
    for node in [a, b] {
        assert_eq!(doc.inline_style(node, StyleProperty::Opacity), None);
        assert_eq!(doc.inline_style(node, StyleProperty::PointerEvents), None);
        assert_eq!(doc.inline_style(node, StyleProperty::Transition), None);
    }
    assert!(doc.attached_clones().is_empty());
    Ok(())
}

#[test]
fn copy_back_onto_a_moved_away_source_reveals_it() -> Result<()> {
    let Page {
        mut controller, a, b, ..
    } = page();

    controller
        .move_to_element(b, OptionsOverride::new())?
        .copy_to_element(a, OptionsOverride::new())?;
    controller.run_until_idle(FRAME_MS, 200)?;

    assert_eq!(controller.subject(), b);
    let doc = controller.host();
    assert_eq!(doc.inline_style(a, StyleProperty::Opacity), None);
    assert_eq!(doc.inline_style(b, StyleProperty::Opacity), None);
    assert_eq!(doc.inline_style(b, StyleProperty::PointerEvents), None);
    Ok(())
}

#[test]
fn copy_keeps_subject_and_restores_source() -> Result<()> {
    let Page {
        mut controller, a, c, ..
    } = page();
    controller.host_mut().set_style(a, StyleProperty::Opacity, "0.9");

    controller.copy_to_element(c, OptionsOverride::new())?;
    controller.run_until_idle(FRAME_MS, 100)?;

    let doc = controller.host();
    assert_eq!(controller.subject(), a);
    assert_eq!(doc.inline_style(a, StyleProperty::Opacity).as_deref(), Some("0.9"));
    assert_eq!(doc.inline_style(a, StyleProperty::PointerEvents), None);
    assert_eq!(doc.inline_style(c, StyleProperty::Opacity), None);
    assert!(doc.attached_clones().is_empty());
    Ok(())
}

#[test]
fn add_then_remove_round_trips() -> Result<()> {
    let Page { mut controller, a, .. } = page();
    let log = event_log(&mut controller);
    controller.record_events(true);

    controller
        .add_class("active", OptionsOverride::new())?
        .remove_class("active", OptionsOverride::new())?;
    assert_eq!(controller.pending(), 1);

    let mut seen_present = false;
    let mut frames = 0;
    while !controller.is_quiescent() {
        controller.step(FRAME_MS);
        frames += 1;
        assert!(frames < 200);
        for event in controller.drain_events() {
            if let ControllerEvent::Done { command: CommandKind::AddClass(_), .. } = event {
                seen_present = controller.host().has_class(a, "active");
            }
        }
    }

    assert!(seen_present);
    assert!(!controller.host().has_class(a, "active"));
    assert_eq!(
        *log.borrow(),
        vec![EventKind::Done, EventKind::Done, EventKind::AllDone]
    );
    Ok(())
}

#[test]
fn class_clone_animates_to_class_style() -> Result<()> {
    let Page { mut controller, .. } = page();
    controller.add_class("active", OptionsOverride::new().duration_ms(100))?;
    let clone = controller.in_flight_clone().expect("clone in flight");

    let (first, last) = controller.snapshots().expect("snapshots while in flight");
    assert_eq!(first.bounds.width, 100.0);
    assert_eq!(last.bounds.width, 160.0);

    controller.step(FRAME_MS);
    controller.step(50.0);
    let width = controller.host().measure(clone).bounds.width;
    assert!(width > 100.0 && width < 160.0, "mid-flight width {}", width);
    Ok(())
}

#[test]
fn noop_commands_change_nothing() -> Result<()> {
    let Page { mut controller, a, .. } = page();
    let log = event_log(&mut controller);

    controller.move_to_element(a, OptionsOverride::new())?;
    controller.copy_to_element(a, OptionsOverride::new())?;
    controller.remove_class("active", OptionsOverride::new())?;
    controller.host_mut().add_class(a, "active");
    controller.add_class("active", OptionsOverride::new())?;

    assert_eq!(controller.status(), StatusKind::Idle);
    assert_eq!(controller.pending(), 0);
    assert_eq!(controller.run_until_idle(FRAME_MS, 10)?, 0);
    assert!(log.borrow().is_empty());
    assert!(controller.host().attached_clones().is_empty());
    Ok(())
}

#[test]
fn queued_commands_see_projected_state() -> Result<()> {
    let Page {
        mut controller, b, ..
    } = page();

    controller.move_to_element(b, OptionsOverride::new())?;
    // b is the subject once the move lands
    controller.move_to_element(b, OptionsOverride::new())?;
    assert_eq!(controller.pending(), 0);

    controller.add_class("active", OptionsOverride::new())?;
    controller.add_class("active", OptionsOverride::new())?;
    assert_eq!(controller.pending(), 1);

    controller.run_until_idle(FRAME_MS, 200)?;
    assert!(controller.host().has_class(b, "active"));
    Ok(())
}

#[test]
fn snapshots_are_taken_when_a_command_starts() -> Result<()> {
    let Page {
        mut controller, b, c, ..
    } = page();
    controller
        .copy_to_element(c, OptionsOverride::new())?
        .move_to_element(b, OptionsOverride::new())?;

    // b reflows while the copy is still in flight
    controller
        .host_mut()
        .set_layout(b, BoundingBox::new(220.0, 10.0, 100.0, 40.0));

    while controller.pending() > 0 {
        controller.step(FRAME_MS);
    }
    let (_, last) = controller.snapshots().expect("move in flight");
    assert_eq!((last.bounds.top, last.bounds.left), (220.0, 10.0));
    Ok(())
}

#[test]
fn stray_transition_ends_are_ignored() -> Result<()> {
    let Page {
        mut controller, a, b, c,
    } = page();
    let log = event_log(&mut controller);
    controller.move_to_element(b, OptionsOverride::new())?;

    for node in [a, b, c, NodeId(999)] {
        controller.host_mut().push_transition_end(node);
    }
    controller.step(FRAME_MS);
    assert_eq!(controller.status(), StatusKind::Transitioning);

    controller.run_until_idle(FRAME_MS, 100)?;
    // every animated property ends on the clone; one completion
    assert_eq!(*log.borrow(), vec![EventKind::Done, EventKind::AllDone]);

    controller.transition_ended(b);
    assert_eq!(controller.status(), StatusKind::Idle);
    Ok(())
}

#[test]
fn unchanged_target_settles_without_transition() -> Result<()> {
    let Page { mut controller, a, .. } = page();
    let log = event_log(&mut controller);

    // no rule for this class, so first and last state are identical
    controller.add_class("marker", OptionsOverride::new())?;
    let frames = controller.run_until_idle(FRAME_MS, 10)?;

    assert!(frames <= 3);
    assert!(controller.host().has_class(a, "marker"));
    assert_eq!(*log.borrow(), vec![EventKind::Done, EventKind::AllDone]);
    Ok(())
}

#[test]
fn frozen_clock_reports_stall() -> Result<()> {
    let Page { mut controller, b, .. } = page();
    controller.move_to_element(b, OptionsOverride::new())?;

    let err = controller.run_until_idle(0.0, 5).unwrap_err();
    assert_eq!(err, FlipError::Stalled { frames: 5 });
    assert_eq!(controller.status(), StatusKind::Transitioning);
    assert_eq!(controller.host().attached_clones().len(), 1);

    controller.run_until_idle(FRAME_MS, 100)?;
    assert_eq!(controller.subject(), b);
    Ok(())
}

#[test]
fn vanished_destination_is_skipped_but_reported() -> Result<()> {
    let Page {
        mut controller, a, b, ..
    } = page();
    let log = event_log(&mut controller);

    controller
        .add_class("active", OptionsOverride::new())?
        .move_to_element(b, OptionsOverride::new())?;
    controller.host_mut().remove_node(b);
    controller.run_until_idle(FRAME_MS, 200)?;

    assert_eq!(controller.subject(), a);
    assert_eq!(controller.host().inline_style(a, StyleProperty::Opacity), None);
    assert_eq!(
        *log.borrow(),
        vec![EventKind::Done, EventKind::Done, EventKind::AllDone]
    );
    Ok(())
}

#[test]
fn text_only_subject_is_cloned_with_its_text() -> Result<()> {
    let Page {
        mut controller, a, c, ..
    } = page();
    controller.host_mut().set_text(a, "Card title");

    controller.copy_to_element(c, OptionsOverride::new())?;
    let clone = controller.in_flight_clone().expect("clone in flight");
    assert_eq!(controller.host().text(clone), Some("Card title"));
    Ok(())
}

#[test]
fn incoming_opacity_override_can_be_disabled() -> Result<()> {
    let Page {
        mut controller, b, ..
    } = page();
    controller
        .host_mut()
        .set_base_style(b, StyleProperty::Opacity, "0.5");

    controller.copy_to_element(b, OptionsOverride::new().override_incoming_opacity(false))?;
    let (_, last) = controller.snapshots().expect("snapshots while in flight");
    assert_eq!(last.style.get(StyleProperty::Opacity), Some("0.5"));
    assert_eq!(controller.host().inline_style(b, StyleProperty::Opacity), None);
    Ok(())
}

#[test]
fn configured_defaults_reach_the_clone() -> Result<()> {
    let mut config = BetweenConfig::default();
    config.transition.easing = "ease-in-out".to_string();
    config.transition.duration_ms = 120;
    let defaults = OptionsOverride::from_config(&config.transition)?;

    let mut doc = HeadlessDocument::new();
    let a = doc.create_element(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    let b = doc.create_element(BoundingBox::new(40.0, 40.0, 10.0, 10.0));
    let mut controller = TransitionController::with_options(doc, a, defaults);

    controller.move_to_element(b, OptionsOverride::new())?;
    let clone = controller.in_flight_clone().expect("clone in flight");
    assert_eq!(
        controller.host().inline_style(clone, StyleProperty::Transition).as_deref(),
        Some("all 120ms ease-in-out")
    );
    Ok(())
}

#[test]
fn recorded_events_serialize() -> Result<()> {
    let Page {
        mut controller, b, ..
    } = page();
    controller.record_events(true);
    controller.move_to_element(b, OptionsOverride::new())?;
    controller.run_until_idle(FRAME_MS, 100)?;

    let events = controller.drain_events();
    assert_eq!(events.len(), 2);
    let json = serde_json::to_value(&events)?;
    assert_eq!(json[0]["type"], "done");
    assert_eq!(json[0]["command"]["move_to_element"], b.0);
    assert_eq!(json[1]["type"], "all_done");
    Ok(())
}

#[test]
fn listeners_run_in_registration_order() -> Result<()> {
    let Page {
        mut controller, b, ..
    } = page();
    let order = Rc::new(RefCell::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let order = order.clone();
        controller.on(EventKind::Done, move |_| order.borrow_mut().push(tag));
    }

    controller.move_to_element(b, OptionsOverride::new())?;
    controller.run_until_idle(FRAME_MS, 100)?;
    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    Ok(())
}
