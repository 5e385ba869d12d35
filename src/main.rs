use anyhow::{Context, Result};
use between_config::BetweenConfig;
use between_flip::{
    BoundingBox, ComputedStyle, EventKind, HeadlessDocument, NodeId, OptionsOverride,
    StyleProperty, TransitionController,
};

const FRAME_MS: f32 = 1000.0 / 60.0;
const MAX_FRAMES: u32 = 10_000;

struct Stage {
    controller: TransitionController<HeadlessDocument>,
    card: NodeId,
    slot: NodeId,
    shelf: NodeId,
}

fn stage(defaults: OptionsOverride) -> Stage {
    let mut doc = HeadlessDocument::new();
    doc.add_rule(
        "active",
        ComputedStyle::new()
            .with(StyleProperty::Width, "240px")
            .with(StyleProperty::BackgroundColor, "rgb(30, 144, 255)")
            .with(StyleProperty::BorderRadius, "12px"),
    );
    let card = doc.create_element(BoundingBox::new(0.0, 0.0, 120.0, 80.0));
    doc.set_text(card, "Card");
    let slot = doc.create_element(BoundingBox::new(100.0, 50.0, 120.0, 80.0));
    let shelf = doc.create_element(BoundingBox::new(400.0, 300.0, 60.0, 40.0));

    let mut controller = TransitionController::with_options(doc, card, defaults);
    controller
        .on(EventKind::Done, |event| log::info!("done: {}", describe(event)))
        .on(EventKind::AllDone, |_| log::info!("all done"));
    Stage {
        controller,
        card,
        slot,
        shelf,
    }
}

fn describe(event: &between_flip::ControllerEvent) -> String {
    serde_json::to_string(event).unwrap_or_else(|_| format!("{:?}", event))
}

fn run(name: &str, stage: &mut Stage) -> Result<()> {
    let frames = stage
        .controller
        .run_until_idle(FRAME_MS, MAX_FRAMES)
        .with_context(|| format!("scenario {name}"))?;
    println!(
        "{name}: settled in {frames} frames, subject {}, clones left {}",
        stage.controller.subject(),
        stage.controller.host().attached_clones().len()
    );
    Ok(())
}

fn scenario_move(defaults: OptionsOverride) -> Result<()> {
    let mut stage = stage(defaults);
    stage
        .controller
        .move_to_element(stage.slot, OptionsOverride::new())?;
    run("move", &mut stage)
}

fn scenario_round_trip(defaults: OptionsOverride) -> Result<()> {
    let mut stage = stage(defaults);
    stage
        .controller
        .add_class("active", OptionsOverride::new())?
        .remove_class("active", OptionsOverride::new().duration_ms(150))?;
    run("round-trip", &mut stage)
}

fn scenario_queue(defaults: OptionsOverride) -> Result<()> {
    let mut stage = stage(defaults);
    stage
        .controller
        .add_class("active", OptionsOverride::new())?
        .copy_to_element(stage.shelf, OptionsOverride::new())?
        .move_to_element(stage.slot, OptionsOverride::new())?
        .add_class("active", OptionsOverride::new())?;
    run("queue", &mut stage)
}

fn scenario_noop(defaults: OptionsOverride) -> Result<()> {
    let mut stage = stage(defaults);
    stage
        .controller
        .move_to_element(stage.card, OptionsOverride::new())?
        .remove_class("active", OptionsOverride::new())?;
    run("no-op", &mut stage)
}

fn main() -> Result<()> {
    let config = BetweenConfig::load();

    let filter = config.logging.filter.clone().unwrap_or_else(|| "info".to_string());
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .try_init();

    let defaults = OptionsOverride::from_config(&config.transition)
        .context("invalid [transition] configuration")?;
    log::info!(
        "transition defaults: {}ms {}",
        config.transition.duration_ms,
        config.transition.easing
    );

    let scenario = std::env::var("BETWEEN_SCENARIO").ok().or_else(|| {
        std::env::args()
            .find_map(|arg| arg.strip_prefix("--scenario=").map(str::to_string))
    });

    match scenario.as_deref() {
        Some("move") => scenario_move(defaults),
        Some("round-trip") => scenario_round_trip(defaults),
        Some("queue") => scenario_queue(defaults),
        Some("no-op") => scenario_noop(defaults),
        Some(other) => anyhow::bail!("unknown scenario {other:?}"),
        None => {
            scenario_move(defaults)?;
            scenario_round_trip(defaults)?;
            scenario_queue(defaults)?;
            scenario_noop(defaults)
        }
    }
}
