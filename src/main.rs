use anyhow::Result;
use choreo_config::ChoreoConfig;
use choreo_engine::{
    AnimationKind, Axis, Engine, EngineContext, Frame, NativeTransition, RawDescriptor,
    ScriptedFrame, TargetHandle, TransitionDriver, TriggerKind,
};

/// Frame length of the simulated host, in milliseconds.
const FRAME_MS: u64 = 16;

/// Driver for a headless host: every call becomes a log line.
struct LoggingDriver;

impl TransitionDriver for LoggingDriver {
    fn prepare(&mut self, target: &TargetHandle, kind: &AnimationKind) {
        log::debug!("prepare {target} for {kind:?}");
    }

    fn begin(&mut self, target: &TargetHandle, transition: &NativeTransition) {
        log::info!(
            "begin {target}: {:?} over {}ms ({})",
            transition.kind,
            transition.duration_ms,
            transition.easing
        );
    }

    fn step(&mut self, target: &TargetHandle, frame: ScriptedFrame) {
        log::trace!("step {target}: {frame:?}");
    }

    fn settle(&mut self, target: &TargetHandle, kind: &AnimationKind) {
        log::info!("settle {target} at the end of {kind:?}");
    }

    fn apply_offset(&mut self, target: &TargetHandle, x: f64, y: f64) {
        log::trace!("offset {target} by ({x:.1}, {y:.1})");
    }
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let mut config = ChoreoConfig::load();
    // Only lifecycle events are reported below.
    config.engine.state_change_events = false;
    let ctx = EngineContext::new(config);
    let mut engine = Engine::new(ctx.clone(), LoggingDriver);

    engine.register(ctx.descriptor("hero").with_kind(AnimationKind::SlideUp));
    engine.register(
        ctx.descriptor("cta")
            .with_kind(AnimationKind::Bounce)
            .with_trigger(TriggerKind::Hover)
            .repeatable(true),
    );
    engine.register(
        ctx.descriptor("visitors")
            .with_kind(AnimationKind::CountUp { from: 0.0, to: 1280.0 })
            .with_trigger(TriggerKind::Immediate)
            .with_duration(1_500),
    );
    engine.add_parallax_layer("backdrop", None, Axis::Vertical);

    let features = (0..6).map(|i| {
        RawDescriptor::from_attributes(
            format!("feature-{i}"),
            [("kind", "scale-in"), ("stagger", "true"), ("duration", "0.4s")],
        )
    });
    engine.register_declarative(features);

    let intro = engine.create_timeline(vec![
        Frame::new(300, || log::info!("intro: show headline")),
        Frame::new(500, || log::info!("intro: type tagline")),
        Frame::new(200, || log::info!("intro: reveal menu")),
    ])?;

    engine.play(intro);
    engine.report_intersection("hero", true);

    let mut lifecycle = 0usize;
    for frame in 0..150u64 {
        let now = frame * FRAME_MS;
        engine.on_scroll(now as f64 * 0.75);

        match now {
            320 => engine.report_intersection("feature-0", true),
            480 => engine.pointer_enter("cta"),
            960 => engine.pointer_leave("cta"),
            1_280 => {
                log::info!("user switched on reduced motion");
                ctx.motion().set_preference(true);
            }
            1_440 => engine.pointer_enter("cta"),
            _ => {}
        }

        engine.tick(FRAME_MS);
        let at = engine.now_ms();
        for event in engine.drain_events().filter(|e| e.is_lifecycle()) {
            lifecycle += 1;
            log::info!("{at}: {}", serde_json::to_string(&event)?);
        }
    }

    println!("lifecycle events: {lifecycle}");
    println!("{}", serde_json::to_string_pretty(&engine.metrics())?);

    engine.destroy();
    Ok(())
}
