use std::rc::Rc;

use anyhow::Result;
use choreo_engine::engine::Registration;
use choreo_engine::{
    AnimationKind, ChoreoConfig, DescriptorState, Engine, EngineContext, RawDescriptor,
    RecordingDriver, TriggerKind,
};

fn raw(target: &str, attributes: &[(&str, &str)]) -> RawDescriptor {
    RawDescriptor::from_attributes(target, attributes.iter().copied())
}

#[test]
fn contiguous_stagger_entries_form_one_sequence() -> Result<()> {
    let ctx = EngineContext::new(ChoreoConfig::default());
    let mut engine = Engine::new(Rc::clone(&ctx), RecordingDriver::new());

    let registrations = engine.register_declarative([
        raw("title", &[("kind", "fade"), ("trigger", "immediate")]),
        raw("card-1", &[("kind", "slide-up"), ("stagger", "true")]),
        raw("card-2", &[("kind", "slide-up"), ("stagger", "true"), ("delay", "25ms")]),
        raw("card-3", &[("kind", "slide-up"), ("stagger", "")]),
        raw("footer", &[("kind", "not-a-kind"), ("duration", "soon")]),
        raw("tag-1", &[("stagger", "1"), ("trigger", "click")]),
    ]);

    assert_eq!(registrations.len(), 4);
    let Registration::Sequence(cards) = registrations[1] else {
        panic!("expected the cards to form a sequence, got {:?}", registrations[1]);
    };
    let Registration::Sequence(tags) = registrations[3] else {
        panic!("expected a trailing sequence, got {:?}", registrations[3]);
    };

    let sequence = engine.sequence(cards).expect("sequence registered");
    assert_eq!(sequence.members.len(), 3);
    assert_eq!(sequence.anchor.as_str(), "card-1");
    assert_eq!(sequence.trigger, TriggerKind::Visibility);

    let delays: Vec<u64> = sequence
        .members
        .iter()
        .map(|id| engine.descriptor(*id).map_or(0, |d| d.delay_ms))
        .collect();
    assert_eq!(delays, vec![0, 125, 200]);

    assert_eq!(engine.sequence(tags).map(|s| s.trigger), Some(TriggerKind::Click));

    // Bad attributes fell back to configured defaults.
    let Registration::Descriptor(footer) = registrations[2] else {
        panic!("footer should be a plain descriptor");
    };
    let footer = engine.descriptor(footer).expect("footer registered");
    assert_eq!(footer.kind, AnimationKind::Fade);
    assert_eq!(footer.duration_ms, ctx.config().engine.default_duration_ms);

    // The immediate title is already on its way.
    let Registration::Descriptor(title) = registrations[0] else {
        panic!("title should be a plain descriptor");
    };
    assert_eq!(engine.state(title), Some(DescriptorState::Queued));
    Ok(())
}

#[test]
fn declarative_entries_load_from_toml() -> Result<()> {
    #[derive(serde::Deserialize)]
    struct Page {
        animation: Vec<RawDescriptor>,
    }

    let page: Page = toml::from_str(
        r#"
        [[animation]]
        target = "stat"
        kind = "count-up"
        value = "1200"
        duration = "2s"
        trigger = "manual"

        [[animation]]
        target = "bar"
        kind = "progress-bar"
        value = "75"
        trigger = "manual"
        "#,
    )?;

    let ctx = EngineContext::new(ChoreoConfig::default());
    let mut engine = Engine::new(ctx, RecordingDriver::new());
    let ids: Vec<_> = engine
        .register_declarative(page.animation)
        .into_iter()
        .filter_map(|r| match r {
            Registration::Descriptor(id) => Some(id),
            Registration::Sequence(_) => None,
        })
        .collect();
    assert_eq!(ids.len(), 2);

    let stat = engine.descriptor(ids[0]).expect("stat registered");
    assert_eq!(stat.kind, AnimationKind::CountUp { from: 0.0, to: 1200.0 });
    assert_eq!(stat.duration_ms, 2000);

    for id in &ids {
        engine.fire(*id);
    }
    engine.tick(2_000);
    assert!(ids.iter().all(|id| engine.state(*id) == Some(DescriptorState::Completed)));
    Ok(())
}
