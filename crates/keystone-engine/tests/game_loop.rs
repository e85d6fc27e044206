//! End-to-end tests of the game loop through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use keystone_engine::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq, Default)]
struct Health(u32);

impl Component for Health {
    fn init_component(&mut self, attributes: &dyn AttributeSource) -> Result<(), EcsError> {
        self.0 = attribute_as(attributes, "hp")?.unwrap_or(10);
        Ok(())
    }
}

/// Queues `"late"` from its late hook every tick.
struct Announcer;

impl System for Announcer {
    fn update(&mut self, ctx: &mut SystemContext<'_>, _dt: f32) {
        ctx.events.queue("early", EventData::None);
    }

    fn late_update(&mut self, ctx: &mut SystemContext<'_>, _dt: f32) {
        ctx.events
            .queue("late", EventData::Json(serde_json::json!({ "t": ctx.time_elapsed })));
    }
}

fn record_named(game: &Game) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    game.event_manager().register_catch_all(listener(move |event, _| {
        if event.event_type().framework().is_none() {
            sink.borrow_mut().push(event.event_type().to_string());
        }
    }));
    log
}

#[test]
fn late_update_events_are_delivered_in_same_tick() {
    let mut game = Game::default();
    game.add_system(Announcer).unwrap();
    let log = record_named(&game);

    game.start_game();
    game.update(0.1);
    assert_eq!(*log.borrow(), vec!["early", "late"]);
    assert_eq!(game.event_manager().pending_event_count(), 0);
}

#[test]
fn delayed_event_fires_after_enough_running_time() {
    let mut game = Game::default();
    let log = record_named(&game);
    game.fire_delayed(1.0, "boom", EventData::None);

    game.start_game();
    game.update(0.6);
    assert!(log.borrow().is_empty());

    game.pause_game();
    game.update(5.0);
    assert!(log.borrow().is_empty());

    game.resume_game();
    game.update(0.6);
    assert_eq!(*log.borrow(), vec!["boom"]);
}

#[test]
fn events_queued_while_paused_wait_for_resume() {
    let mut game = Game::default();
    let log = record_named(&game);
    game.start_game();
    game.pause_game();
    game.queue_event("saved", EventData::None);
    game.update(1.0);
    assert!(log.borrow().is_empty());

    game.resume_game();
    game.update(1.0);
    assert_eq!(*log.borrow(), vec!["saved"]);
}

#[test]
fn blueprint_with_configuration_override() {
    let mut game = Game::default();
    game.blueprints_mut()
        .add_blueprint("knight", Blueprint::new().with_component::<Health>().with_attribute("hp", 30))
        .unwrap();

    let plain = game.create_entity_from_blueprint("knight", None).unwrap();
    let config = AttributeTable::new().with("hp", 45);
    let tough = game
        .create_entity_from_blueprint("knight", Some(&config))
        .unwrap();

    let entities = game.entity_manager();
    assert_eq!(entities.get_component::<Health>(plain).unwrap(), Some(&Health(30)));
    assert_eq!(entities.get_component::<Health>(tough).unwrap(), Some(&Health(45)));
}

#[test]
fn removed_entity_keeps_components_until_cleanup() {
    let mut game = Game::default();
    let e = game.entity_manager_mut().create_entity();
    game.entity_manager_mut().add_component(e, Health(3)).unwrap();
    game.entity_manager_mut().remove_entity(e).unwrap();

    assert_eq!(
        game.entity_manager().get_component::<Health>(e).unwrap(),
        Some(&Health(3))
    );

    game.start_game();
    game.update(0.0);
    assert!(matches!(
        game.entity_manager().get_component::<Health>(e),
        Err(EcsError::EntityRemoved { .. })
    ));
    assert!(!game.entity_manager_mut().entity_is_alive(e).unwrap());
}

#[test]
fn init_tracing_is_idempotent() {
    init_tracing("keystone=debug");
    assert!(!init_tracing("keystone=debug"));

    let mut game = Game::new(GameConfig {
        trace_events: true,
        ..Default::default()
    });
    game.start_game();
    game.update(0.016);
    assert_eq!(game.event_manager().listener_count(&ListenerKey::All), 1);
}

#[derive(Debug, Clone)]
enum Control {
    Start,
    Pause,
    Resume,
    Update(u8),
}

fn control_strategy() -> impl Strategy<Value = Control> {
    prop_oneof![
        1 => Just(Control::Start),
        1 => Just(Control::Pause),
        1 => Just(Control::Resume),
        4 => (0u8..=64).prop_map(Control::Update),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1_000))]

    #[test]
    fn time_only_advances_while_running(controls in prop::collection::vec(control_strategy(), 1..60)) {
        let mut game = Game::default();
        let mut expected = 0.0f32;

        for control in controls {
            match control {
                Control::Start => game.start_game(),
                Control::Pause => game.pause_game(),
                Control::Resume => game.resume_game(),
                Control::Update(steps) => {
                    // Multiples of 1/64 are exact in f32.
                    let dt = f32::from(steps) / 64.0;
                    let before = game.time_elapsed();
                    game.update(dt);
                    if game.is_running() {
                        expected += dt;
                        prop_assert_eq!(game.time_elapsed(), before + dt);
                    } else {
                        prop_assert_eq!(game.time_elapsed(), before);
                    }
                }
            }
            prop_assert_eq!(game.time_elapsed(), expected);
        }
    }
}
