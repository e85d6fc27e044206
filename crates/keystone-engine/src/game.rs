//! The composition root: one of each manager plus the run state.
//!
//! Each [`Game::update`] while running:
//!
//! 1. Every system's `update`, then every system's `late_update`, in
//!    registration order.
//! 2. Delayed events are advanced by `dt` and the event queue is drained.
//! 3. Pending entity removals are applied.
//! 4. `time_elapsed` advances by `dt`.
//!
//! ```
//! use keystone_engine::prelude::*;
//!
//! let mut game = Game::default();
//! game.update(1.0);
//! assert_eq!(game.time_elapsed(), 0.0);
//!
//! game.start_game();
//! game.update(0.5);
//! game.pause_game();
//! game.update(0.5);
//! assert_eq!(game.time_elapsed(), 0.5);
//! ```

use std::rc::Rc;

use keystone_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GameConfig;

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// Run state of a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameState {
    /// Not started yet.
    #[default]
    Stopped,
    Running,
    Paused,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// Owns the event, entity, system and blueprint managers and drives the
/// per-tick sequence.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    state: GameState,
    time_elapsed: f32,
    events: Rc<EventManager>,
    entities: EntityManager,
    systems: SystemManager,
    blueprints: BlueprintManager,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl Game {
    /// Create a stopped game with empty managers.
    ///
    /// # Panics
    ///
    /// If `config.max_delta` is set but not positive and finite.
    pub fn new(config: GameConfig) -> Self {
        if let Some(max) = config.max_delta {
            assert!(
                max > 0.0 && max.is_finite(),
                "max_delta must be positive and finite, got {max}"
            );
        }

        let events = Rc::new(EventManager::new());
        if config.trace_events {
            events.register_catch_all(listener(|event, _| {
                debug!(
                    event_type = %event.event_type(),
                    data = ?event.data(),
                    "event delivered"
                );
            }));
        }

        Self {
            entities: EntityManager::new(Rc::clone(&events)),
            systems: SystemManager::new(Rc::clone(&events)),
            blueprints: BlueprintManager::new(),
            events,
            state: GameState::Stopped,
            time_elapsed: 0.0,
            config,
        }
    }

    // -- run state ----------------------------------------------------------

    /// Enter `Running` and queue `GameStarted`.
    pub fn start_game(&mut self) {
        self.set_state(GameState::Running, FrameworkEvent::GameStarted);
    }

    /// Enter `Paused` and queue `GamePaused`.
    pub fn pause_game(&mut self) {
        self.set_state(GameState::Paused, FrameworkEvent::GamePaused);
    }

    /// Enter `Running` and queue `GameResumed`.
    pub fn resume_game(&mut self) {
        self.set_state(GameState::Running, FrameworkEvent::GameResumed);
    }

    fn set_state(&mut self, state: GameState, event: FrameworkEvent) {
        debug!(from = ?self.state, to = ?state, "game state changed");
        self.state = state;
        self.events.queue(event, EventData::None);
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == GameState::Running
    }

    /// Game time accumulated while running, in seconds.
    pub fn time_elapsed(&self) -> f32 {
        self.time_elapsed
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    // -- tick ---------------------------------------------------------------

    /// Advance the game by `dt` seconds. A no-op unless running.
    ///
    /// `dt` is clamped to zero from below, and to `max_delta` from above when
    /// one is configured.
    pub fn update(&mut self, dt: f32) {
        if !self.is_running() {
            return;
        }
        let dt = self.config.clamp_delta(dt);

        let mut ctx = SystemContext {
            entities: &mut self.entities,
            events: &self.events,
            blueprints: &self.blueprints,
            time_elapsed: self.time_elapsed,
        };
        self.systems.update(&mut ctx, dt);
        self.systems.late_update(&mut ctx, dt);

        self.events.process_events_with_delta(dt);
        self.entities.clean_up_entities();
        self.time_elapsed += dt;
    }

    // -- systems ------------------------------------------------------------

    /// Initialise `system` and append it to the update order.
    ///
    /// Nothing is registered if an `S` already exists or `init` fails.
    pub fn add_system<S: System>(&mut self, mut system: S) -> Result<(), EcsError> {
        if self.systems.contains::<S>() {
            return Err(EcsError::DuplicateSystem {
                system: std::any::type_name::<S>(),
            });
        }
        let mut ctx = SystemContext {
            entities: &mut self.entities,
            events: &self.events,
            blueprints: &self.blueprints,
            time_elapsed: self.time_elapsed,
        };
        system.init(&mut ctx)?;
        self.systems.add_system(system)
    }

    pub fn get_system<S: System>(&self) -> Result<&S, EcsError> {
        self.systems.get_system::<S>()
    }

    pub fn get_system_mut<S: System>(&mut self) -> Result<&mut S, EcsError> {
        self.systems.get_system_mut::<S>()
    }

    // -- events -------------------------------------------------------------

    /// Queue an event for delivery during the next running tick.
    pub fn queue_event(&self, event_type: impl Into<EventType>, data: EventData) {
        self.events.queue(event_type, data);
    }

    /// Deliver `event_type` once `delay` seconds of running time have passed.
    pub fn fire_delayed(&self, delay: f32, event_type: impl Into<EventType>, data: EventData) {
        self.events.fire_delayed(delay, event_type, data);
    }

    // -- blueprints ---------------------------------------------------------

    pub fn blueprints(&self) -> &BlueprintManager {
        &self.blueprints
    }

    pub fn blueprints_mut(&mut self) -> &mut BlueprintManager {
        &mut self.blueprints
    }

    /// Create an entity from the blueprint registered as `blueprint_id`.
    ///
    /// `configuration` overrides the blueprint's attribute defaults.
    pub fn create_entity_from_blueprint(
        &mut self,
        blueprint_id: &str,
        configuration: Option<&dyn AttributeSource>,
    ) -> Result<EntityId, EcsError> {
        let blueprint = self.blueprints.get_blueprint(blueprint_id)?;
        self.entities
            .create_entity_from_blueprint(blueprint, configuration)
    }

    // -- managers -----------------------------------------------------------

    pub fn entity_manager(&self) -> &EntityManager {
        &self.entities
    }

    pub fn entity_manager_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    pub fn event_manager(&self) -> &Rc<EventManager> {
        &self.events
    }

    pub fn system_manager(&self) -> &SystemManager {
        &self.systems
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
