//! Systems and the ordered system registry.
//!
//! A [`System`] is ticked once per frame through [`SystemManager::update`],
//! followed by [`SystemManager::late_update`]. Systems run in registration
//! order and at most one instance of each concrete type is registered.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::blueprint::BlueprintManager;
use crate::component::AsAny;
use crate::entity::EntityManager;
use crate::event::{EventData, EventManager, FrameworkEvent};
use crate::EcsError;

/// What a system can reach while it runs.
pub struct SystemContext<'a> {
    pub entities: &'a mut EntityManager,
    pub events: &'a EventManager,
    pub blueprints: &'a BlueprintManager,
    /// Game time accumulated before the current tick, in seconds.
    pub time_elapsed: f32,
}

/// A unit of per-frame game logic.
pub trait System: AsAny {
    /// Called once, before the system is registered.
    fn init(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        let _ = ctx;
        Ok(())
    }

    /// Called once per tick, in registration order.
    fn update(&mut self, ctx: &mut SystemContext<'_>, dt: f32);

    /// Called once per tick after every system's `update`. Events queued here
    /// are delivered in the same tick.
    fn late_update(&mut self, ctx: &mut SystemContext<'_>, dt: f32) {
        let _ = (ctx, dt);
    }
}

struct RegisteredSystem {
    rust_type: TypeId,
    name: &'static str,
    system: Box<dyn System>,
}

/// Ordered collection of systems, one per concrete type.
pub struct SystemManager {
    systems: Vec<RegisteredSystem>,
    events: Rc<EventManager>,
}

impl fmt::Debug for SystemManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemManager")
            .field("systems", &self.system_names())
            .finish()
    }
}

impl SystemManager {
    pub fn new(events: Rc<EventManager>) -> Self {
        Self {
            systems: Vec::new(),
            events,
        }
    }

    /// Append `system` and queue `SystemAdded`.
    ///
    /// Fails with [`EcsError::DuplicateSystem`] if an `S` is already
    /// registered.
    pub fn add_system<S: System>(&mut self, system: S) -> Result<(), EcsError> {
        let name = std::any::type_name::<S>();
        if self.contains::<S>() {
            return Err(EcsError::DuplicateSystem { system: name });
        }
        self.systems.push(RegisteredSystem {
            rust_type: TypeId::of::<S>(),
            name,
            system: Box::new(system),
        });
        self.events
            .queue(FrameworkEvent::SystemAdded, EventData::System(name));
        debug!(system = name, position = self.systems.len() - 1, "system added");
        Ok(())
    }

    /// The registered `S`.
    pub fn get_system<S: System>(&self) -> Result<&S, EcsError> {
        self.systems
            .iter()
            .find(|entry| entry.rust_type == TypeId::of::<S>())
            .and_then(|entry| (*entry.system).as_any().downcast_ref::<S>())
            .ok_or(EcsError::SystemNotRegistered {
                system: std::any::type_name::<S>(),
            })
    }

    pub fn get_system_mut<S: System>(&mut self) -> Result<&mut S, EcsError> {
        self.systems
            .iter_mut()
            .find(|entry| entry.rust_type == TypeId::of::<S>())
            .and_then(|entry| (*entry.system).as_any_mut().downcast_mut::<S>())
            .ok_or(EcsError::SystemNotRegistered {
                system: std::any::type_name::<S>(),
            })
    }

    pub fn contains<S: System>(&self) -> bool {
        self.systems
            .iter()
            .any(|entry| entry.rust_type == TypeId::of::<S>())
    }

    /// Tick every system once, in registration order.
    pub fn update(&mut self, ctx: &mut SystemContext<'_>, dt: f32) {
        for entry in &mut self.systems {
            entry.system.update(ctx, dt);
        }
    }

    /// Run every system's late hook, in registration order.
    pub fn late_update(&mut self, ctx: &mut SystemContext<'_>, dt: f32) {
        for entry in &mut self.systems {
            entry.system.late_update(ctx, dt);
        }
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Type names of the registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|entry| entry.name).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
