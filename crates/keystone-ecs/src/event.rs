//! Buffered events, listener registration, and delayed firing.
//!
//! Nothing is delivered when an event is queued. [`EventManager::process_events`]
//! drains the queue in FIFO order, handing each event first to the listeners
//! registered for its type and then to the catch-all listeners.
//!
//! Listeners receive the dispatching manager, so they may queue further events
//! or call `process_events` again. A nested drain is absorbed by the one that is
//! already running: its events are delivered when the outer loop revisits the
//! queue, after everything that was queued before them.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use keystone_ecs::prelude::*;
//!
//! let events = EventManager::new();
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let sink = Rc::clone(&log);
//! events.register_catch_all(listener(move |event, _| {
//!     sink.borrow_mut().push(event.event_type().to_string());
//! }));
//! events.register_listener("ping", listener(|_, events| {
//!     events.queue("pong", EventData::None);
//!     events.process_events();
//! }));
//!
//! events.queue("ping", EventData::None);
//! events.queue("tick", EventData::None);
//! assert_eq!(events.process_events(), 3);
//! assert_eq!(*log.borrow(), vec!["ping", "tick", "pong"]);
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::component::{Component, ComponentTypeId};
use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Events raised by the runtime itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameworkEvent {
    /// Data: [`EventData::Entity`].
    EntityCreated,
    /// All blueprint components are attached and initialised.
    /// Data: [`EventData::Entity`].
    EntityInitialized,
    /// Removal was requested; components are detached at the next cleanup.
    /// Data: [`EventData::Entity`].
    EntityRemoved,
    /// Data: [`EventData::Component`] with a snapshot of the new component.
    ComponentAdded,
    /// Data: [`EventData::Component`] with the removed instance.
    ComponentRemoved,
    /// Data: [`EventData::System`].
    SystemAdded,
    GameStarted,
    GamePaused,
    GameResumed,
}

/// Identifies what kind of thing happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Raised by the runtime.
    Framework(FrameworkEvent),
    /// Raised by game code.
    Named(Cow<'static, str>),
}

impl EventType {
    /// A game-defined event type.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    /// The framework event, if this is one.
    pub fn framework(&self) -> Option<FrameworkEvent> {
        match self {
            Self::Framework(kind) => Some(*kind),
            Self::Named(_) => None,
        }
    }
}

impl From<FrameworkEvent> for EventType {
    fn from(kind: FrameworkEvent) -> Self {
        Self::Framework(kind)
    }
}

impl From<&'static str> for EventType {
    fn from(name: &'static str) -> Self {
        Self::Named(Cow::Borrowed(name))
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::Named(Cow::Owned(name))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Framework(kind) => write!(f, "{kind:?}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Event payloads
// ---------------------------------------------------------------------------

/// Payload of `ComponentAdded` / `ComponentRemoved`.
#[derive(Debug)]
pub struct ComponentEvent {
    pub entity: EntityId,
    pub component_type: ComponentTypeId,
    pub component: Box<dyn Component>,
}

impl ComponentEvent {
    /// The carried component as `T`, if it is one.
    pub fn component_as<T: Component>(&self) -> Option<&T> {
        let component: &dyn Component = &*self.component;
        component.as_any().downcast_ref::<T>()
    }
}

/// Data attached to an [`Event`].
#[derive(Debug, Default)]
pub enum EventData {
    #[default]
    None,
    Entity(EntityId),
    Component(ComponentEvent),
    /// Type name of a system.
    System(&'static str),
    Json(serde_json::Value),
    Any(Box<dyn Any>),
}

impl EventData {
    /// Wrap an arbitrary value.
    pub fn any<T: Any>(value: T) -> Self {
        Self::Any(Box::new(value))
    }

    /// The entity this payload refers to, for entity and component payloads.
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(*id),
            Self::Component(event) => Some(event.entity),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentEvent> {
        match self {
            Self::Component(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The [`EventData::Any`] payload as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Any(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// Something that happened, with optional data. Immutable once built.
#[derive(Debug)]
pub struct Event {
    event_type: EventType,
    data: EventData,
}

impl Event {
    pub fn new(event_type: impl Into<EventType>, data: EventData) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }
}

impl From<EventType> for Event {
    fn from(event_type: EventType) -> Self {
        Self::new(event_type, EventData::None)
    }
}

impl From<FrameworkEvent> for Event {
    fn from(kind: FrameworkEvent) -> Self {
        Self::new(kind, EventData::None)
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A shared event callback. Registrations are matched by `Rc` identity, so
/// keep a clone of the `Rc` to remove it later.
pub type Listener = Rc<dyn Fn(&Event, &EventManager)>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Event, &EventManager) + 'static,
{
    Rc::new(f)
}

/// Which events a listener receives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListenerKey {
    /// Every event, after the type-specific listeners.
    All,
    Type(EventType),
}

/// An event parked until the delta clock reaches `fire_at`.
#[derive(Debug)]
struct DelayedEvent {
    fire_at: f32,
    event: Event,
}

/// Clears the processing flag when the outermost drain ends, even if a
/// listener panics.
struct DrainGuard<'a>(&'a Cell<bool>);

impl<'a> DrainGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ---------------------------------------------------------------------------
// EventManager
// ---------------------------------------------------------------------------

/// Double-buffered event queue with typed and catch-all listeners.
///
/// All methods take `&self` so listeners can call back into the manager
/// while it is dispatching. No internal borrow is held while a listener runs.
#[derive(Default)]
pub struct EventManager {
    /// Events queued since the current batch was taken.
    new_events: RefCell<Vec<Event>>,
    delayed_events: RefCell<Vec<DelayedEvent>>,
    /// Sum of every `dt` fed to `process_events_with_delta`.
    clock: Cell<f32>,
    typed_listeners: RefCell<HashMap<EventType, Vec<Listener>>>,
    catch_all_listeners: RefCell<Vec<Listener>>,
    processing: Cell<bool>,
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("pending", &self.pending_event_count())
            .field("delayed", &self.delayed_event_count())
            .field("clock", &self.clock.get())
            .field("processing", &self.processing.get())
            .finish()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    // -- queueing -----------------------------------------------------------

    /// Queue an event of `event_type` carrying `data`.
    pub fn queue(&self, event_type: impl Into<EventType>, data: EventData) {
        self.queue_event(Event::new(event_type, data));
    }

    /// Queue a prepared event. It is delivered by the next drain.
    pub fn queue_event(&self, event: Event) {
        self.new_events.borrow_mut().push(event);
    }

    /// Park an event until `delay` seconds of `dt` have been fed to
    /// [`process_events_with_delta`](Self::process_events_with_delta).
    pub fn fire_delayed(&self, delay: f32, event_type: impl Into<EventType>, data: EventData) {
        self.fire_delayed_event(delay, Event::new(event_type, data));
    }

    pub fn fire_delayed_event(&self, delay: f32, event: Event) {
        self.delayed_events.borrow_mut().push(DelayedEvent {
            fire_at: self.clock.get() + delay,
            event,
        });
    }

    // -- listeners ----------------------------------------------------------

    /// Register `listener` for events of `event_type`.
    ///
    /// Registering the same listener twice makes it fire twice.
    pub fn register_listener(&self, event_type: impl Into<EventType>, listener: Listener) {
        self.typed_listeners
            .borrow_mut()
            .entry(event_type.into())
            .or_default()
            .push(listener);
    }

    /// Register `listener` for every event.
    pub fn register_catch_all(&self, listener: Listener) {
        self.catch_all_listeners.borrow_mut().push(listener);
    }

    /// Remove one registration of `listener` for `event_type`.
    ///
    /// Returns `false` if it was not registered for that type.
    pub fn remove_listener(&self, event_type: &EventType, listener: &Listener) -> bool {
        let mut typed = self.typed_listeners.borrow_mut();
        let Some(registered) = typed.get_mut(event_type) else {
            return false;
        };
        let removed = remove_last(registered, listener);
        if registered.is_empty() {
            typed.remove(event_type);
        }
        removed
    }

    /// Remove one catch-all registration of `listener`.
    pub fn remove_catch_all(&self, listener: &Listener) -> bool {
        remove_last(&mut self.catch_all_listeners.borrow_mut(), listener)
    }

    /// Number of registrations under `key`.
    pub fn listener_count(&self, key: &ListenerKey) -> usize {
        match key {
            ListenerKey::All => self.catch_all_listeners.borrow().len(),
            ListenerKey::Type(event_type) => self
                .typed_listeners
                .borrow()
                .get(event_type)
                .map_or(0, Vec::len),
        }
    }

    // -- processing ---------------------------------------------------------

    /// Deliver queued events until the queue is empty, returning how many
    /// were delivered.
    ///
    /// Each pass takes the whole queue as the current batch and dispatches it
    /// in order; events queued meanwhile form the next batch. Called from a
    /// listener during a drain, this returns 0 and leaves the new events to
    /// the running drain.
    pub fn process_events(&self) -> usize {
        if self.processing.get() {
            trace!(
                pending = self.new_events.borrow().len(),
                "nested drain deferred to the active one"
            );
            return 0;
        }
        let _guard = DrainGuard::enter(&self.processing);

        let mut delivered = 0;
        loop {
            let current = std::mem::take(&mut *self.new_events.borrow_mut());
            if current.is_empty() {
                break;
            }
            for event in &current {
                self.dispatch(event);
                delivered += 1;
            }
        }
        delivered
    }

    /// Advance delayed events by `dt`, queue the ones that came due, then
    /// drain as [`process_events`](Self::process_events) does.
    ///
    /// Due events keep the order in which they were fired and land behind
    /// anything already queued.
    pub fn process_events_with_delta(&self, dt: f32) -> usize {
        let now = self.clock.get() + dt;
        self.clock.set(now);
        let due: Vec<Event> = {
            let mut delayed = self.delayed_events.borrow_mut();
            let parked = std::mem::take(&mut *delayed);
            let mut due = Vec::new();
            for entry in parked {
                if entry.fire_at <= now {
                    due.push(entry.event);
                } else {
                    delayed.push(entry);
                }
            }
            due
        };
        if !due.is_empty() {
            trace!(count = due.len(), "delayed events came due");
            self.new_events.borrow_mut().extend(due);
        }
        self.process_events()
    }

    fn dispatch(&self, event: &Event) {
        // Snapshot so listeners may (un)register while being called.
        let listeners: Vec<Listener> = {
            let typed = self.typed_listeners.borrow();
            let catch_all = self.catch_all_listeners.borrow();
            let mut snapshot = Vec::with_capacity(catch_all.len());
            if let Some(registered) = typed.get(event.event_type()) {
                snapshot.extend(registered.iter().cloned());
            }
            snapshot.extend(catch_all.iter().cloned());
            snapshot
        };
        trace!(
            event_type = %event.event_type(),
            listeners = listeners.len(),
            "dispatching event"
        );
        for listener in &listeners {
            listener(event, self);
        }
    }

    // -- inspection ---------------------------------------------------------

    /// Events waiting for the next batch.
    pub fn pending_event_count(&self) -> usize {
        self.new_events.borrow().len()
    }

    pub fn delayed_event_count(&self) -> usize {
        self.delayed_events.borrow().len()
    }

    /// Whether a drain is in progress.
    pub fn is_processing(&self) -> bool {
        self.processing.get()
    }

    /// Total `dt` fed to [`process_events_with_delta`](Self::process_events_with_delta).
    pub fn delta_clock(&self) -> f32 {
        self.clock.get()
    }

    /// Drop every queued and delayed event. Listeners stay registered.
    pub fn clear(&self) {
        self.new_events.borrow_mut().clear();
        self.delayed_events.borrow_mut().clear();
    }
}

fn remove_last(registered: &mut Vec<Listener>, listener: &Listener) -> bool {
    match registered.iter().rposition(|l| Rc::ptr_eq(l, listener)) {
        Some(index) => {
            registered.remove(index);
            true
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
