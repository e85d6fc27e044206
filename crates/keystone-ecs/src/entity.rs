//! Entity identifiers and the entity manager.
//!
//! An [`EntityId`] is a plain integer handle. The [`EntityManager`] issues
//! ids monotonically starting at 1, owns one
//! [`ComponentManager`] per component type, and applies entity removal
//! lazily: [`remove_entity`](EntityManager::remove_entity) only marks the id,
//! and [`clean_up_entities`](EntityManager::clean_up_entities) detaches its
//! components and drops it from the live set.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::attributes::{AttributeSource, LayeredAttributes};
use crate::blueprint::Blueprint;
use crate::component::{Component, ComponentManager, ComponentRegistry, ComponentTypeId};
use crate::event::{EventData, EventManager, FrameworkEvent};
use crate::EcsError;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// An entity identifier. Id 0 is never issued.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityManager
// ---------------------------------------------------------------------------

/// Owns the set of live entities and every component attached to them.
pub struct EntityManager {
    /// Id handed out by the next `create_entity`. Only ever increases.
    next_entity_id: u32,
    live: BTreeSet<EntityId>,
    /// Removal requested, cleanup not yet applied.
    pending_removal: BTreeSet<EntityId>,
    registry: ComponentRegistry,
    managers: BTreeMap<ComponentTypeId, ComponentManager>,
    events: Rc<EventManager>,
}

impl fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityManager")
            .field("next_entity_id", &self.next_entity_id)
            .field("entity_count", &self.live.len())
            .field("pending_removal", &self.pending_removal.len())
            .field("component_types", &self.managers.len())
            .finish()
    }
}

impl EntityManager {
    /// Create an empty manager that reports through `events`.
    pub fn new(events: Rc<EventManager>) -> Self {
        Self {
            next_entity_id: 1,
            live: BTreeSet::new(),
            pending_removal: BTreeSet::new(),
            registry: ComponentRegistry::new(),
            managers: BTreeMap::new(),
            events,
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Issue a new entity id and queue `EntityCreated`.
    pub fn create_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id = self
            .next_entity_id
            .checked_add(1)
            .expect("entity id space exhausted");
        self.live.insert(id);
        self.events
            .queue(FrameworkEvent::EntityCreated, EventData::Entity(id));
        debug!(entity = %id, "entity created");
        id
    }

    /// Create an entity with one default-constructed component per blueprint
    /// component type, then initialise each of them.
    ///
    /// Every component is attached before any is initialised. Initialisation
    /// reads `configuration` first and falls back to the blueprint's own
    /// attributes. `EntityInitialized` is queued once all components are
    /// initialised. If any component fails, the entity is discarded at once
    /// and the error is returned.
    pub fn create_entity_from_blueprint(
        &mut self,
        blueprint: &Blueprint,
        configuration: Option<&dyn AttributeSource>,
    ) -> Result<EntityId, EcsError> {
        let id = self.create_entity();
        if let Err(error) = self.attach_blueprint(id, blueprint, configuration) {
            self.discard_entity(id);
            return Err(error);
        }
        self.events
            .queue(FrameworkEvent::EntityInitialized, EventData::Entity(id));
        Ok(id)
    }

    fn attach_blueprint(
        &mut self,
        id: EntityId,
        blueprint: &Blueprint,
        configuration: Option<&dyn AttributeSource>,
    ) -> Result<(), EcsError> {
        let mut attached = Vec::with_capacity(blueprint.components().len());
        for factory in blueprint.components() {
            let component_type = self
                .registry
                .register_raw(factory.rust_type(), factory.type_name());
            self.manager_for(component_type)
                .add_component(id, factory.create())?;
            attached.push(component_type);
        }

        let mut attributes = LayeredAttributes::new();
        if let Some(configuration) = configuration {
            attributes = attributes.with_layer(configuration);
        }
        let attributes = attributes.with_layer(blueprint.attributes());

        for component_type in attached {
            let Some(manager) = self.managers.get_mut(&component_type) else {
                continue;
            };
            let type_name = manager.type_name();
            if let Some(component) = manager.get_component_mut(id) {
                if let Err(error) = component.init_component(&attributes) {
                    warn!(
                        entity = %id,
                        component = type_name,
                        error = %error,
                        "component initialisation failed"
                    );
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Remove `id` immediately, skipping the pending stage. Queues the same
    /// events as `remove_entity` followed by cleanup.
    fn discard_entity(&mut self, id: EntityId) {
        self.events
            .queue(FrameworkEvent::EntityRemoved, EventData::Entity(id));
        let mut detached = 0usize;
        for manager in self.managers.values_mut() {
            if manager.remove_component(id) {
                detached += 1;
            }
        }
        self.pending_removal.remove(&id);
        self.live.remove(&id);
        debug!(entity = %id, components = detached, "entity discarded");
    }

    /// Request removal of `id`.
    ///
    /// `EntityRemoved` is queued now; components stay attached and the id
    /// stays in the live set until [`clean_up_entities`](Self::clean_up_entities).
    pub fn remove_entity(&mut self, id: EntityId) -> Result<(), EcsError> {
        self.check_entity_id(id)?;
        self.events
            .queue(FrameworkEvent::EntityRemoved, EventData::Entity(id));
        self.pending_removal.insert(id);
        debug!(entity = %id, "entity removal requested");
        Ok(())
    }

    /// Apply pending removals: detach every component of each pending entity
    /// (queueing one `ComponentRemoved` per component) and drop it from the
    /// live set. A no-op when nothing is pending.
    pub fn clean_up_entities(&mut self) {
        if self.pending_removal.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_removal);
        for id in pending {
            let mut detached = 0usize;
            for manager in self.managers.values_mut() {
                if manager.remove_component(id) {
                    detached += 1;
                }
            }
            self.live.remove(&id);
            debug!(entity = %id, components = detached, "entity cleaned up");
        }
    }

    /// Whether `id` is live, after applying pending removals.
    ///
    /// Fails for ids this manager never issued.
    pub fn entity_is_alive(&mut self, id: EntityId) -> Result<bool, EcsError> {
        if id.0 == 0 {
            return Err(self.out_of_range(id));
        }
        self.clean_up_entities();
        if id.0 >= self.next_entity_id {
            return Err(self.out_of_range(id));
        }
        Ok(self.live.contains(&id))
    }

    /// Fail with [`EcsError::EntityRemoved`] unless `id` is live.
    pub fn check_entity_id(&mut self, id: EntityId) -> Result<(), EcsError> {
        if self.entity_is_alive(id)? {
            Ok(())
        } else {
            Err(EcsError::EntityRemoved { id })
        }
    }

    // -- components ---------------------------------------------------------

    /// Attach `component` to `id`.
    ///
    /// Fails if the id was never issued, is removed or pending removal, or
    /// already has a `T`.
    pub fn add_component<T: Component>(
        &mut self,
        id: EntityId,
        component: T,
    ) -> Result<(), EcsError> {
        self.check_entity_id(id)?;
        let component_type = self.registry.register::<T>();
        self.manager_for(component_type)
            .add_component(id, Box::new(component))
    }

    /// Detach the `T` of `id`, returning whether there was one.
    ///
    /// Fails with [`EcsError::UnknownComponentType`] if no entity ever had a
    /// `T`, as opposed to this entity merely lacking one.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Result<bool, EcsError> {
        self.check_entity_id(id)?;
        let manager = self
            .registry
            .lookup::<T>()
            .and_then(|component_type| self.managers.get_mut(&component_type))
            .ok_or(EcsError::UnknownComponentType {
                component: std::any::type_name::<T>(),
            })?;
        Ok(manager.remove_component(id))
    }

    /// The `T` attached to `id`, if any.
    ///
    /// Does not apply pending removals: a removal-pending entity keeps
    /// reporting its components until cleanup runs. Fails once it has.
    pub fn get_component<T: Component>(&self, id: EntityId) -> Result<Option<&T>, EcsError> {
        self.check_readable(id)?;
        Ok(self
            .manager_of::<T>()
            .and_then(|manager| manager.get_component(id))
            .and_then(|component| component.as_any().downcast_ref::<T>()))
    }

    /// Mutable access to the `T` attached to `id`, if any.
    pub fn get_component_mut<T: Component>(
        &mut self,
        id: EntityId,
    ) -> Result<Option<&mut T>, EcsError> {
        self.check_readable(id)?;
        let Some(component_type) = self.registry.lookup::<T>() else {
            return Ok(None);
        };
        Ok(self
            .managers
            .get_mut(&component_type)
            .and_then(|manager| manager.get_component_mut(id))
            .and_then(|component| component.as_any_mut().downcast_mut::<T>()))
    }

    /// Whether `id` currently has a `T` attached.
    pub fn has_component<T: Component>(&self, id: EntityId) -> Result<bool, EcsError> {
        Ok(self.get_component::<T>(id)?.is_some())
    }

    /// Lazily enumerate every `(entity, &T)` pair, in entity-id order.
    ///
    /// Empty if no entity ever had a `T`.
    pub fn components_of_type<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.manager_of::<T>()
            .into_iter()
            .flat_map(|manager| manager.iter())
            .filter_map(|(id, component)| component.as_any().downcast_ref::<T>().map(|c| (id, c)))
    }

    /// Type-erased form of [`components_of_type`](Self::components_of_type).
    pub fn components_of_type_id(
        &self,
        component_type: ComponentTypeId,
    ) -> impl Iterator<Item = (EntityId, &dyn Component)> + '_ {
        self.managers
            .get(&component_type)
            .into_iter()
            .flat_map(|manager| manager.iter())
    }

    /// Token assigned to `T`, if this manager has seen it.
    pub fn component_type_id<T: Component>(&self) -> Option<ComponentTypeId> {
        self.registry.lookup::<T>()
    }

    /// Type name behind a token.
    pub fn component_type_name(&self, component_type: ComponentTypeId) -> Option<&'static str> {
        self.registry.get_info(component_type).map(|info| info.name)
    }

    /// Read-only access to the component type registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // -- queries ------------------------------------------------------------

    /// Snapshot of the live ids, ascending.
    pub fn entities(&self) -> Vec<EntityId> {
        self.live.iter().copied().collect()
    }

    /// Lazily filter the live ids.
    pub fn entities_matching<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = EntityId> + 'a
    where
        P: FnMut(&EntityId) -> bool + 'a,
    {
        self.live.iter().copied().filter(predicate)
    }

    /// Number of live entities, including those pending removal.
    pub fn entity_count(&self) -> usize {
        self.live.len()
    }

    /// The event manager this manager reports through.
    pub fn events(&self) -> &Rc<EventManager> {
        &self.events
    }

    // -- internals ----------------------------------------------------------

    fn check_issued(&self, id: EntityId) -> Result<(), EcsError> {
        if id.0 == 0 || id.0 >= self.next_entity_id {
            Err(self.out_of_range(id))
        } else {
            Ok(())
        }
    }

    /// Issued and not yet cleaned up. Pending removals count as readable.
    fn check_readable(&self, id: EntityId) -> Result<(), EcsError> {
        self.check_issued(id)?;
        if self.live.contains(&id) {
            Ok(())
        } else {
            Err(EcsError::EntityRemoved { id })
        }
    }

    fn out_of_range(&self, id: EntityId) -> EcsError {
        EcsError::EntityIdOutOfRange {
            id,
            next: self.next_entity_id,
        }
    }

    fn manager_of<T: Component>(&self) -> Option<&ComponentManager> {
        self.registry
            .lookup::<T>()
            .and_then(|component_type| self.managers.get(&component_type))
    }

    fn manager_for(&mut self, component_type: ComponentTypeId) -> &mut ComponentManager {
        let type_name = self
            .registry
            .get_info(component_type)
            .map_or("<unregistered>", |info| info.name);
        let events = &self.events;
        self.managers.entry(component_type).or_insert_with(|| {
            debug!(component = type_name, "component manager created");
            ComponentManager::new(component_type, type_name, Rc::clone(events))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{listener, Event};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Position {
        x: f32,
        y: f32,
    }

    impl Component for Position {}

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Health(u32);

    impl Component for Health {}

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Tag;

    impl Component for Tag {}

    fn setup() -> (Rc<EventManager>, EntityManager) {
        let events = Rc::new(EventManager::new());
        let entities = EntityManager::new(Rc::clone(&events));
        (events, entities)
    }

    fn record(events: &EventManager) -> Rc<RefCell<Vec<FrameworkEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        events.register_catch_all(listener(move |event: &Event, _| {
            if let Some(kind) = event.event_type().framework() {
                sink.borrow_mut().push(kind);
            }
        }));
        log
    }

    // -- creation -----------------------------------------------------------

    #[test]
    fn ids_start_at_one_and_increase() {
        let (_events, mut em) = setup();
        let a = em.create_entity();
        let b = em.create_entity();
        assert_eq!(a, EntityId::new(1));
        assert_eq!(b, EntityId::new(2));
        assert_eq!(em.entity_count(), 2);
    }

    #[test]
    fn created_entity_is_alive() {
        let (_events, mut em) = setup();
        let e = em.create_entity();
        assert!(em.entity_is_alive(e).unwrap());
    }

    #[test]
    fn create_queues_entity_created() {
        let (events, mut em) = setup();
        let log = record(&events);
        em.create_entity();
        assert!(log.borrow().is_empty());
        events.process_events();
        assert_eq!(*log.borrow(), vec![FrameworkEvent::EntityCreated]);
    }

    // -- id validation ------------------------------------------------------

    #[test]
    fn unissued_ids_are_out_of_range() {
        let (_events, mut em) = setup();
        em.create_entity();
        assert!(matches!(
            em.entity_is_alive(EntityId::new(0)),
            Err(EcsError::EntityIdOutOfRange { .. })
        ));
        assert!(matches!(
            em.entity_is_alive(EntityId::new(2)),
            Err(EcsError::EntityIdOutOfRange { next: 2, .. })
        ));
        assert!(matches!(
            em.add_component(EntityId::new(7), Health(1)),
            Err(EcsError::EntityIdOutOfRange { .. })
        ));
        assert!(matches!(
            em.get_component::<Health>(EntityId::new(7)),
            Err(EcsError::EntityIdOutOfRange { .. })
        ));
    }

    #[test]
    fn add_to_pending_removal_entity_fails() {
        let (_events, mut em) = setup();
        let e = em.create_entity();
        em.remove_entity(e).unwrap();
        let err = em.add_component(e, Health(3)).unwrap_err();
        assert!(matches!(err, EcsError::EntityRemoved { id } if id == e));
    }

    #[test]
    fn double_remove_fails() {
        let (_events, mut em) = setup();
        let e = em.create_entity();
        em.remove_entity(e).unwrap();
        assert!(matches!(
            em.remove_entity(e),
            Err(EcsError::EntityRemoved { .. })
        ));
    }

    // -- components ---------------------------------------------------------

    #[test]
    fn add_and_get_component() {
        let (_events, mut em) = setup();
        let e = em.create_entity();
        em.add_component(e, Position { x: 1.0, y: 2.0 }).unwrap();
        assert_eq!(
            em.get_component::<Position>(e).unwrap(),
            Some(&Position { x: 1.0, y: 2.0 })
        );
        assert_eq!(em.get_component::<Health>(e).unwrap(), None);
        assert!(em.has_component::<Position>(e).unwrap());
    }

    #[test]
    fn duplicate_component_rejected() {
        let (_events, mut em) = setup();
        let e = em.create_entity();
        em.add_component(e, Health(10)).unwrap();
        let err = em.add_component(e, Health(99)).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { .. }));
        assert_eq!(em.get_component::<Health>(e).unwrap(), Some(&Health(10)));
    }

    #[test]
    fn get_component_mut_modifies() {
        let (_events, mut em) = setup();
        let e = em.create_entity();
        em.add_component(e, Health(10)).unwrap();
        if let Some(health) = em.get_component_mut::<Health>(e).unwrap() {
            health.0 -= 3;
        }
        assert_eq!(em.get_component::<Health>(e).unwrap(), Some(&Health(7)));
    }

    #[test]
    fn remove_component_distinguishes_unknown_type_from_missing() {
        let (_events, mut em) = setup();
        let a = em.create_entity();
        let b = em.create_entity();

        assert!(matches!(
            em.remove_component::<Health>(a),
            Err(EcsError::UnknownComponentType { .. })
        ));

        em.add_component(a, Health(1)).unwrap();
        assert!(!em.remove_component::<Health>(b).unwrap());
        assert!(em.remove_component::<Health>(a).unwrap());
        assert!(!em.remove_component::<Health>(a).unwrap());
    }

    #[test]
    fn components_of_type_enumerates_current_state() {
        let (_events, mut em) = setup();
        assert_eq!(em.components_of_type::<Health>().count(), 0);

        let a = em.create_entity();
        let b = em.create_entity();
        let c = em.create_entity();
        em.add_component(a, Health(1)).unwrap();
        em.add_component(c, Health(3)).unwrap();
        em.add_component(b, Tag).unwrap();

        let found: Vec<_> = em
            .components_of_type::<Health>()
            .map(|(id, h)| (id, h.0))
            .collect();
        assert_eq!(found, vec![(a, 1), (c, 3)]);

        let tag_type = em.component_type_id::<Tag>().unwrap();
        assert_eq!(em.components_of_type_id(tag_type).count(), 1);
        assert!(em.component_type_name(tag_type).unwrap().ends_with("Tag"));
    }

    // -- deferred removal ---------------------------------------------------

    #[test]
    fn removal_is_deferred_until_cleanup() {
        let (_events, mut em) = setup();
        let e = em.create_entity();
        em.add_component(e, Health(5)).unwrap();
        em.remove_entity(e).unwrap();

        // Still attached and still counted.
        assert_eq!(em.get_component::<Health>(e).unwrap(), Some(&Health(5)));
        assert_eq!(em.entity_count(), 1);

        em.clean_up_entities();
        assert!(matches!(
            em.get_component::<Health>(e),
            Err(EcsError::EntityRemoved { id }) if id == e
        ));
        assert!(matches!(
            em.get_component_mut::<Health>(e),
            Err(EcsError::EntityRemoved { .. })
        ));
        assert!(!em.entity_is_alive(e).unwrap());
        assert_eq!(em.entity_count(), 0);
    }

    #[test]
    fn cleaned_up_entity_fails_reads_and_writes_alike() {
        let (_events, mut em) = setup();
        let e = em.create_entity();
        em.add_component(e, Health(5)).unwrap();
        em.remove_entity(e).unwrap();
        em.clean_up_entities();

        assert!(matches!(em.has_component::<Health>(e), Err(EcsError::EntityRemoved { .. })));
        assert!(matches!(em.remove_component::<Health>(e), Err(EcsError::EntityRemoved { .. })));
        // Never-attached types fail the same way.
        assert!(matches!(em.get_component::<Tag>(e), Err(EcsError::EntityRemoved { .. })));
    }

    #[test]
    fn liveness_check_applies_pending_removals() {
        let (_events, mut em) = setup();
        let e = em.create_entity();
        em.add_component(e, Health(5)).unwrap();
        em.remove_entity(e).unwrap();

        assert!(!em.entity_is_alive(e).unwrap());
        assert!(em.get_component::<Health>(e).is_err());
    }

    #[test]
    fn cleanup_emits_one_removed_event_per_component() {
        let (events, mut em) = setup();
        let e = em.create_entity();
        em.add_component(e, Health(1)).unwrap();
        em.add_component(e, Position::default()).unwrap();
        em.add_component(e, Tag).unwrap();
        let other = em.create_entity();
        em.add_component(other, Health(2)).unwrap();
        events.process_events();

        let log = record(&events);
        em.remove_entity(e).unwrap();
        em.clean_up_entities();
        events.process_events();

        let removed = log
            .borrow()
            .iter()
            .filter(|k| **k == FrameworkEvent::ComponentRemoved)
            .count();
        assert_eq!(removed, 3);
        assert_eq!(log.borrow()[0], FrameworkEvent::EntityRemoved);
        assert_eq!(em.get_component::<Health>(other).unwrap(), Some(&Health(2)));
    }

    #[test]
    fn cleanup_with_nothing_pending_is_noop() {
        let (events, mut em) = setup();
        em.create_entity();
        events.process_events();
        em.clean_up_entities();
        em.clean_up_entities();
        assert_eq!(events.pending_event_count(), 0);
        assert_eq!(em.entity_count(), 1);
    }

    #[test]
    fn removed_ids_are_never_reissued() {
        let (_events, mut em) = setup();
        let a = em.create_entity();
        em.remove_entity(a).unwrap();
        em.clean_up_entities();
        let b = em.create_entity();
        assert!(b > a);
    }

    // -- blueprints ---------------------------------------------------------

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Speed(f32);

    impl Component for Speed {
        fn init_component(&mut self, attributes: &dyn AttributeSource) -> Result<(), EcsError> {
            self.0 = crate::attributes::attribute_as(attributes, "speed")?.unwrap_or(1.0);
            Ok(())
        }
    }

    #[test]
    fn failed_blueprint_creation_leaves_no_entity() {
        let (events, mut em) = setup();
        let log = record(&events);
        let blueprint = Blueprint::new()
            .with_component::<Health>()
            .with_component::<Speed>()
            .with_attribute("speed", "fast");

        assert!(em.create_entity_from_blueprint(&blueprint, None).is_err());
        assert_eq!(em.entity_count(), 0);
        assert!(em.entities().is_empty());
        assert_eq!(em.components_of_type::<Speed>().count(), 0);
        assert_eq!(em.components_of_type::<Health>().count(), 0);
        assert!(matches!(
            em.entity_is_alive(EntityId::new(1)),
            Ok(false)
        ));

        events.process_events();
        let log = log.borrow();
        assert!(!log.contains(&FrameworkEvent::EntityInitialized));
        assert_eq!(
            log.iter().filter(|k| **k == FrameworkEvent::ComponentRemoved).count(),
            2
        );
        assert_eq!(log.iter().filter(|k| **k == FrameworkEvent::EntityRemoved).count(), 1);

        // The id is spent; the next entity gets a fresh one.
        assert_eq!(em.create_entity(), EntityId::new(2));
    }

    // -- queries ------------------------------------------------------------

    #[test]
    fn registry_and_events_accessors() {
        let (events, mut em) = setup();
        assert!(em.registry().is_empty());
        let e = em.create_entity();
        em.add_component(e, Health(1)).unwrap();
        em.add_component(e, Tag).unwrap();

        assert_eq!(em.registry().len(), 2);
        let health = em.component_type_id::<Health>().unwrap();
        assert_eq!(em.registry().get_info(health).map(|info| info.id), Some(health));
        assert!(Rc::ptr_eq(em.events(), &events));
        assert_eq!(em.events().pending_event_count(), 3);
    }

    #[test]
    fn entities_snapshot_and_filter() {
        let (_events, mut em) = setup();
        assert!(em.entities().is_empty());
        let ids: Vec<_> = (0..5).map(|_| em.create_entity()).collect();
        assert_eq!(em.entities(), ids);

        let odd: Vec<_> = em.entities_matching(|id| id.raw() % 2 == 1).collect();
        assert_eq!(odd, vec![ids[0], ids[2], ids[4]]);
    }
}
