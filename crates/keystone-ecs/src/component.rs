//! Component capability contract, type tokens, and per-type storage.
//!
//! A component is any `'static` value implementing [`Component`]. The first
//! time an [`EntityManager`](crate::entity::EntityManager) sees a concrete
//! component type it assigns it a [`ComponentTypeId`] through its
//! [`ComponentRegistry`] and creates one [`ComponentManager`] for it. That
//! manager owns every instance of the type, at most one per entity.

use std::any::{Any, TypeId};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::attributes::AttributeSource;
use crate::entity::EntityId;
use crate::event::{ComponentEvent, EventData, EventManager, FrameworkEvent};
use crate::EcsError;

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Upcast to [`Any`] for typed access to type-erased components and systems.
///
/// Implemented for every `'static` type. Call it on the trait object
/// (`&dyn Component`, `&dyn System`), not on the `Box` holding it.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Object-safe cloning for components, implemented for every
/// `Component + Clone`.
pub trait CloneComponent {
    fn clone_component(&self) -> Box<dyn Component>;
}

impl<T> CloneComponent for T
where
    T: Component + Clone,
{
    fn clone_component(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

/// A unit of entity data.
///
/// The only capability the runtime requires is initialisation from an
/// attribute source, which happens exactly once when the component is created
/// from a [`Blueprint`](crate::blueprint::Blueprint). Components attached with
/// [`EntityManager::add_component`](crate::entity::EntityManager::add_component)
/// are never initialised by the runtime.
pub trait Component: AsAny + CloneComponent + fmt::Debug {
    /// Initialise this component from layered attributes.
    ///
    /// The default does nothing, for components without configurable state.
    fn init_component(&mut self, attributes: &dyn AttributeSource) -> Result<(), EcsError> {
        let _ = attributes;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque, lightweight identifier for a component type seen by an entity
/// manager.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub(crate) u32);

impl ComponentTypeId {
    /// Raw index of this token within its registry.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Metadata about a registered component type.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// Token assigned at registration time.
    pub id: ComponentTypeId,
    /// `std::any::type_name` of the component.
    pub name: &'static str,
    /// Rust `TypeId` for runtime type checking.
    pub type_id: TypeId,
}

/// Registry mapping Rust types to [`ComponentTypeId`]s.
///
/// Registration is idempotent: registering a type again returns its existing
/// token.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentTypeId>,
    /// Indexed by `ComponentTypeId.0`.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, returning its token.
    pub fn register<T: Component>(&mut self) -> ComponentTypeId {
        self.register_raw(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Register a type by its `TypeId` and name. Used by
    /// [`ComponentFactory`](crate::blueprint::ComponentFactory) instantiation.
    pub(crate) fn register_raw(&mut self, type_id: TypeId, name: &'static str) -> ComponentTypeId {
        if let Some(&existing) = self.by_type.get(&type_id) {
            return existing;
        }
        let id = ComponentTypeId(self.infos.len() as u32);
        self.infos.push(ComponentInfo { id, name, type_id });
        self.by_type.insert(type_id, id);
        id
    }

    /// Look up the token of `T` without registering it.
    pub fn lookup<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Metadata for a registered token.
    pub fn get_info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.0 as usize)
    }

    /// Number of registered component types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether no component types have been registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ComponentManager
// ---------------------------------------------------------------------------

/// Storage for every instance of one component type, keyed by entity.
///
/// Add and remove operations queue `ComponentAdded` / `ComponentRemoved`
/// events; nothing is delivered until the event manager is drained.
pub struct ComponentManager {
    component_type: ComponentTypeId,
    type_name: &'static str,
    /// Ordered by entity id so enumeration is deterministic.
    components: BTreeMap<EntityId, Box<dyn Component>>,
    events: Rc<EventManager>,
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("component_type", &self.component_type)
            .field("type_name", &self.type_name)
            .field("len", &self.components.len())
            .finish()
    }
}

impl ComponentManager {
    /// Create an empty manager for one component type.
    pub fn new(
        component_type: ComponentTypeId,
        type_name: &'static str,
        events: Rc<EventManager>,
    ) -> Self {
        Self {
            component_type,
            type_name,
            components: BTreeMap::new(),
            events,
        }
    }

    /// The component type this manager stores.
    pub fn component_type(&self) -> ComponentTypeId {
        self.component_type
    }

    /// Type name of the stored component type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Attach `component` to `entity`.
    ///
    /// Fails with [`EcsError::DuplicateComponent`] if the entity already has a
    /// component here; the existing instance is left untouched. On success a
    /// `ComponentAdded` event carrying a snapshot of the component is queued.
    pub fn add_component(
        &mut self,
        entity: EntityId,
        component: Box<dyn Component>,
    ) -> Result<(), EcsError> {
        match self.components.entry(entity) {
            Entry::Occupied(_) => Err(EcsError::DuplicateComponent {
                entity,
                component: self.type_name,
            }),
            Entry::Vacant(slot) => {
                let snapshot = component.clone_component();
                slot.insert(component);
                self.events.queue(
                    FrameworkEvent::ComponentAdded,
                    EventData::Component(ComponentEvent {
                        entity,
                        component_type: self.component_type,
                        component: snapshot,
                    }),
                );
                Ok(())
            }
        }
    }

    /// Detach the component of `entity`, if any.
    ///
    /// Returns whether a component was removed. The removed instance travels
    /// with the queued `ComponentRemoved` event.
    pub fn remove_component(&mut self, entity: EntityId) -> bool {
        match self.components.remove(&entity) {
            Some(component) => {
                self.events.queue(
                    FrameworkEvent::ComponentRemoved,
                    EventData::Component(ComponentEvent {
                        entity,
                        component_type: self.component_type,
                        component,
                    }),
                );
                true
            }
            None => false,
        }
    }

    /// The component attached to `entity`, if any.
    pub fn get_component(&self, entity: EntityId) -> Option<&dyn Component> {
        self.components.get(&entity).map(|c| &**c)
    }

    /// Mutable access to the component attached to `entity`, if any.
    pub fn get_component_mut(&mut self, entity: EntityId) -> Option<&mut dyn Component> {
        match self.components.get_mut(&entity) {
            Some(c) => Some(&mut **c),
            None => None,
        }
    }

    /// Whether `entity` has a component here.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.components.contains_key(&entity)
    }

    /// Lazily enumerate `(entity, component)` pairs in entity-id order.
    ///
    /// Every call starts a fresh pass over the current contents.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &dyn Component)> + '_ {
        self.components
            .iter()
            .map(|(id, c)| -> (EntityId, &dyn Component) { (*id, &**c) })
    }

    /// Number of attached components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no components are attached.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
