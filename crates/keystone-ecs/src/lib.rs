//! Keystone ECS -- entity/component/event runtime with deferred removal.
//!
//! This crate provides the bookkeeping and dispatch core of the Keystone
//! framework. Entities are plain integer ids. Components live in one
//! [`ComponentManager`](component::ComponentManager) per concrete component
//! type, owned by the [`EntityManager`](entity::EntityManager). Every
//! lifecycle change is reported through the
//! [`EventManager`](event::EventManager), which buffers events until
//! [`process_events`](event::EventManager::process_events) drains them.
//!
//! # Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use keystone_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! struct Health(u32);
//!
//! impl Component for Health {}
//!
//! let events = Rc::new(EventManager::new());
//! let mut entities = EntityManager::new(Rc::clone(&events));
//!
//! let entity = entities.create_entity();
//! entities.add_component(entity, Health(100)).unwrap();
//! assert_eq!(entities.get_component::<Health>(entity).unwrap(), Some(&Health(100)));
//!
//! // EntityCreated + ComponentAdded
//! assert_eq!(events.process_events(), 2);
//! ```

#![deny(unsafe_code)]

pub mod attributes;
pub mod blueprint;
pub mod component;
pub mod entity;
pub mod event;
pub mod system;

use entity::EntityId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The id was never issued by this entity manager.
    #[error("entity id {id} is out of range (next id to be issued is {next})")]
    EntityIdOutOfRange { id: EntityId, next: u32 },

    /// The entity was removed (or is pending removal).
    #[error("entity {id} has already been removed")]
    EntityRemoved { id: EntityId },

    /// The entity already carries a component of this type.
    #[error("entity {entity} already has a component of type '{component}'")]
    DuplicateComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// No component manager was ever created for this type.
    #[error("component type '{component}' has never been added to any entity")]
    UnknownComponentType { component: &'static str },

    /// A system of this concrete type is already registered.
    #[error("system '{system}' is already registered")]
    DuplicateSystem { system: &'static str },

    /// No system of this concrete type was registered.
    #[error("system '{system}' is not registered")]
    SystemNotRegistered { system: &'static str },

    /// An attribute value could not be converted to the requested type.
    #[error("invalid value for attribute '{key}': {details}")]
    InvalidAttribute { key: String, details: String },

    /// A blueprint with this id is already registered.
    #[error("blueprint '{id}' is already registered")]
    DuplicateBlueprint { id: String },

    /// No blueprint with this id is registered.
    #[error("blueprint '{id}' not found")]
    BlueprintNotFound { id: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::attributes::{attribute_as, AttributeSource, AttributeTable, LayeredAttributes};
    pub use crate::blueprint::{Blueprint, BlueprintManager, ComponentFactory};
    pub use crate::component::{
        AsAny, Component, ComponentManager, ComponentRegistry, ComponentTypeId,
    };
    pub use crate::entity::{EntityId, EntityManager};
    pub use crate::event::{
        listener, ComponentEvent, Event, EventData, EventManager, EventType, FrameworkEvent,
        Listener, ListenerKey,
    };
    pub use crate::system::{System, SystemContext, SystemManager};
    pub use crate::EcsError;
}
