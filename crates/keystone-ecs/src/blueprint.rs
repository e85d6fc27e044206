//! Entity templates: which components an entity gets and their default
//! attribute values.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use crate::attributes::AttributeTable;
use crate::component::Component;
use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentFactory
// ---------------------------------------------------------------------------

fn create_default<T: Component + Default>() -> Box<dyn Component> {
    Box::new(T::default())
}

/// Creates default-constructed instances of one component type.
#[derive(Clone, Copy)]
pub struct ComponentFactory {
    rust_type: TypeId,
    type_name: &'static str,
    create: fn() -> Box<dyn Component>,
}

impl ComponentFactory {
    pub fn of<T: Component + Default>() -> Self {
        Self {
            rust_type: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            create: create_default::<T>,
        }
    }

    pub fn rust_type(&self) -> TypeId {
        self.rust_type
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn create(&self) -> Box<dyn Component> {
        (self.create)()
    }
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentFactory")
            .field(&self.type_name)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

/// Component types plus default attributes for new entities.
///
/// ```
/// use keystone_ecs::prelude::*;
///
/// #[derive(Debug, Clone, Default)]
/// struct Health(u32);
///
/// impl Component for Health {
///     fn init_component(&mut self, attributes: &dyn AttributeSource) -> Result<(), EcsError> {
///         self.0 = attribute_as(attributes, "hp")?.unwrap_or(1);
///         Ok(())
///     }
/// }
///
/// let blueprint = Blueprint::new()
///     .with_component::<Health>()
///     .with_attribute("hp", 40);
/// assert_eq!(blueprint.components().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Blueprint {
    components: Vec<ComponentFactory>,
    attributes: AttributeTable,
}

impl Blueprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `T` to the component list. Adding a type twice has no effect.
    pub fn with_component<T: Component + Default>(mut self) -> Self {
        self.add_component(ComponentFactory::of::<T>());
        self
    }

    pub fn add_component(&mut self, factory: ComponentFactory) {
        if !self
            .components
            .iter()
            .any(|existing| existing.rust_type == factory.rust_type)
        {
            self.components.push(factory);
        }
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.set(key, value);
        self
    }

    pub fn with_attributes(mut self, attributes: AttributeTable) -> Self {
        self.attributes = attributes;
        self
    }

    /// Component factories in declaration order.
    pub fn components(&self) -> &[ComponentFactory] {
        &self.components
    }

    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeTable {
        &mut self.attributes
    }
}

// ---------------------------------------------------------------------------
// BlueprintManager
// ---------------------------------------------------------------------------

/// Blueprints by id.
#[derive(Debug, Default)]
pub struct BlueprintManager {
    blueprints: HashMap<String, Blueprint>,
}

impl BlueprintManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `blueprint` under `id`. Ids are unique.
    pub fn add_blueprint(
        &mut self,
        id: impl Into<String>,
        blueprint: Blueprint,
    ) -> Result<(), EcsError> {
        let id = id.into();
        if self.blueprints.contains_key(&id) {
            return Err(EcsError::DuplicateBlueprint { id });
        }
        self.blueprints.insert(id, blueprint);
        Ok(())
    }

    pub fn get_blueprint(&self, id: &str) -> Result<&Blueprint, EcsError> {
        self.blueprints
            .get(id)
            .ok_or_else(|| EcsError::BlueprintNotFound { id: id.to_owned() })
    }

    pub fn remove_blueprint(&mut self, id: &str) -> Option<Blueprint> {
        self.blueprints.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blueprints.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
