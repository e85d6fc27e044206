//! Key/value attribute sources used to initialise components.
//!
//! Values are [`serde_json::Value`]s so that blueprints and per-entity
//! configuration can be loaded from any serde format. [`LayeredAttributes`]
//! chains several sources; the first layer holding a key wins.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::EcsError;

/// Read-only key/value lookup.
pub trait AttributeSource {
    fn attribute(&self, key: &str) -> Option<&serde_json::Value>;
}

/// Read `key` from `source` as `T`.
///
/// `Ok(None)` if the key is absent; [`EcsError::InvalidAttribute`] if the value
/// does not deserialize as `T`.
pub fn attribute_as<T: DeserializeOwned>(
    source: &dyn AttributeSource,
    key: &str,
) -> Result<Option<T>, EcsError> {
    let Some(value) = source.attribute(key) else {
        return Ok(None);
    };
    serde_json::from_value(value.clone())
        .map(Some)
        .map_err(|e| EcsError::InvalidAttribute {
            key: key.to_owned(),
            details: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// AttributeTable
// ---------------------------------------------------------------------------

/// An owned attribute map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeTable {
    values: HashMap<String, serde_json::Value>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Read `key` as `T`. See [`attribute_as`].
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, EcsError> {
        attribute_as(self, key)
    }

    /// Read `key` as `T`, falling back to `default` when absent.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, EcsError> {
        Ok(self.get_as(key)?.unwrap_or(default))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl AttributeSource for AttributeTable {
    fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)> for AttributeTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// LayeredAttributes
// ---------------------------------------------------------------------------

/// A parent chain of attribute sources, searched front to back.
#[derive(Default)]
pub struct LayeredAttributes<'a> {
    layers: Vec<&'a dyn AttributeSource>,
}

impl<'a> LayeredAttributes<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append a layer, consulted after every existing one.
    pub fn with_layer(mut self, layer: &'a dyn AttributeSource) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl AttributeSource for LayeredAttributes<'_> {
    fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.layers.iter().find_map(|layer| layer.attribute(key))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
