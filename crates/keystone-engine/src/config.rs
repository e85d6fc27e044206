//! Game configuration.

use serde::{Deserialize, Serialize};

/// Settings for a [`Game`](crate::game::Game).
///
/// Loadable from JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Log every delivered event at `debug` level.
    pub trace_events: bool,
    /// Upper bound for the `dt` passed to `update`, in seconds. Must be
    /// positive and finite when set.
    pub max_delta: Option<f32>,
}

impl GameConfig {
    /// Parse a config from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// `dt` after applying [`max_delta`](Self::max_delta). Negative and NaN
    /// deltas become zero.
    pub fn clamp_delta(&self, dt: f32) -> f32 {
        let dt = dt.max(0.0);
        match self.max_delta {
            Some(max) => dt.min(max),
            None => dt,
        }
    }
}
