//! Keystone Engine -- game loop and composition root on top of [`keystone_ecs`].
//!
//! [`Game`](game::Game) owns one event, entity, system and blueprint manager
//! and runs the per-tick sequence: systems, late hooks, event drain, entity
//! cleanup, then time accumulation.
//!
//! # Quick Start
//!
//! ```
//! use keystone_engine::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Score(u32);
//! impl Component for Score {}
//!
//! struct Scoring;
//! impl System for Scoring {
//!     fn update(&mut self, ctx: &mut SystemContext<'_>, _dt: f32) {
//!         let ids = ctx.entities.entities();
//!         for id in ids {
//!             if let Ok(Some(score)) = ctx.entities.get_component_mut::<Score>(id) {
//!                 score.0 += 1;
//!             }
//!         }
//!     }
//! }
//!
//! let mut game = Game::default();
//! game.add_system(Scoring).unwrap();
//! let player = game.entity_manager_mut().create_entity();
//! game.entity_manager_mut().add_component(player, Score(0)).unwrap();
//!
//! game.start_game();
//! for _ in 0..3 {
//!     game.update(1.0 / 60.0);
//! }
//! let score = game.entity_manager().get_component::<Score>(player).unwrap();
//! assert_eq!(score.map(|s| s.0), Some(3));
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod game;
pub mod logging;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use keystone_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use keystone_ecs::prelude::*;

    pub use crate::config::GameConfig;
    pub use crate::game::{Game, GameState};
    pub use crate::logging::init_tracing;
}
