//! Ritz: simulation core of a tile-based side scroller.
//!
//! `domain` holds the pure rules (geometry, physics, AI, contact rules),
//! `sim` owns a running session and its tick order, `ui` is the terminal
//! front end used by the binary.

pub mod config;
pub mod domain;
pub mod sim;
pub mod ui;

pub use config::GameConfig;
pub use domain::rules::Controls;
pub use sim::event::{Cue, GameEvent, LevelSignal};
pub use sim::level::{assemble, load_levels, EntitySpawn, Level, LevelData, LevelError};
pub use sim::step::step;
pub use sim::world::{Phase, WorldState};
