//! WorldState: a running session.
//!
//! Holds the live level plus everything that outlives it: the level set,
//! score, lives, the session RNG and the camera. `step` advances it one
//! tick; level swaps happen between ticks through `apply_signal`.
//!
//! ## Phases
//!   - `Playing`:  normal ticks
//!   - `Dying`:    player dead, world still ticking, respawn countdown running
//!   - `GameOver`: out of lives; ticks are no-ops
//!   - `Complete`: walked through the last door; ticks are no-ops

use fastrand::Rng;

use crate::config::GameConfig;
use crate::domain::entity::Actor;
use super::camera::Camera;
use super::event::{GameEvent, LevelSignal};
use super::level::{assemble, Level, LevelData, LevelError};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Dying,
    GameOver,
    Complete,
}

pub struct WorldState {
    pub config: GameConfig,
    levels: Vec<LevelData>,
    pub level_index: usize,
    pub level: Level,
    pub score: u32,
    pub lives: u32,
    pub phase: Phase,
    pub camera: Camera,
    pub tick: u64,
    /// Ticks left before a dead player loses a life and respawns.
    pub respawn_timer: u32,
    /// Raised by the last tick, consumed by `apply_signal`.
    pub signal: LevelSignal,
    pub rng: Rng,
}

impl WorldState {
    /// Start a session on the first level. Every level is validated up
    /// front so a broken later level fails here, not mid-game.
    pub fn new(levels: Vec<LevelData>, config: GameConfig) -> Result<Self, LevelError> {
        let mut rng = match config.seed {
            Some(seed) => Rng::with_seed(seed),
            None => Rng::new(),
        };
        let first = levels.first().ok_or(LevelError::NoLevels)?;
        for data in levels.iter().skip(1) {
            assemble(data, &config, &mut rng.fork())?;
        }
        let level = assemble(first, &config, &mut rng)?;
        log::info!("starting session with {} levels", levels.len());

        let mut world = WorldState {
            camera: Camera::new(config.viewport),
            lives: config.player.lives,
            config,
            levels,
            level_index: 0,
            level,
            score: 0,
            phase: Phase::Playing,
            tick: 0,
            respawn_timer: 0,
            signal: LevelSignal::None,
            rng,
        };
        world.update_camera();
        Ok(world)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Still accepting ticks.
    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Playing | Phase::Dying)
    }

    /// Act on the signal raised by the last tick and clear it.
    pub fn apply_signal(&mut self) -> Result<Vec<GameEvent>, LevelError> {
        match std::mem::take(&mut self.signal) {
            LevelSignal::AdvanceToNext => self.advance_level(),
            // game over is settled inside the tick that ran out of lives
            LevelSignal::GameOver | LevelSignal::None => Ok(Vec::new()),
        }
    }

    /// Load the next level, carrying the score. Past the last level the
    /// run is complete.
    pub fn advance_level(&mut self) -> Result<Vec<GameEvent>, LevelError> {
        let next = self.level_index + 1;
        let Some(data) = self.levels.get(next) else {
            self.phase = Phase::Complete;
            log::info!("all {} levels cleared, final score {}", self.levels.len(), self.score);
            return Ok(vec![GameEvent::GameComplete { score: self.score }]);
        };
        self.level = assemble(data, &self.config, &mut self.rng)?;
        self.level_index = next;
        self.phase = Phase::Playing;
        self.respawn_timer = 0;
        self.update_camera();
        log::info!("entering level {} ({:?}) with score {}", next + 1, self.level.name, self.score);
        Ok(vec![GameEvent::LevelLoaded { index: next, name: self.level.name.clone() }])
    }

    /// Fresh player at the level start. Enemies keep their state.
    pub fn respawn_player(&mut self) {
        self.level.player = Actor::player(self.level.start);
        self.phase = Phase::Playing;
        self.respawn_timer = 0;
        self.update_camera();
    }

    /// Follow the player; the view holds still while it is dead.
    pub fn update_camera(&mut self) {
        let player = &self.level.player;
        if player.is_alive() {
            let map = self.level.grid.size_in_pixels();
            self.camera.follow(player.rect.center(), map);
        }
    }
}
