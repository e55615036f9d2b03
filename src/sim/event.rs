//! Events emitted during a simulation step.
//! The presentation layer consumes these for score display and sound.

/// Level-transition signal raised by a tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LevelSignal {
    #[default]
    None,
    AdvanceToNext,
    GameOver,
}

/// Fire-and-forget audio cue names.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Cue {
    Jump,
    Shoot,
    Coin,
    BulletHit,
    Death,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    Shot { x: f32, y: f32 },
    CoinCollected { x: f32, y: f32, points: u32 },
    EnemyHit { x: f32, y: f32, points: u32 },
    EnemyKilled { x: f32, y: f32 },
    PlayerKilled { x: f32, y: f32 },
    LifeLost { remaining: u32 },
    PlayerRespawned,
    DoorEntered,
    LevelLoaded { index: usize, name: String },
    GameOver { score: u32 },
    GameComplete { score: u32 },
}

impl GameEvent {
    pub fn cue(&self) -> Option<Cue> {
        match self {
            GameEvent::Jumped => Some(Cue::Jump),
            GameEvent::Shot { .. } => Some(Cue::Shoot),
            GameEvent::CoinCollected { .. } => Some(Cue::Coin),
            GameEvent::EnemyHit { .. } => Some(Cue::BulletHit),
            GameEvent::PlayerKilled { .. } => Some(Cue::Death),
            _ => None,
        }
    }
}
