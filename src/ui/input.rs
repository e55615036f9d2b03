//! Keyboard state tracker.
//!
//! Turns the terminal's key stream into a per-tick `Controls` snapshot:
//!   - held keys drive walking, jumping and door entry
//!   - release edges drive firing (a shot leaves when space goes up)
//!
//! Release events come from crossterm's keyboard enhancement when the
//! terminal supports it. Otherwise a key counts as released once no
//! Press/Repeat has arrived for `HOLD_TIMEOUT`.
//!
//! ## Key map
//!   A / ←        walk left         D / →       walk right
//!   W / ↑        jump              S / ↓       enter door
//!   Space        fire on release   Q / Esc     quit

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::rules::Controls;

/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const ENTER: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const FIRE: &[KeyCode] = &[KeyCode::Char(' ')];
const QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of the last Press/Repeat per held key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went up since the last `take_controls`.
    releases: Vec<KeyCode>,
    /// Keys that went down during the last drain.
    presses: Vec<KeyCode>,
    ctrl_c: bool,
    /// Trust explicit Release events. Only set when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl Default for InputState {
    fn default() -> Self {
        InputState::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            releases: Vec::with_capacity(8),
            presses: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain pending terminal events without blocking.
    /// Call once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
        }
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                if self.last_active.remove(&key.code).is_some() {
                    self.releases.push(key.code);
                }
            }
            // without enhancement, rely on the timeout instead
            KeyEventKind::Release => {}
            _ => {
                if self.last_active.insert(key.code, now).is_none() {
                    self.presses.push(key.code);
                }
            }
        }
    }

    /// Keys silent for longer than the hold timeout count as released.
    fn expire(&mut self, now: Instant) {
        let releases = &mut self.releases;
        self.last_active.retain(|code, t| {
            let held = now.duration_since(*t) < HOLD_TIMEOUT;
            if !held {
                releases.push(*code);
            }
            held
        });
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.contains_key(&code)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Went down during the last drain.
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.presses.contains(c))
    }

    /// Snapshot for one tick. Consumes pending release edges, so a
    /// release that lands between ticks is seen by exactly one tick.
    pub fn take_controls(&mut self) -> Controls {
        let fire_released = self.releases.iter().any(|c| FIRE.contains(c));
        self.releases.clear();
        Controls {
            left: self.any_held(LEFT),
            right: self.any_held(RIGHT),
            jump: self.any_held(JUMP),
            fire_released,
            enter: self.any_held(ENTER),
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.ctrl_c || self.any_pressed(QUIT)
    }
}
