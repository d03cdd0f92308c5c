//! Session state and the global engine container.
//!
//! Uses `thread_local!` + `RefCell` for safe mutable access in single-threaded
//! WASM. The Web Worker keeps the module alive, so the engine survives across
//! `handle_request` calls until the host deactivates or replaces it.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::game::engine::Engine;

/// Session controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineState {
    /// Sequence chosen, nothing happening yet.
    Waiting,
    Countdown,
    /// Sequence being presented; input locked.
    Playing,
    /// Awaiting ordered activations.
    Listening,
    /// Transient: out-of-order activation.
    OrderError,
    /// Transient: full sequence matched.
    Celebration,
    /// Transient: pause before the next round.
    RoundTransition,
    PhaseComplete,
    GameComplete,
}

/// The live round: which tokens are being learned and how far the learner got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    pub phase: String,
    /// 1..=3
    pub round: u8,
    pub sequence: Vec<String>,
    /// Tokens accepted so far this round; always a prefix of `sequence`.
    pub player_input: Vec<String>,
    pub machine_state: MachineState,
    /// Tokens already presented by the current playback.
    pub sequence_items_shown: usize,
    /// 0 when no countdown is running.
    pub countdown_remaining: u32,
}

impl GameSession {
    pub fn new(phase: &str, round: u8, sequence: Vec<String>) -> Self {
        Self {
            phase: phase.to_string(),
            round,
            sequence,
            player_input: Vec::new(),
            machine_state: MachineState::Waiting,
            sequence_items_shown: 0,
            countdown_remaining: 0,
        }
    }

    /// Index the learner has to activate next.
    pub fn expected_index(&self) -> usize {
        self.player_input.len()
    }

    pub fn is_sequence_complete(&self) -> bool {
        !self.sequence.is_empty() && self.player_input.len() == self.sequence.len()
    }

    /// Structural invariants a restored session must satisfy.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.sequence.is_empty() {
            return Err("sequence is empty".to_string());
        }
        if self.player_input.len() > self.sequence.len() {
            return Err(format!(
                "playerInput has {} tokens but sequence only {}",
                self.player_input.len(),
                self.sequence.len()
            ));
        }
        if !self.sequence.starts_with(&self.player_input) {
            return Err("playerInput is not a prefix of sequence".to_string());
        }
        if self.sequence_items_shown > self.sequence.len() {
            return Err(format!(
                "sequenceItemsShown {} exceeds sequence length {}",
                self.sequence_items_shown,
                self.sequence.len()
            ));
        }
        Ok(())
    }
}

/// Notifications that must reach the host exactly once, even across a reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneShotFlags {
    pub phase_just_completed: bool,
    pub last_completed_phase: Option<String>,
    pub game_just_completed: bool,
}

thread_local! {
    static ENGINE: RefCell<Engine> = RefCell::new(Engine::default());
}

/// Execute a closure with read access to the engine.
pub fn with_engine<F, R>(f: F) -> R
where
    F: FnOnce(&Engine) -> R,
{
    ENGINE.with(|e| f(&e.borrow()))
}

/// Execute a closure with mutable access to the engine.
pub fn with_engine_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Engine) -> R,
{
    ENGINE.with(|e| f(&mut e.borrow_mut()))
}

/// Replace the engine (new catalog, tests).
pub fn replace_engine(engine: Engine) {
    ENGINE.with(|e| {
        *e.borrow_mut() = engine;
    });
}

/// Reset to an inactive engine with the built-in catalog.
pub fn reset_engine() {
    replace_engine(Engine::default());
}
