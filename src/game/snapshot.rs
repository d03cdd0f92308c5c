//! Snapshot codec: the flat record a host stores to survive a reload.
//!
//! A snapshot is taken after every state-affecting transition and consumed
//! once when an engine activates. The host persists it as URL-safe base64
//! (same as the player document in localStorage) or as plain JSON.
//!
//! ## Shape
//!
//! ```text
//! {
//!   phase, round, sequence, playerInput, machineState,
//!   sequenceItemsShown, countdownRemaining,
//!   roundActivation: {"phase/syllable": bool},
//!   masteryActivation: {"phase/syllable": bool},
//!   phaseJustCompleted, lastCompletedPhase, gameJustCompleted
//! }
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{ROUNDS, SequenceCatalog};
use crate::error::{EngineError, EngineResult};
use crate::game::progress::ProgressMaps;
use crate::game::state::{GameSession, MachineState, OneShotFlags};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: String,
    pub round: u8,
    pub sequence: Vec<String>,
    pub player_input: Vec<String>,
    pub machine_state: MachineState,
    #[serde(default)]
    pub sequence_items_shown: usize,
    #[serde(default)]
    pub countdown_remaining: u32,
    #[serde(default)]
    pub round_activation: BTreeMap<String, bool>,
    #[serde(default)]
    pub mastery_activation: BTreeMap<String, bool>,
    #[serde(default)]
    pub phase_just_completed: bool,
    #[serde(default)]
    pub last_completed_phase: Option<String>,
    #[serde(default)]
    pub game_just_completed: bool,
}

/// Everything an engine needs back from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    pub session: GameSession,
    pub progress: ProgressMaps,
    pub flags: OneShotFlags,
}

impl Snapshot {
    pub fn capture(session: &GameSession, progress: &ProgressMaps, flags: &OneShotFlags) -> Self {
        Self {
            phase: session.phase.clone(),
            round: session.round,
            sequence: session.sequence.clone(),
            player_input: session.player_input.clone(),
            machine_state: session.machine_state,
            sequence_items_shown: session.sequence_items_shown,
            countdown_remaining: session.countdown_remaining,
            round_activation: progress.round_activation.clone(),
            mastery_activation: progress.mastery_activation.clone(),
            phase_just_completed: flags.phase_just_completed,
            last_completed_phase: flags.last_completed_phase.clone(),
            game_just_completed: flags.game_just_completed,
        }
    }

    /// Check the record against `catalog` and split it back into live parts.
    pub fn restore(&self, catalog: &SequenceCatalog) -> EngineResult<Restored> {
        if !catalog.contains(&self.phase) {
            return Err(EngineError::snapshot(format!(
                "phase `{}` is not in the catalog",
                self.phase
            )));
        }
        if !(1..=ROUNDS).contains(&self.round) {
            return Err(EngineError::snapshot(format!(
                "round {} outside 1..={}",
                self.round, ROUNDS
            )));
        }
        let session = GameSession {
            phase: self.phase.clone(),
            round: self.round,
            sequence: self.sequence.clone(),
            player_input: self.player_input.clone(),
            machine_state: self.machine_state,
            sequence_items_shown: self.sequence_items_shown,
            countdown_remaining: self.countdown_remaining,
        };
        session.check_consistency().map_err(EngineError::snapshot)?;

        Ok(Restored {
            session,
            progress: ProgressMaps {
                round_activation: self.round_activation.clone(),
                mastery_activation: self.mastery_activation.clone(),
            },
            flags: OneShotFlags {
                phase_just_completed: self.phase_just_completed,
                last_completed_phase: self.last_completed_phase.clone(),
                game_just_completed: self.game_just_completed,
            },
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::snapshot(format!("invalid snapshot JSON: {}", e)))
    }

    /// Encode for localStorage.
    pub fn to_storage(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_json())
    }

    /// Decode a stored snapshot. Accepts the base64 storage form or raw JSON.
    /// `Ok(None)` means nothing was stored.
    pub fn from_storage(stored: &str) -> EngineResult<Option<Self>> {
        let stored = stored.trim();
        if stored.is_empty() || stored == "null" || stored == "{}" {
            return Ok(None);
        }
        if stored.starts_with('{') {
            return Self::from_json(stored).map(Some);
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(stored)
            .map_err(|e| EngineError::snapshot(format!("base64 decode error: {}", e)))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| EngineError::snapshot(format!("snapshot is not UTF-8: {}", e)))?;
        Self::from_json(&json).map(Some)
    }
}
