//! Timing configuration for the engine.
//!
//! Every delay the state machine waits on is a UX constant, not a structural
//! requirement, so all of them live here and can be replaced by the host
//! (`POST /api/engine/config`).

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Engine timing configuration. All durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grace delay before WAITING starts the countdown.
    pub start_delay_ms: u64,
    /// Countdown start value (counts down to zero).
    pub countdown_from: u32,
    /// Duration of one countdown step.
    pub countdown_step_ms: u64,
    /// Time each token is presented during playback.
    pub token_cadence_ms: u64,
    /// How long ORDER_ERROR shows before returning to LISTENING.
    pub order_error_ms: u64,
    /// How long CELEBRATION shows before advancing.
    pub celebration_ms: u64,
    /// Pause between rounds.
    pub round_transition_ms: u64,
    /// Delay between the final PHASE_COMPLETE and GAME_COMPLETE.
    pub game_complete_delay_ms: u64,
    /// Minimum re-entry interval between two activations.
    pub debounce_ms: u64,
    /// Shortest deliberate interval a learner can produce between two taps.
    pub min_reaction_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 800,
            countdown_from: 3,
            countdown_step_ms: 1000,
            token_cadence_ms: 1200,
            order_error_ms: 1000,
            celebration_ms: 1500,
            round_transition_ms: 1000,
            game_complete_delay_ms: 2000,
            debounce_ms: 250,
            min_reaction_ms: 300,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        // The debounce only exists to swallow duplicate fires of one tap.
        if self.debounce_ms >= self.min_reaction_ms {
            return Err(EngineError::config(format!(
                "debounce_ms ({}) must be shorter than min_reaction_ms ({})",
                self.debounce_ms, self.min_reaction_ms
            )));
        }
        if self.token_cadence_ms == 0 {
            return Err(EngineError::config("token_cadence_ms must be positive"));
        }
        if self.countdown_step_ms == 0 {
            return Err(EngineError::config("countdown_step_ms must be positive"));
        }
        Ok(())
    }
}
