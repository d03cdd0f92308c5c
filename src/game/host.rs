//! Host-facing outputs.
//!
//! Transitions push `HostEvent`s onto an outbox; the browser host drains
//! them as JSON after every request and Rust embedders drain them through
//! the `Host` trait. Callbacks return nothing, so a cue that fails to play
//! cannot hold up or change the state machine.

use serde::Serialize;

use crate::game::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    /// Play the cue for one syllable.
    PresentToken { phase: String, syllable: String },
    /// Play the completed-word cue.
    PresentWord { phase: String },
    /// A Singer just transformed and its Reward appeared.
    RewardUnlocked { phase: String, syllable: String },
    /// Persist this record; it replaces any earlier one.
    Snapshot { snapshot: Snapshot },
    PhaseComplete { phase: String },
    GameComplete,
    /// Something the host should log; the engine carried on without it.
    Diagnostic { message: String },
}

/// Callback-style receiver for engine outputs.
pub trait Host {
    fn present_token(&mut self, phase: &str, syllable: &str);

    fn present_word(&mut self, phase: &str);

    fn on_reward_unlocked(&mut self, _phase: &str, _syllable: &str) {}

    fn on_snapshot(&mut self, snapshot: &Snapshot);

    fn on_phase_complete(&mut self, phase: &str);

    fn on_game_complete(&mut self);

    fn on_diagnostic(&mut self, _message: &str) {}
}

/// Deliver events to `host` in emission order.
pub fn deliver<H: Host + ?Sized>(events: Vec<HostEvent>, host: &mut H) {
    for event in events {
        match event {
            HostEvent::PresentToken { phase, syllable } => host.present_token(&phase, &syllable),
            HostEvent::PresentWord { phase } => host.present_word(&phase),
            HostEvent::RewardUnlocked { phase, syllable } => {
                host.on_reward_unlocked(&phase, &syllable)
            }
            HostEvent::Snapshot { snapshot } => host.on_snapshot(&snapshot),
            HostEvent::PhaseComplete { phase } => host.on_phase_complete(&phase),
            HostEvent::GameComplete => host.on_game_complete(),
            HostEvent::Diagnostic { message } => host.on_diagnostic(&message),
        }
    }
}

/// Host that records every callback; handy for tests and headless replays.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub tokens: Vec<(String, String)>,
    pub words: Vec<String>,
    pub rewards: Vec<(String, String)>,
    pub snapshots: Vec<Snapshot>,
    pub completed_phases: Vec<String>,
    pub games_completed: usize,
    pub diagnostics: Vec<String>,
}

impl Host for RecordingHost {
    fn present_token(&mut self, phase: &str, syllable: &str) {
        self.tokens.push((phase.to_string(), syllable.to_string()));
    }

    fn present_word(&mut self, phase: &str) {
        self.words.push(phase.to_string());
    }

    fn on_reward_unlocked(&mut self, phase: &str, syllable: &str) {
        self.rewards.push((phase.to_string(), syllable.to_string()));
    }

    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        self.snapshots.push(snapshot.clone());
    }

    fn on_phase_complete(&mut self, phase: &str) {
        self.completed_phases.push(phase.to_string());
    }

    fn on_game_complete(&mut self) {
        self.games_completed += 1;
    }

    fn on_diagnostic(&mut self, message: &str) {
        self.diagnostics.push(message.to_string());
    }
}

impl RecordingHost {
    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }
}
