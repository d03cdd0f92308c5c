//! Playback scheduler: presents the sequence one token per cadence slot.
//!
//! Timing is fixed elapsed time. Whether the host actually produced a sound
//! for a token has no effect on when the next one is presented.

use crate::game::state::{GameSession, MachineState};
use crate::game::timers::{Task, TimerScope};

/// Result of one playback step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStep {
    /// Token `index` is now presented.
    Present { index: usize, syllable: String },
    /// Every token has had its slot; input is unlocked.
    Finished,
}

#[derive(Debug, Clone, Copy)]
pub struct PlaybackScheduler {
    cadence_ms: u64,
}

impl PlaybackScheduler {
    pub fn new(cadence_ms: u64) -> Self {
        Self { cadence_ms }
    }

    /// Enter PLAYING from the first token.
    pub fn start(&self, session: &mut GameSession, timers: &mut TimerScope) {
        session.machine_state = MachineState::Playing;
        session.sequence_items_shown = 0;
        session.countdown_remaining = 0;
        timers.schedule(0, Task::PresentNext);
    }

    /// Continue a restored playback. The token shown last gets a full slot
    /// again before the next one is presented.
    pub fn resume(&self, session: &GameSession, timers: &mut TimerScope) {
        let delay = if session.sequence_items_shown == 0 {
            0
        } else {
            self.cadence_ms
        };
        timers.schedule(delay, Task::PresentNext);
    }

    /// Handle a due `PresentNext`.
    pub fn step(&self, session: &mut GameSession, timers: &mut TimerScope) -> PlaybackStep {
        let index = session.sequence_items_shown;
        match session.sequence.get(index) {
            Some(syllable) => {
                let syllable = syllable.clone();
                session.sequence_items_shown += 1;
                timers.schedule(self.cadence_ms, Task::PresentNext);
                PlaybackStep::Present { index, syllable }
            }
            None => {
                session.machine_state = MachineState::Listening;
                PlaybackStep::Finished
            }
        }
    }

    /// Index of the token currently presented, if playing.
    pub fn highlighted(session: &GameSession) -> Option<usize> {
        if session.machine_state == MachineState::Playing && session.sequence_items_shown > 0 {
            Some(session.sequence_items_shown - 1)
        } else {
            None
        }
    }
}
