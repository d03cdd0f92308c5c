//! Input validator: strict left-to-right replay of the sequence.
//!
//! The only signal is the position of the activated Clicker, so a wrong
//! activation is always a wrong position, never a wrong token.

use crate::game::state::{GameSession, MachineState};

/// Why an activation was dropped without any effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Inactive,
    NotListening(MachineState),
    /// Arrived within the debounce window of the previous activation.
    Debounced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ignored(IgnoreReason),
    /// Not the next expected position; nothing is recorded.
    OutOfOrder { expected: usize, got: usize },
    Accepted {
        index: usize,
        syllable: String,
        /// This activation matched the whole sequence.
        completes: bool,
    },
}

#[derive(Debug, Clone)]
pub struct InputValidator {
    debounce_ms: u64,
    last_activation_ms: Option<u64>,
}

impl InputValidator {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            last_activation_ms: None,
        }
    }

    pub fn reset(&mut self) {
        self.last_activation_ms = None;
    }

    /// Judge an activation of Clicker `index` at `now_ms`. Only the debounce
    /// clock is updated; applying an accepted token is up to the caller.
    pub fn validate(&mut self, session: &GameSession, index: usize, now_ms: u64) -> Verdict {
        if session.machine_state != MachineState::Listening {
            return Verdict::Ignored(IgnoreReason::NotListening(session.machine_state));
        }
        if let Some(last) = self.last_activation_ms {
            if now_ms.saturating_sub(last) < self.debounce_ms {
                return Verdict::Ignored(IgnoreReason::Debounced);
            }
        }
        self.last_activation_ms = Some(now_ms);

        let expected = session.expected_index();
        match session.sequence.get(index) {
            Some(syllable) if index == expected => Verdict::Accepted {
                index,
                syllable: syllable.clone(),
                completes: index + 1 == session.sequence.len(),
            },
            _ => Verdict::OutOfOrder {
                expected,
                got: index,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listening() -> GameSession {
        let mut session = GameSession::new("alpha", 1, vec!["va".into(), "kra".into()]);
        session.machine_state = MachineState::Listening;
        session
    }

    #[test]
    fn accepts_next_expected_index() {
        let mut validator = InputValidator::new(250);
        let session = listening();
        assert_eq!(
            validator.validate(&session, 0, 1000),
            Verdict::Accepted {
                index: 0,
                syllable: "va".into(),
                completes: false
            }
        );
    }

    #[test]
    fn last_token_completes() {
        let mut validator = InputValidator::new(250);
        let mut session = listening();
        session.player_input.push("va".into());
        assert_eq!(
            validator.validate(&session, 1, 0),
            Verdict::Accepted {
                index: 1,
                syllable: "kra".into(),
                completes: true
            }
        );
    }

    #[test]
    fn rejects_wrong_position() {
        let mut validator = InputValidator::new(250);
        let session = listening();
        assert_eq!(
            validator.validate(&session, 1, 0),
            Verdict::OutOfOrder {
                expected: 0,
                got: 1
            }
        );
    }

    #[test]
    fn index_past_sequence_is_out_of_order() {
        let mut validator = InputValidator::new(250);
        let session = listening();
        assert!(matches!(
            validator.validate(&session, 7, 0),
            Verdict::OutOfOrder { expected: 0, got: 7 }
        ));
    }

    #[test]
    fn ignored_outside_listening() {
        let mut validator = InputValidator::new(250);
        let mut session = listening();
        session.machine_state = MachineState::Playing;
        assert_eq!(
            validator.validate(&session, 0, 0),
            Verdict::Ignored(IgnoreReason::NotListening(MachineState::Playing))
        );
        // An ignored activation does not start a debounce window.
        session.machine_state = MachineState::Listening;
        assert!(matches!(
            validator.validate(&session, 0, 10),
            Verdict::Accepted { .. }
        ));
    }

    #[test]
    fn debounces_rapid_second_fire() {
        let mut validator = InputValidator::new(250);
        let mut session = listening();
        assert!(matches!(
            validator.validate(&session, 0, 1000),
            Verdict::Accepted { .. }
        ));
        session.player_input.push("va".into());
        assert_eq!(
            validator.validate(&session, 1, 1100),
            Verdict::Ignored(IgnoreReason::Debounced)
        );
        assert!(matches!(
            validator.validate(&session, 1, 1250),
            Verdict::Accepted { completes: true, .. }
        ));
    }

    #[test]
    fn rejected_activation_still_opens_debounce_window() {
        let mut validator = InputValidator::new(250);
        let session = listening();
        validator.validate(&session, 1, 0);
        assert_eq!(
            validator.validate(&session, 0, 100),
            Verdict::Ignored(IgnoreReason::Debounced)
        );
        validator.reset();
        assert!(matches!(
            validator.validate(&session, 0, 100),
            Verdict::Accepted { .. }
        ));
    }
}
