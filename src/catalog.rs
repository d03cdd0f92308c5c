//! Sequence catalog: which syllables each phase teaches, round by round.
//!
//! Pure lookup data. Round `r` of a phase plays the first `r + 1` syllables of
//! its word, so every round appends exactly one token to the previous one.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Rounds per phase.
pub const ROUNDS: u8 = 3;

/// Number of tokens played in `round` (2, 3, 4 for rounds 1, 2, 3).
pub fn sequence_len(round: u8) -> usize {
    round as usize + 1
}

/// One phase: a word split into its syllables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEntry {
    /// Phase id used in progress keys and notifications (e.g. "alpha").
    pub id: String,
    /// The full word taught by this phase.
    pub word: String,
    pub syllables: Vec<String>,
}

impl PhaseEntry {
    pub fn new(id: &str, word: &str, syllables: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            word: word.to_string(),
            syllables: syllables.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Role a scene element plays for its syllable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementRole {
    /// Presents the syllable during playback.
    Singer,
    /// The learner activates it to replay the syllable.
    Clicker,
    /// Unlocked the first time the syllable is mastered.
    Reward,
}

/// Identity of a scene element: `(phase, syllable, role)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId {
    pub phase: String,
    pub syllable: String,
    pub role: ElementRole,
}

/// Ordered list of phases; the last one is the final phase. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CatalogDoc")]
pub struct SequenceCatalog {
    phases: Vec<PhaseEntry>,
}

/// Wire form of a catalog, checked by `SequenceCatalog::new` on the way in.
#[derive(Deserialize)]
struct CatalogDoc {
    phases: Vec<PhaseEntry>,
}

impl TryFrom<CatalogDoc> for SequenceCatalog {
    type Error = EngineError;

    fn try_from(doc: CatalogDoc) -> EngineResult<Self> {
        Self::new(doc.phases)
    }
}

impl Default for SequenceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SequenceCatalog {
    pub fn new(phases: Vec<PhaseEntry>) -> EngineResult<Self> {
        if phases.is_empty() {
            return Err(EngineError::catalog("catalog has no phases"));
        }
        Ok(Self { phases })
    }

    /// The scene shipped with the game: two words, one per phase.
    pub fn builtin() -> Self {
        Self {
            phases: vec![
                PhaseEntry::new("alpha", "vakratunda", &["va", "kra", "tun", "da"]),
                PhaseEntry::new("beta", "mahakaya", &["ma", "ha", "ka", "ya"]),
            ],
        }
    }

    /// Parse a host-provided catalog: `{"phases": [{"id", "word", "syllables"}]}`.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::catalog(format!("invalid catalog JSON: {}", e)))
    }

    pub fn phases(&self) -> &[PhaseEntry] {
        &self.phases
    }

    pub fn phase(&self, id: &str) -> EngineResult<&PhaseEntry> {
        self.phases
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| EngineError::UnknownPhase(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.phases.iter().any(|p| p.id == id)
    }

    pub fn first_phase(&self) -> &PhaseEntry {
        &self.phases[0]
    }

    pub fn final_phase(&self) -> &PhaseEntry {
        &self.phases[self.phases.len() - 1]
    }

    pub fn is_final(&self, id: &str) -> bool {
        self.final_phase().id == id
    }

    /// Phase following `id`, or `NoNextPhase` for the final one.
    pub fn next_phase(&self, id: &str) -> EngineResult<&PhaseEntry> {
        let pos = self
            .phases
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EngineError::UnknownPhase(id.to_string()))?;
        self.phases
            .get(pos + 1)
            .ok_or_else(|| EngineError::NoNextPhase(id.to_string()))
    }

    /// Tokens to learn in `(phase, round)`.
    pub fn sequence(&self, phase: &str, round: u8) -> EngineResult<Vec<String>> {
        if !(1..=ROUNDS).contains(&round) {
            return Err(EngineError::InvalidRound { round, max: ROUNDS });
        }
        let entry = self.phase(phase)?;
        let needed = sequence_len(round);
        if entry.syllables.len() < needed {
            return Err(EngineError::IncompleteSequence {
                phase: phase.to_string(),
                round,
                needed,
                available: entry.syllables.len(),
            });
        }
        Ok(entry.syllables[..needed].to_vec())
    }

    /// Singer and Clicker for every syllable of the round, plus the Reward of
    /// each syllable `is_unlocked` reports.
    pub fn line_up(
        &self,
        phase: &str,
        round: u8,
        is_unlocked: impl Fn(&str) -> bool,
    ) -> EngineResult<Vec<ElementId>> {
        let sequence = self.sequence(phase, round)?;
        let mut elements = Vec::with_capacity(sequence.len() * 3);
        for syllable in sequence {
            let mut roles = vec![ElementRole::Singer, ElementRole::Clicker];
            if is_unlocked(&syllable) {
                roles.push(ElementRole::Reward);
            }
            for role in roles {
                elements.push(ElementId {
                    phase: phase.to_string(),
                    syllable: syllable.clone(),
                    role,
                });
            }
        }
        Ok(elements)
    }

    /// Every problem that would stop some round from being played.
    pub fn validate(&self) -> Vec<EngineError> {
        let mut problems = Vec::new();
        for entry in &self.phases {
            let needed = sequence_len(ROUNDS);
            if entry.syllables.len() < needed {
                problems.push(EngineError::IncompleteSequence {
                    phase: entry.id.clone(),
                    round: ROUNDS,
                    needed,
                    available: entry.syllables.len(),
                });
            }
            for (i, syllable) in entry.syllables.iter().enumerate() {
                if entry.syllables[..i].contains(syllable) {
                    problems.push(EngineError::DuplicateSyllable {
                        phase: entry.id.clone(),
                        syllable: syllable.clone(),
                    });
                }
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        assert!(SequenceCatalog::builtin().validate().is_empty());
    }

    #[test]
    fn lengths_grow_two_three_four() {
        let catalog = SequenceCatalog::builtin();
        for phase in catalog.phases() {
            for round in 1..=ROUNDS {
                let seq = catalog.sequence(&phase.id, round).unwrap();
                assert_eq!(seq.len(), round as usize + 1);
            }
        }
    }

    #[test]
    fn each_round_appends_exactly_one_token() {
        let catalog = SequenceCatalog::builtin();
        for phase in catalog.phases() {
            for round in 1..ROUNDS {
                let shorter = catalog.sequence(&phase.id, round).unwrap();
                let longer = catalog.sequence(&phase.id, round + 1).unwrap();
                assert_eq!(&longer[..longer.len() - 1], shorter.as_slice());
            }
        }
    }

    #[test]
    fn alpha_round_two_sequence() {
        let catalog = SequenceCatalog::builtin();
        assert_eq!(catalog.sequence("alpha", 1).unwrap(), vec!["va", "kra"]);
        assert_eq!(
            catalog.sequence("alpha", 2).unwrap(),
            vec!["va", "kra", "tun"]
        );
    }

    #[test]
    fn round_out_of_range() {
        let catalog = SequenceCatalog::builtin();
        assert_eq!(
            catalog.sequence("alpha", 0),
            Err(EngineError::InvalidRound { round: 0, max: 3 })
        );
        assert!(catalog.sequence("alpha", 4).is_err());
    }

    #[test]
    fn unknown_phase() {
        let catalog = SequenceCatalog::builtin();
        assert_eq!(
            catalog.sequence("gamma", 1),
            Err(EngineError::UnknownPhase("gamma".into()))
        );
    }

    #[test]
    fn phase_ordering() {
        let catalog = SequenceCatalog::builtin();
        assert_eq!(catalog.first_phase().id, "alpha");
        assert_eq!(catalog.next_phase("alpha").unwrap().id, "beta");
        assert!(catalog.is_final("beta"));
        assert!(!catalog.is_final("alpha"));
        assert_eq!(
            catalog.next_phase("beta"),
            Err(EngineError::NoNextPhase("beta".into()))
        );
    }

    #[test]
    fn empty_word_is_incomplete_sequence() {
        let catalog = SequenceCatalog::new(vec![PhaseEntry::new("hollow", "", &[])]).unwrap();
        let err = catalog.sequence("hollow", 1).unwrap_err();
        assert!(err.is_invariant_violation());
        assert_eq!(catalog.validate().len(), 1);
    }

    #[test]
    fn validate_reports_duplicates() {
        let catalog =
            SequenceCatalog::new(vec![PhaseEntry::new("echo", "lala", &["la", "la", "ra", "ma"])])
                .unwrap();
        let problems = catalog.validate();
        assert_eq!(
            problems,
            vec![EngineError::DuplicateSyllable {
                phase: "echo".into(),
                syllable: "la".into()
            }]
        );
    }

    #[test]
    fn from_json_parses_phases() {
        let catalog = SequenceCatalog::from_json(
            r#"{"phases":[{"id":"om","word":"omkara","syllables":["om","ka","ra","ya"]}]}"#,
        )
        .unwrap();
        assert_eq!(catalog.first_phase().word, "omkara");
        assert!(catalog.is_final("om"));
        assert!(SequenceCatalog::from_json(r#"{"phases":[]}"#).is_err());
    }

    #[test]
    fn empty_catalog_never_deserializes() {
        let direct = serde_json::from_str::<SequenceCatalog>(r#"{"phases":[]}"#);
        assert!(direct.is_err());
        assert!(direct.unwrap_err().to_string().contains("no phases"));

        let builtin = SequenceCatalog::builtin();
        let json = serde_json::to_string(&builtin).unwrap();
        assert_eq!(serde_json::from_str::<SequenceCatalog>(&json).unwrap(), builtin);
    }

    #[test]
    fn line_up_includes_unlocked_rewards() {
        let catalog = SequenceCatalog::builtin();
        let elements = catalog.line_up("alpha", 1, |s| s == "va").unwrap();
        assert_eq!(elements.len(), 5);
        assert!(elements.contains(&ElementId {
            phase: "alpha".into(),
            syllable: "va".into(),
            role: ElementRole::Reward,
        }));
        assert!(!elements
            .iter()
            .any(|e| e.syllable == "kra" && e.role == ElementRole::Reward));
    }
}
