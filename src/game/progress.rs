//! Progress tracker: per-round and permanent activation maps.
//!
//! Both maps are keyed by `"phase/syllable"`. The round map is cleared at the
//! start of every round. The mastery map only ever gains entries; the only
//! thing that clears it is an explicit full reset. A syllable's Singer is
//! transformed and its Reward unlocked exactly when it is mastered, so those
//! flags read straight from the mastery map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key used by both maps and the persisted snapshot.
pub fn progress_key(phase: &str, syllable: &str) -> String {
    format!("{}/{}", phase, syllable)
}

/// What an accepted activation did to the permanent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformation {
    /// First-ever mastery: Singer transformed, Reward unlocked.
    Unlocked,
    AlreadyUnlocked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMaps {
    pub round_activation: BTreeMap<String, bool>,
    pub mastery_activation: BTreeMap<String, bool>,
}

impl ProgressMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a correct activation in both maps.
    pub fn record_activation(&mut self, phase: &str, syllable: &str) -> Transformation {
        let key = progress_key(phase, syllable);
        self.round_activation.insert(key.clone(), true);
        let previously = self.mastery_activation.insert(key, true);
        if previously == Some(true) {
            Transformation::AlreadyUnlocked
        } else {
            Transformation::Unlocked
        }
    }

    /// Start of a round: forget this round's activations only.
    pub fn reset_round(&mut self) {
        self.round_activation.clear();
    }

    /// Explicit "start over": forget everything.
    pub fn clear(&mut self) {
        self.round_activation.clear();
        self.mastery_activation.clear();
    }

    pub fn is_mastered(&self, phase: &str, syllable: &str) -> bool {
        flag(&self.mastery_activation, phase, syllable)
    }

    pub fn is_activated_this_round(&self, phase: &str, syllable: &str) -> bool {
        flag(&self.round_activation, phase, syllable)
    }

    pub fn is_reward_unlocked(&self, phase: &str, syllable: &str) -> bool {
        self.is_mastered(phase, syllable)
    }

    pub fn is_singer_transformed(&self, phase: &str, syllable: &str) -> bool {
        self.is_mastered(phase, syllable)
    }

    /// True when every mastered key in `self` is still mastered in `later`.
    pub fn is_superseded_by(&self, later: &ProgressMaps) -> bool {
        self.mastery_activation
            .iter()
            .filter(|(_, v)| **v)
            .all(|(k, _)| later.mastery_activation.get(k) == Some(&true))
    }
}

fn flag(map: &BTreeMap<String, bool>, phase: &str, syllable: &str) -> bool {
    map.get(&progress_key(phase, syllable))
        .copied()
        .unwrap_or(false)
}
