//! Session controller: the state machine driving one learning scene.
//!
//! ```text
//! WAITING ─▶ COUNTDOWN ─▶ PLAYING ─▶ LISTENING ─▶ CELEBRATION ─┬▶ ROUND_TRANSITION ─▶ WAITING (round + 1)
//!                                      ▲    │                   └▶ PHASE_COMPLETE ─┬▶ (advance_phase) WAITING
//!                                      └ ORDER_ERROR ◀┘                            └▶ GAME_COMPLETE (final phase)
//! ```
//!
//! All mutation happens synchronously inside `activate`, `tick`, `press`,
//! `advance_phase` and `full_reset`. Every transition pushes a fresh
//! snapshot to the outbox.

use serde::Serialize;

use crate::catalog::{ElementId, ROUNDS, SequenceCatalog};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::game::host::{self, Host, HostEvent};
use crate::game::input::{IgnoreReason, InputValidator, Verdict};
use crate::game::playback::{PlaybackScheduler, PlaybackStep};
use crate::game::progress::{ProgressMaps, Transformation};
use crate::game::snapshot::{Restored, Snapshot};
use crate::game::state::{GameSession, MachineState, OneShotFlags};
use crate::game::timers::{Task, TimerScope};

/// What the host hands over when a scene goes live.
#[derive(Debug, Clone, Default)]
pub struct Activation {
    /// Record saved before a reload; ignored when `force_full_reset` is set.
    pub snapshot: Option<Snapshot>,
    pub force_full_reset: bool,
}

/// Per-syllable rendering state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementView {
    pub syllable: String,
    pub activated_this_round: bool,
    pub mastered: bool,
    pub singer_transformed: bool,
    pub reward_unlocked: bool,
}

/// Query surface for the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineView {
    pub live: bool,
    pub phase: String,
    pub word: String,
    pub round: u8,
    pub machine_state: MachineState,
    pub sequence: Vec<String>,
    pub player_input: Vec<String>,
    pub countdown_remaining: u32,
    pub highlighted: Option<usize>,
    pub elements: Vec<ElementView>,
}

pub struct Engine {
    config: EngineConfig,
    catalog: SequenceCatalog,
    live: bool,
    session: GameSession,
    progress: ProgressMaps,
    flags: OneShotFlags,
    timers: TimerScope,
    playback: PlaybackScheduler,
    input: InputValidator,
    outbox: Vec<HostEvent>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::build(EngineConfig::default(), SequenceCatalog::builtin())
    }
}

impl Engine {
    /// Create an inactive engine. Nothing runs until `activate`.
    pub fn new(config: EngineConfig, catalog: SequenceCatalog) -> EngineResult<Self> {
        config.validate()?;
        for problem in catalog.validate() {
            log::warn!("catalog: {}", problem);
        }
        Ok(Self::build(config, catalog))
    }

    fn build(config: EngineConfig, catalog: SequenceCatalog) -> Self {
        let first = catalog.first_phase().id.clone();
        let sequence = catalog.sequence(&first, 1).unwrap_or_default();
        Self {
            playback: PlaybackScheduler::new(config.token_cadence_ms),
            input: InputValidator::new(config.debounce_ms),
            config,
            catalog,
            live: false,
            session: GameSession::new(&first, 1, sequence),
            progress: ProgressMaps::new(),
            flags: OneShotFlags::default(),
            timers: TimerScope::new(),
            outbox: Vec::new(),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Bring the scene live: restore `activation.snapshot` when usable,
    /// otherwise start a brand-new session. On an engine that is already
    /// live, a call with neither a snapshot nor a reset changes nothing.
    pub fn activate(&mut self, activation: Activation) {
        if self.live && activation.snapshot.is_none() && !activation.force_full_reset {
            log::debug!("already live, activation ignored");
            return;
        }
        // A fresh scope per activation; anything left from before is dropped.
        self.timers.close();
        self.timers.open();
        self.live = true;
        self.input.reset();

        if activation.force_full_reset {
            log::info!("activating with full reset");
            self.start_fresh();
            return;
        }
        match activation.snapshot {
            Some(snapshot) => match snapshot.restore(&self.catalog) {
                Ok(restored) => self.resume(restored),
                Err(e) => {
                    log::warn!("discarding snapshot: {}", e);
                    self.diagnostic(format!("snapshot discarded: {}", e));
                    self.start_fresh();
                }
            },
            None => {
                log::info!("activating fresh session");
                self.start_fresh();
            }
        }
    }

    /// `activate` with the snapshot still in its stored string form. An
    /// undecodable string counts as no snapshot.
    pub fn activate_from_storage(&mut self, stored: &str, force_full_reset: bool) {
        let snapshot = match Snapshot::from_storage(stored) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("stored snapshot unreadable: {}", e);
                self.outbox.push(HostEvent::Diagnostic {
                    message: format!("snapshot discarded: {}", e),
                });
                None
            }
        };
        self.activate(Activation {
            snapshot,
            force_full_reset,
        });
    }

    /// Tear the scene down. Pending timers are dropped and no later call
    /// mutates the session until the next `activate`.
    pub fn deactivate(&mut self) {
        if !self.live {
            return;
        }
        self.timers.close();
        self.live = false;
        log::info!(
            "deactivated in {:?} ({} round {})",
            self.session.machine_state,
            self.session.phase,
            self.session.round
        );
    }

    /// Explicit "start over": forget all progress and restart at the first
    /// phase, round 1.
    pub fn full_reset(&mut self) -> EngineResult<()> {
        if !self.live {
            return Err(EngineError::Inactive);
        }
        log::info!("full reset requested");
        self.timers.open();
        self.input.reset();
        self.start_fresh();
        Ok(())
    }

    /// Replace timing configuration. Timers already queued keep their due times.
    pub fn set_config(&mut self, config: EngineConfig) -> EngineResult<()> {
        config.validate()?;
        self.playback = PlaybackScheduler::new(config.token_cadence_ms);
        self.input = InputValidator::new(config.debounce_ms);
        self.config = config;
        Ok(())
    }

    // ── Host inputs ────────────────────────────────────────────────

    /// Advance the cooperative clock by `elapsed_ms`, running every task
    /// that falls due on the way.
    pub fn tick(&mut self, elapsed_ms: u64) {
        if !self.live {
            return;
        }
        let target = self.timers.now().saturating_add(elapsed_ms);
        while let Some(task) = self.timers.pop_due(target) {
            self.run(task);
        }
        self.timers.settle(target);
    }

    /// The learner activated the Clicker at `index` of the current sequence.
    pub fn press(&mut self, index: usize) -> Verdict {
        if !self.live {
            return Verdict::Ignored(IgnoreReason::Inactive);
        }
        let verdict = self.input.validate(&self.session, index, self.timers.now());
        match &verdict {
            Verdict::Ignored(reason) => {
                log::debug!("activation {} ignored: {:?}", index, reason);
            }
            Verdict::OutOfOrder { expected, got } => {
                log::debug!("out of order: expected {}, got {}", expected, got);
                self.session.machine_state = MachineState::OrderError;
                self.timers
                    .schedule(self.config.order_error_ms, Task::ClearOrderError);
                self.commit();
            }
            Verdict::Accepted {
                syllable,
                completes,
                ..
            } => self.accept(syllable, *completes),
        }
        verdict
    }

    /// Leave a non-final PHASE_COMPLETE for round 1 of the next phase.
    pub fn advance_phase(&mut self) -> EngineResult<()> {
        if !self.live {
            return Err(EngineError::Inactive);
        }
        if self.session.machine_state != MachineState::PhaseComplete {
            log::warn!(
                "advance_phase ignored in {:?}",
                self.session.machine_state
            );
            return Err(EngineError::PhaseNotComplete(self.session.phase.clone()));
        }
        let next = self.catalog.next_phase(&self.session.phase)?.id.clone();
        log::info!("advancing from {} to {}", self.session.phase, next);
        self.install_round(&next, 1);
        self.enter_waiting();
        Ok(())
    }

    // ── Outputs ────────────────────────────────────────────────────

    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Deliver pending events to `host` through its callbacks.
    pub fn dispatch<H: Host + ?Sized>(&mut self, receiver: &mut H) {
        host::deliver(self.drain_events(), receiver);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.session, &self.progress, &self.flags)
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn machine_state(&self) -> MachineState {
        self.session.machine_state
    }

    pub fn phase(&self) -> &str {
        &self.session.phase
    }

    pub fn round(&self) -> u8 {
        self.session.round
    }

    pub fn sequence(&self) -> &[String] {
        &self.session.sequence
    }

    pub fn player_input(&self) -> &[String] {
        &self.session.player_input
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.session.countdown_remaining
    }

    pub fn highlighted(&self) -> Option<usize> {
        PlaybackScheduler::highlighted(&self.session)
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now()
    }

    pub fn progress(&self) -> &ProgressMaps {
        &self.progress
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SequenceCatalog {
        &self.catalog
    }

    pub fn is_mastered(&self, phase: &str, syllable: &str) -> bool {
        self.progress.is_mastered(phase, syllable)
    }

    pub fn is_activated_this_round(&self, phase: &str, syllable: &str) -> bool {
        self.progress.is_activated_this_round(phase, syllable)
    }

    pub fn is_reward_unlocked(&self, phase: &str, syllable: &str) -> bool {
        self.progress.is_reward_unlocked(phase, syllable)
    }

    /// Scene elements present for the current round.
    pub fn line_up(&self) -> EngineResult<Vec<ElementId>> {
        let phase = &self.session.phase;
        self.catalog.line_up(phase, self.session.round, |syllable| {
            self.progress.is_reward_unlocked(phase, syllable)
        })
    }

    pub fn view(&self) -> EngineView {
        let phase = &self.session.phase;
        let elements = self
            .session
            .sequence
            .iter()
            .map(|syllable| ElementView {
                syllable: syllable.clone(),
                activated_this_round: self.progress.is_activated_this_round(phase, syllable),
                mastered: self.progress.is_mastered(phase, syllable),
                singer_transformed: self.progress.is_singer_transformed(phase, syllable),
                reward_unlocked: self.progress.is_reward_unlocked(phase, syllable),
            })
            .collect();
        EngineView {
            live: self.live,
            phase: phase.clone(),
            word: self
                .catalog
                .phase(phase)
                .map(|p| p.word.clone())
                .unwrap_or_default(),
            round: self.session.round,
            machine_state: self.session.machine_state,
            sequence: self.session.sequence.clone(),
            player_input: self.session.player_input.clone(),
            countdown_remaining: self.session.countdown_remaining,
            highlighted: self.highlighted(),
            elements,
        }
    }

    // ── Transitions ────────────────────────────────────────────────

    fn run(&mut self, task: Task) {
        match task {
            Task::BeginCountdown => self.begin_countdown(),
            Task::CountdownTick => self.countdown_tick(),
            Task::PresentNext => self.present_next(),
            Task::ClearOrderError => {
                if self.session.machine_state == MachineState::OrderError {
                    self.session.machine_state = MachineState::Listening;
                    self.commit();
                }
            }
            Task::FinishCelebration => {
                if self.session.machine_state == MachineState::Celebration {
                    self.finish_celebration();
                }
            }
            Task::EnterNextRound => {
                if self.session.machine_state == MachineState::RoundTransition {
                    self.enter_next_round();
                }
            }
            Task::CompleteGame => self.complete_game(),
        }
    }

    fn start_fresh(&mut self) {
        self.progress.clear();
        self.flags = OneShotFlags::default();
        let first = self.catalog.first_phase().id.clone();
        self.install_round(&first, 1);
        self.enter_waiting();
    }

    /// Install the catalog sequence for `(phase, round)` with empty input and
    /// a cleared round map. On a catalog failure the sequence stays empty and
    /// the host gets a diagnostic.
    fn install_round(&mut self, phase: &str, round: u8) -> bool {
        self.progress.reset_round();
        match self.catalog.sequence(phase, round) {
            Ok(sequence) => {
                self.session = GameSession::new(phase, round, sequence);
                true
            }
            Err(e) => {
                if e.is_invariant_violation() {
                    log::error!("cannot install {} round {}: {}", phase, round, e);
                } else {
                    log::warn!("cannot install {} round {}: {}", phase, round, e);
                }
                self.session = GameSession::new(phase, round, Vec::new());
                self.diagnostic(e.to_string());
                false
            }
        }
    }

    fn enter_waiting(&mut self) {
        self.session.machine_state = MachineState::Waiting;
        self.session.countdown_remaining = 0;
        self.session.sequence_items_shown = 0;
        if self.session.sequence.is_empty() {
            log::error!(
                "no sequence for {} round {}; staying in WAITING",
                self.session.phase,
                self.session.round
            );
        } else if !self.timers.is_scheduled(Task::BeginCountdown) {
            self.timers
                .schedule(self.config.start_delay_ms, Task::BeginCountdown);
        }
        self.commit();
    }

    fn begin_countdown(&mut self) {
        if self.session.machine_state != MachineState::Waiting || self.session.sequence.is_empty()
        {
            return;
        }
        log::debug!("countdown for {} round {}", self.session.phase, self.session.round);
        self.session.machine_state = MachineState::Countdown;
        self.session.countdown_remaining = self.config.countdown_from;
        if self.session.countdown_remaining == 0 {
            self.start_playback();
            return;
        }
        self.timers
            .schedule(self.config.countdown_step_ms, Task::CountdownTick);
        self.commit();
    }

    fn countdown_tick(&mut self) {
        if self.session.machine_state != MachineState::Countdown {
            return;
        }
        self.session.countdown_remaining = self.session.countdown_remaining.saturating_sub(1);
        if self.session.countdown_remaining == 0 {
            self.start_playback();
        } else {
            self.timers
                .schedule(self.config.countdown_step_ms, Task::CountdownTick);
            self.commit();
        }
    }

    fn start_playback(&mut self) {
        self.playback.start(&mut self.session, &mut self.timers);
        self.commit();
    }

    fn present_next(&mut self) {
        if self.session.machine_state != MachineState::Playing {
            return;
        }
        match self.playback.step(&mut self.session, &mut self.timers) {
            PlaybackStep::Present { index, syllable } => {
                log::debug!("presenting {} ({})", index, syllable);
                self.outbox.push(HostEvent::PresentToken {
                    phase: self.session.phase.clone(),
                    syllable,
                });
            }
            PlaybackStep::Finished => {
                log::debug!("playback finished, listening");
            }
        }
        self.commit();
    }

    fn accept(&mut self, syllable: &str, completes: bool) {
        let phase = self.session.phase.clone();
        self.session.player_input.push(syllable.to_string());
        self.outbox.push(HostEvent::PresentToken {
            phase: phase.clone(),
            syllable: syllable.to_string(),
        });
        if self.progress.record_activation(&phase, syllable) == Transformation::Unlocked {
            log::debug!("{}/{} mastered, reward unlocked", phase, syllable);
            self.outbox.push(HostEvent::RewardUnlocked {
                phase,
                syllable: syllable.to_string(),
            });
        }
        if completes {
            self.session.machine_state = MachineState::Celebration;
            self.timers
                .schedule(self.config.celebration_ms, Task::FinishCelebration);
        }
        self.commit();
    }

    fn finish_celebration(&mut self) {
        if self.session.round < ROUNDS {
            self.session.machine_state = MachineState::RoundTransition;
            self.timers
                .schedule(self.config.round_transition_ms, Task::EnterNextRound);
            self.commit();
        } else {
            self.complete_phase();
        }
    }

    fn enter_next_round(&mut self) {
        let phase = self.session.phase.clone();
        let round = self.session.round + 1;
        self.install_round(&phase, round);
        self.enter_waiting();
    }

    fn complete_phase(&mut self) {
        let phase = self.session.phase.clone();
        self.session.machine_state = MachineState::PhaseComplete;
        self.flags.phase_just_completed = true;
        self.flags.last_completed_phase = Some(phase.clone());
        self.commit();
        self.outbox.push(HostEvent::PresentWord {
            phase: phase.clone(),
        });
        self.notify_phase_complete();
        if self.catalog.is_final(&phase) {
            self.timers
                .schedule(self.config.game_complete_delay_ms, Task::CompleteGame);
        }
    }

    fn notify_phase_complete(&mut self) {
        let phase = self
            .flags
            .last_completed_phase
            .clone()
            .unwrap_or_else(|| self.session.phase.clone());
        log::info!("phase {} complete", phase);
        self.outbox.push(HostEvent::PhaseComplete { phase });
        self.flags.phase_just_completed = false;
        self.commit();
    }

    fn complete_game(&mut self) {
        if self.session.machine_state != MachineState::PhaseComplete {
            return;
        }
        self.session.machine_state = MachineState::GameComplete;
        self.flags.game_just_completed = true;
        self.commit();
        self.notify_game_complete();
    }

    fn notify_game_complete(&mut self) {
        log::info!("game complete");
        self.outbox.push(HostEvent::GameComplete);
        self.flags.game_just_completed = false;
        self.commit();
    }

    /// Rebuild the live session from a restored snapshot and re-arm whatever
    /// timer the saved state was waiting on.
    fn resume(&mut self, restored: Restored) {
        self.session = restored.session;
        self.progress = restored.progress;
        self.flags = restored.flags;
        log::info!(
            "resuming {} round {} in {:?}",
            self.session.phase,
            self.session.round,
            self.session.machine_state
        );

        // Notifications interrupted by the reload go out exactly once more.
        if self.flags.phase_just_completed {
            let phase = self
                .flags
                .last_completed_phase
                .clone()
                .unwrap_or_else(|| self.session.phase.clone());
            self.outbox.push(HostEvent::PresentWord { phase });
            self.notify_phase_complete();
        }
        if self.flags.game_just_completed {
            self.notify_game_complete();
        }

        match self.session.machine_state {
            MachineState::Waiting => self.enter_waiting(),
            MachineState::Countdown => {
                if self.session.countdown_remaining == 0 {
                    self.start_playback();
                } else {
                    self.timers
                        .schedule(self.config.countdown_step_ms, Task::CountdownTick);
                    self.commit();
                }
            }
            MachineState::Playing => {
                self.playback.resume(&self.session, &mut self.timers);
                self.commit();
            }
            MachineState::Listening | MachineState::OrderError
                if self.session.is_sequence_complete() =>
            {
                self.replay_advance();
            }
            MachineState::Listening => self.commit(),
            MachineState::OrderError => {
                self.timers
                    .schedule(self.config.order_error_ms, Task::ClearOrderError);
                self.commit();
            }
            MachineState::Celebration | MachineState::RoundTransition => self.replay_advance(),
            MachineState::PhaseComplete => {
                if self.catalog.is_final(&self.session.phase) {
                    self.timers
                        .schedule(self.config.game_complete_delay_ms, Task::CompleteGame);
                }
                self.commit();
            }
            MachineState::GameComplete => self.commit(),
        }
    }

    /// Perform the advance a celebration would have triggered, without its pause.
    fn replay_advance(&mut self) {
        if self.session.round < ROUNDS {
            self.enter_next_round();
        } else {
            self.complete_phase();
        }
    }

    fn commit(&mut self) {
        log::debug!(
            "{} round {}: {:?}",
            self.session.phase,
            self.session.round,
            self.session.machine_state
        );
        let snapshot = self.snapshot();
        self.outbox.push(HostEvent::Snapshot { snapshot });
    }

    fn diagnostic(&mut self, message: String) {
        self.outbox.push(HostEvent::Diagnostic { message });
    }
}
