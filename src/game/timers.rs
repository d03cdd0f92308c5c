//! Cooperative timers: the engine's only notion of time.
//!
//! Every delayed transition is a `Task` value queued with a due time. The
//! host advances the clock with `tick`; nothing fires on its own. A scope is
//! opened when a session activates and closed when it deactivates, and a
//! closed scope holds no tasks and accepts none.

/// Deferred transitions the engine can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    BeginCountdown,
    CountdownTick,
    PresentNext,
    ClearOrderError,
    FinishCelebration,
    EnterNextRound,
    CompleteGame,
}

#[derive(Debug, Clone)]
struct Pending {
    seq: u64,
    due_ms: u64,
    task: Task,
}

#[derive(Debug, Default)]
pub struct TimerScope {
    now_ms: u64,
    next_seq: u64,
    open: bool,
    pending: Vec<Pending>,
}

impl TimerScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Start accepting tasks. The clock keeps running across scopes.
    pub fn open(&mut self) {
        self.pending.clear();
        self.open = true;
    }

    /// Drop every pending task and refuse new ones until reopened.
    pub fn close(&mut self) {
        self.pending.clear();
        self.open = false;
    }

    /// Queue `task` to run `delay_ms` from now. A closed scope drops it.
    pub fn schedule(&mut self, delay_ms: u64, task: Task) {
        if !self.open {
            log::debug!("timer scope closed, dropping {:?}", task);
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            seq,
            due_ms: self.now_ms.saturating_add(delay_ms),
            task,
        });
    }

    pub fn is_scheduled(&self, task: Task) -> bool {
        self.pending.iter().any(|p| p.task == task)
    }

    /// Remove and return the earliest task due at or before `until_ms`,
    /// moving the clock to its due time. Ties run in scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Task> {
        let (pos, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= until_ms)
            .min_by_key(|(_, p)| (p.due_ms, p.seq))?;
        let pending = self.pending.remove(pos);
        self.now_ms = self.now_ms.max(pending.due_ms);
        Some(pending.task)
    }

    /// Move the clock to `until_ms` once every due task has run.
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}
