use std::time::{Duration, Instant};

use crate::mode::Mode;

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer was not running, nothing happened
    Ignored,
    Ticked,
    Expired,
}

/// Armed recurring tick. Dropping it cancels every tick it would have
/// delivered.
#[derive(Clone, Copy, Debug)]
struct TickHandle {
    armed_at: Instant,
    delivered: u64,
}

impl TickHandle {
    fn due(&self, now: Instant) -> u64 {
        let whole = now.saturating_duration_since(self.armed_at).as_secs() / TICK.as_secs();
        whole.saturating_sub(self.delivered)
    }
}

/// Countdown for one session
#[derive(Debug)]
pub struct SessionTimer {
    mode: Mode,
    remaining: u64,
    phase: TimerPhase,
    handle: Option<TickHandle>,
}

impl SessionTimer {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            remaining: mode.seconds(),
            phase: TimerPhase::Idle,
            handle: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    /// Whether a tick handle is still armed
    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.mode.seconds() - self.remaining
    }

    /// Starts the countdown. Only valid from idle; returns whether it started.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.phase != TimerPhase::Idle {
            return false;
        }
        self.phase = TimerPhase::Running;
        self.handle = Some(TickHandle {
            armed_at: now,
            delivered: 0,
        });
        true
    }

    /// One second passes
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != TimerPhase::Running {
            return TickOutcome::Ignored;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if let Some(handle) = self.handle.as_mut() {
            handle.delivered += 1;
        }

        if self.remaining == 0 {
            self.phase = TimerPhase::Expired;
            self.stop();
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked
        }
    }

    /// Delivers every whole second elapsed since the last delivered tick.
    /// Returns how many ticks were applied and whether the timer expired.
    pub fn poll(&mut self, now: Instant) -> (u64, TickOutcome) {
        let due = match self.handle {
            Some(handle) if self.phase == TimerPhase::Running => handle.due(now),
            _ => return (0, TickOutcome::Ignored),
        };

        let mut applied = 0;
        let mut last = TickOutcome::Ignored;
        for _ in 0..due {
            last = self.tick();
            applied += 1;
            if last == TickOutcome::Expired {
                break;
            }
        }
        (applied, last)
    }

    /// Text fully typed before expiry: stop now, keeping `remaining`
    pub fn force_complete(&mut self) {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Expired;
        }
        self.stop();
    }

    /// Disarms the pending tick; no further tick can reach this timer
    pub fn stop(&mut self) {
        self.handle = None;
    }
}
