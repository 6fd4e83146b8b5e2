use crate::bests::PersonalBestsStore;
use crate::corpus::TargetTextProvider;
use crate::engine::{Signal, TypingEngine, TypingEvent};
use crate::error::Result;
use crate::history::{SessionLog, SessionRecord};
use crate::mode::Mode;
use crate::runtime::{Clock, SystemClock};
use crate::stats::{ErrorCounting, LiveStats, SessionResult, StatsCalculator, WpmSample};
use crate::timer::{SessionTimer, TickOutcome, TimerPhase};
use crate::track::TrackSnapshot;

/// Owns one typing session at a time and everything needed to replace it:
/// mode selection, restarts, new passages, completion and personal bests.
pub struct ModeController {
    provider: Box<dyn TargetTextProvider>,
    bests: Box<dyn PersonalBestsStore>,
    clock: Box<dyn Clock>,
    history: Option<SessionLog>,
    calculator: StatsCalculator,
    mode: Mode,
    text: String,
    engine: TypingEngine,
    timer: SessionTimer,
    live: LiveStats,
    result: Option<SessionResult>,
    new_best: bool,
    samples: Vec<WpmSample>,
}

impl ModeController {
    pub fn new(
        provider: Box<dyn TargetTextProvider>,
        bests: Box<dyn PersonalBestsStore>,
        mode: Mode,
    ) -> Result<Self> {
        let text = provider.next(None);
        let engine = TypingEngine::new(&text)?;

        for (m, best) in bests.all() {
            if let Some(wpm) = best {
                tracing::debug!("loaded personal best {} wpm for {}", wpm, m);
            }
        }

        Ok(Self {
            provider,
            bests,
            clock: Box::new(SystemClock),
            history: None,
            calculator: StatsCalculator::default(),
            mode,
            text,
            engine,
            timer: SessionTimer::new(mode),
            live: LiveStats::default(),
            result: None,
            new_best: false,
            samples: vec![],
        })
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_error_counting(mut self, counting: ErrorCounting) -> Self {
        self.calculator = StatsCalculator::new(counting);
        self.recompute();
        self
    }

    pub fn with_history(mut self, log: SessionLog) -> Self {
        self.history = Some(log);
        self
    }

    // Queries

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn snapshot(&self) -> TrackSnapshot<'_> {
        self.engine.snapshot()
    }

    pub fn live_stats(&self) -> LiveStats {
        self.live
    }

    pub fn remaining(&self) -> u64 {
        self.timer.remaining()
    }

    pub fn phase(&self) -> TimerPhase {
        self.timer.phase()
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn has_started(&self) -> bool {
        self.engine.has_started()
    }

    pub fn is_complete(&self) -> bool {
        self.engine.is_complete()
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Whether the completed session set a new personal best
    pub fn is_new_best(&self) -> bool {
        self.new_best
    }

    pub fn personal_bests(&self) -> [(Mode, Option<u32>); 3] {
        self.bests.all()
    }

    pub fn error_counting(&self) -> ErrorCounting {
        self.calculator.counting()
    }

    pub fn wpm_samples(&self) -> &[WpmSample] {
        &self.samples
    }

    // Commands

    /// Switches to the mode lasting `duration` seconds and resets the session
    pub fn select_mode(&mut self, duration: u64) -> Result<()> {
        let mode = Mode::try_from(duration)?;
        self.switch_mode(mode)
    }

    pub fn switch_mode(&mut self, mode: Mode) -> Result<()> {
        if self.engine.has_started() && !self.engine.is_complete() {
            tracing::debug!("discarding in-progress {} session", self.mode);
        }
        let text = self.text.clone();
        self.reset(text, mode)?;
        tracing::info!("mode switched to {}", mode);
        Ok(())
    }

    /// Same text, same mode, fresh session
    pub fn restart(&mut self) -> Result<()> {
        let text = self.text.clone();
        self.reset(text, self.mode)
    }

    /// Fetches a different passage and starts over on it
    pub fn load_new_text(&mut self) -> Result<()> {
        let text = self.provider.next(Some(&self.text));
        self.reset(text, self.mode)
    }

    pub fn handle_typed_char(&mut self, c: char) {
        self.handle_event(TypingEvent::CharTyped(c));
    }

    pub fn handle_backspace(&mut self) {
        self.handle_event(TypingEvent::Backspace);
    }

    /// One second of session time passes
    pub fn on_tick(&mut self) {
        self.handle_event(TypingEvent::TimerTick);
    }

    /// Single entry point for logical events
    pub fn handle_event(&mut self, event: TypingEvent) {
        match event {
            TypingEvent::TimerTick => {
                let outcome = self.timer.tick();
                self.after_ticks(1, outcome);
            }
            keystroke => {
                // time that passed while keys kept arriving counts first
                self.poll_timer();
                for signal in self.engine.handle(keystroke) {
                    match signal {
                        Signal::Started => {
                            self.timer.start(self.clock.now());
                            tracing::info!("{} session started", self.mode);
                        }
                        Signal::Completed => self.on_session_completed(),
                    }
                }
                self.recompute();
            }
        }
    }

    /// Applies the whole seconds elapsed on the clock since the last tick
    pub fn poll_timer(&mut self) {
        let (applied, outcome) = self.timer.poll(self.clock.now());
        self.after_ticks(applied, outcome);
    }

    fn after_ticks(&mut self, applied: u64, outcome: TickOutcome) {
        if applied == 0 || outcome == TickOutcome::Ignored {
            return;
        }

        self.record_sample();

        if outcome == TickOutcome::Expired {
            tracing::debug!("time expired with {} chars typed", self.snapshot().cursor);
            self.on_session_completed();
        }
    }

    fn record_sample(&mut self) {
        self.recompute();
        self.samples.push(WpmSample {
            t: self.timer.elapsed_seconds() as f64,
            wpm: self.live.wpm as f64,
        });
    }

    /// Freezes the session, computes the final result and records a new
    /// personal best if earned. No-op before the first keystroke and after
    /// the first call.
    pub fn on_session_completed(&mut self) {
        if self.result.is_some() || !self.engine.has_started() {
            return;
        }

        // catch up with the clock; expiry here needs no second completion
        let (applied, _) = self.timer.poll(self.clock.now());
        if applied > 0 {
            self.record_sample();
        }
        self.timer.force_complete();
        self.engine.finish();

        let result = self
            .calculator
            .compute_result(&self.engine.snapshot(), self.timer.elapsed_seconds());
        tracing::info!(
            "{} session complete: {} wpm, {}% accuracy, {} errors over {} chars in {}s",
            self.mode,
            result.wpm,
            result.accuracy,
            result.errors,
            result.total_chars,
            result.elapsed_seconds
        );

        self.new_best = match self.bests.record_if_better(self.mode, result.wpm) {
            Ok(updated) => {
                if updated {
                    tracing::info!("new personal best for {}: {} wpm", self.mode, result.wpm);
                }
                updated
            }
            Err(err) => {
                tracing::warn!("failed to record personal best: {}", err);
                false
            }
        };

        if let Some(log) = &self.history {
            let record = SessionRecord::new(self.mode, &result, self.new_best);
            if let Err(err) = log.append(&record) {
                tracing::warn!("failed to append to {}: {}", log.path().display(), err);
            }
        }

        self.result = Some(result);
        self.recompute();
    }

    fn reset(&mut self, text: String, mode: Mode) -> Result<()> {
        // validate before touching anything
        let engine = TypingEngine::new(&text)?;

        // the old timer must be disarmed before its replacement exists
        self.timer.stop();
        self.timer = SessionTimer::new(mode);

        self.engine = engine;
        self.text = text;
        self.mode = mode;
        self.result = None;
        self.new_best = false;
        self.samples.clear();
        self.recompute();

        tracing::debug!("session reset ({}, {} chars)", mode, self.snapshot().len());
        Ok(())
    }

    fn recompute(&mut self) {
        self.live = self
            .calculator
            .live(&self.engine.snapshot(), self.timer.elapsed_seconds());
    }
}

impl std::fmt::Debug for ModeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeController")
            .field("mode", &self.mode)
            .field("text", &self.text)
            .field("engine", &self.engine)
            .field("timer", &self.timer)
            .field("live", &self.live)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bests::MemoryBestsStore;
    use crate::corpus::Corpus;
    use crate::error::TypingError;
    use crate::runtime::ManualClock;
    use crate::track::Status;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn controller(text: &str, mode: Mode) -> ModeController {
        ModeController::new(
            Box::new(Corpus::single(text).unwrap()),
            Box::new(MemoryBestsStore::default()),
            mode,
        )
        .unwrap()
    }

    fn type_str(ctl: &mut ModeController, s: &str) {
        for c in s.chars() {
            ctl.handle_typed_char(c);
        }
    }

    #[test]
    fn test_initial_state() {
        let ctl = controller("hello", Mode::Thirty);

        assert_eq!(ctl.mode(), Mode::Thirty);
        assert_eq!(ctl.text(), "hello");
        assert_eq!(ctl.remaining(), 30);
        assert_eq!(ctl.phase(), TimerPhase::Idle);
        assert_eq!(ctl.live_stats(), LiveStats::default());
        assert!(!ctl.is_complete());
        assert!(ctl.result().is_none());
    }

    #[test]
    fn test_abc_scenario() {
        let mut ctl = controller("abc", Mode::Thirty);

        ctl.handle_typed_char('a');
        assert_eq!(ctl.snapshot().entries[0].status, Status::Correct);
        assert_eq!(ctl.snapshot().cursor, 1);
        assert_eq!(ctl.phase(), TimerPhase::Running);

        ctl.handle_typed_char('x');
        assert_eq!(ctl.snapshot().entries[1].status, Status::Incorrect);
        assert_eq!(ctl.snapshot().cursor, 2);
        assert_eq!(ctl.live_stats().errors, 1);

        ctl.handle_backspace();
        assert_eq!(ctl.snapshot().cursor, 1);
        assert_eq!(ctl.snapshot().entries[1].status, Status::Pending);
        assert_eq!(ctl.live_stats().errors, 1);

        ctl.handle_typed_char('b');
        ctl.handle_typed_char('c');
        assert!(ctl.is_complete());

        let result = ctl.result().unwrap();
        assert_eq!(result.total_chars, 3);
        assert_eq!(result.errors, 1);
        assert_eq!(result.accuracy, 67);
    }

    #[test]
    fn test_completion_freezes_timer_and_records_best() {
        let clock = ManualClock::new();
        let mut ctl = controller("hi there", Mode::Thirty).with_clock(Box::new(clock.clone()));

        ctl.handle_typed_char('h');
        clock.advance(Duration::from_millis(2400));
        ctl.poll_timer();
        assert_eq!(ctl.remaining(), 28);

        type_str(&mut ctl, "i there");

        assert_eq!(ctl.phase(), TimerPhase::Expired);
        assert_eq!(ctl.remaining(), 28);
        assert!(!ctl.timer_armed());

        let result = *ctl.result().unwrap();
        assert_eq!(result.elapsed_seconds, 2);
        // 8 correct chars over 2s
        assert_eq!(result.wpm, 48);
        assert!(ctl.is_new_best());
        assert_eq!(ctl.personal_bests()[0], (Mode::Thirty, Some(48)));

        // nothing ticks after completion
        clock.advance(Duration::from_secs(10));
        ctl.poll_timer();
        assert_eq!(ctl.remaining(), 28);
    }

    #[test]
    fn test_timer_expiry_completes_partial_session() {
        let mut ctl = controller("a long passage that will not be finished", Mode::Thirty);

        type_str(&mut ctl, "a lonx");
        for _ in 0..30 {
            ctl.on_tick();
        }

        assert!(ctl.is_complete());
        assert_eq!(ctl.phase(), TimerPhase::Expired);
        let result = ctl.result().unwrap();
        assert_eq!(result.elapsed_seconds, 30);
        assert_eq!(result.total_chars, 6);
        assert_eq!(result.errors, 1);
        assert_eq!(result.accuracy, 83);
        // 5 correct chars in half a minute
        assert_eq!(result.wpm, 2);

        ctl.handle_typed_char('g');
        assert_eq!(ctl.snapshot().cursor, 6);
    }

    #[test]
    fn test_ticks_before_start_do_nothing() {
        let mut ctl = controller("abc", Mode::Sixty);

        ctl.on_tick();
        ctl.poll_timer();

        assert_eq!(ctl.remaining(), 60);
        assert_eq!(ctl.phase(), TimerPhase::Idle);
        assert!(ctl.wpm_samples().is_empty());
    }

    #[test]
    fn test_live_wpm_follows_ticks() {
        let mut ctl = controller("abcdefghijklmnop", Mode::Thirty);

        type_str(&mut ctl, "abcdefghij");
        assert_eq!(ctl.live_stats().wpm, 0);

        for _ in 0..6 {
            ctl.on_tick();
        }
        // 10 correct chars in 6s
        assert_eq!(ctl.live_stats().wpm, 20);
        assert_eq!(ctl.wpm_samples().len(), 6);
        assert_eq!(ctl.wpm_samples().last().unwrap().t, 6.0);
    }

    #[test]
    fn test_select_mode_resets_session() {
        let mut ctl = controller("abcdef", Mode::Thirty);
        type_str(&mut ctl, "abx");
        ctl.on_tick();

        ctl.select_mode(60).unwrap();

        assert_eq!(ctl.mode(), Mode::Sixty);
        assert_eq!(ctl.snapshot().cursor, 0);
        assert_eq!(ctl.remaining(), 60);
        assert_eq!(ctl.phase(), TimerPhase::Idle);
        assert_eq!(ctl.live_stats(), LiveStats::default());
        assert!(!ctl.has_started());
        assert!(ctl.personal_bests().iter().all(|(_, best)| best.is_none()));
    }

    #[test]
    fn test_select_mode_rejects_unsupported_duration() {
        let mut ctl = controller("abcdef", Mode::Thirty);
        type_str(&mut ctl, "ab");

        assert_matches!(ctl.select_mode(45), Err(TypingError::InvalidInput(_)));

        assert_eq!(ctl.mode(), Mode::Thirty);
        assert_eq!(ctl.snapshot().cursor, 2);
        assert_eq!(ctl.phase(), TimerPhase::Running);
    }

    #[test]
    fn test_reset_disarms_previous_timer() {
        let clock = ManualClock::new();
        let mut ctl = controller("abcdef", Mode::Thirty).with_clock(Box::new(clock.clone()));

        ctl.handle_typed_char('a');
        assert!(ctl.timer_armed());

        ctl.select_mode(120).unwrap();
        assert!(!ctl.timer_armed());

        // time that passes for the superseded session must not leak in
        clock.advance(Duration::from_secs(5));
        ctl.poll_timer();
        assert_eq!(ctl.remaining(), 120);
    }

    #[test]
    fn test_restart_is_idempotent() {
        let mut ctl = controller("abcdef", Mode::Sixty);
        type_str(&mut ctl, "abq");
        ctl.on_tick();

        ctl.restart().unwrap();
        let once = (ctl.text().to_string(), ctl.snapshot().cursor, ctl.remaining(), ctl.phase());
        ctl.restart().unwrap();
        let twice = (ctl.text().to_string(), ctl.snapshot().cursor, ctl.remaining(), ctl.phase());

        assert_eq!(once, twice);
        assert_eq!(once, ("abcdef".to_string(), 0, 60, TimerPhase::Idle));
        assert_eq!(ctl.snapshot().error_tally, 0);
    }

    #[test]
    fn test_load_new_text_picks_another_passage() {
        let corpus = Corpus::new("pair", vec!["first text".into(), "second text".into()]).unwrap();
        let mut ctl = ModeController::new(
            Box::new(corpus),
            Box::new(MemoryBestsStore::default()),
            Mode::Thirty,
        )
        .unwrap();

        let before = ctl.text().to_string();
        type_str(&mut ctl, "fi");
        ctl.load_new_text().unwrap();

        assert_ne!(ctl.text(), before);
        assert_eq!(ctl.snapshot().cursor, 0);
        assert_eq!(ctl.phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_slower_session_does_not_lower_best() {
        let mut ctl = controller("ab", Mode::Thirty);

        type_str(&mut ctl, "a");
        ctl.on_tick();
        type_str(&mut ctl, "b");
        assert!(ctl.is_new_best());
        let best = ctl.personal_bests()[0].1;

        ctl.restart().unwrap();
        type_str(&mut ctl, "a");
        for _ in 0..5 {
            ctl.on_tick();
        }
        type_str(&mut ctl, "b");

        assert!(!ctl.is_new_best());
        assert_eq!(ctl.personal_bests()[0].1, best);
    }

    #[test]
    fn test_visible_counting_forgives_corrections() {
        let mut ctl = controller("abc", Mode::Thirty).with_error_counting(ErrorCounting::Visible);

        type_str(&mut ctl, "ax");
        assert_eq!(ctl.live_stats().errors, 1);
        ctl.handle_backspace();
        assert_eq!(ctl.live_stats().errors, 0);
        type_str(&mut ctl, "bc");

        assert_eq!(ctl.result().unwrap().accuracy, 100);
    }

    #[test]
    fn test_completion_appends_history() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::new(dir.path().join("history.csv"));
        let mut ctl = controller("ok", Mode::Thirty).with_history(log.clone());

        ctl.handle_typed_char('o');
        ctl.on_tick();
        ctl.handle_typed_char('k');

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mode_secs, 30);
        assert_eq!(records[0].total_chars, 2);
    }

    #[test]
    fn test_completion_is_computed_once() {
        let mut ctl = controller("ab", Mode::Thirty);
        type_str(&mut ctl, "ab");
        let first = *ctl.result().unwrap();

        ctl.on_session_completed();
        ctl.on_tick();

        assert_eq!(*ctl.result().unwrap(), first);
    }

    #[test]
    fn test_completion_counts_time_since_last_poll() {
        let clock = ManualClock::new();
        let mut ctl = controller("hello world", Mode::Thirty).with_clock(Box::new(clock.clone()));

        ctl.handle_typed_char('h');
        clock.advance(Duration::from_secs(5));
        type_str(&mut ctl, "ello world");

        let result = *ctl.result().unwrap();
        assert_eq!(result.elapsed_seconds, 5);
        assert_eq!(ctl.remaining(), 25);
        // 11 correct chars over 5s
        assert_eq!(result.wpm, 26);
        assert_eq!(ctl.personal_bests()[0], (Mode::Thirty, Some(26)));
    }

    #[test]
    fn test_keystrokes_advance_live_time() {
        let clock = ManualClock::new();
        let mut ctl = controller("abcdefgh", Mode::Thirty).with_clock(Box::new(clock.clone()));

        ctl.handle_typed_char('a');
        clock.advance(Duration::from_millis(1500));
        ctl.handle_typed_char('b');
        assert_eq!(ctl.remaining(), 29);
        clock.advance(Duration::from_millis(600));
        ctl.handle_typed_char('c');

        assert_eq!(ctl.remaining(), 28);
        assert_eq!(ctl.live_stats().wpm, 18);
        assert_eq!(ctl.wpm_samples().len(), 2);
    }

    #[test]
    fn test_keystroke_after_silent_expiry_is_rejected() {
        let clock = ManualClock::new();
        let mut ctl = controller("abcdef", Mode::Thirty).with_clock(Box::new(clock.clone()));

        ctl.handle_typed_char('a');
        clock.advance(Duration::from_secs(31));
        ctl.handle_typed_char('b');

        assert!(ctl.is_complete());
        assert_eq!(ctl.snapshot().cursor, 1);
        assert_eq!(ctl.result().unwrap().elapsed_seconds, 30);
    }
}
