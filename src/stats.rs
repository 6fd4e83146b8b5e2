use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::track::TrackSnapshot;

/// Characters per "word" in WPM figures
pub const CHARS_PER_WORD: f64 = 5.0;

/// How mistakes that were later corrected count towards errors
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ErrorCounting {
    /// Every incorrect keystroke counts, even if undone afterwards
    #[default]
    Permanent,
    /// Only characters currently marked incorrect count
    Visible,
}

/// Figures shown while the test is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: usize,
}

impl Default for LiveStats {
    fn default() -> Self {
        Self {
            wpm: 0,
            accuracy: 100,
            errors: 0,
        }
    }
}

/// Final figures, computed once when the session completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub total_chars: usize,
    pub errors: usize,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub elapsed_seconds: u64,
}

/// WPM observed at a point of the session, for the results chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WpmSample {
    pub t: f64,
    pub wpm: f64,
}

impl From<WpmSample> for (f64, f64) {
    fn from(p: WpmSample) -> Self {
        (p.t, p.wpm)
    }
}

/// Net words per minute over correct characters, 0 when no time has elapsed
pub fn net_wpm(correct_chars: usize, elapsed_seconds: u64) -> u32 {
    if elapsed_seconds == 0 {
        return 0;
    }
    let words = correct_chars as f64 / CHARS_PER_WORD;
    let minutes = elapsed_seconds as f64 / 60.0;
    (words / minutes).round() as u32
}

/// Share of visited characters that were not errors, 100 before any typing
pub fn accuracy(typed: usize, errors: usize) -> u32 {
    if typed == 0 {
        return 100;
    }
    let clean = typed.saturating_sub(errors) as f64;
    (100.0 * clean / typed as f64).round() as u32
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsCalculator {
    counting: ErrorCounting,
}

impl StatsCalculator {
    pub fn new(counting: ErrorCounting) -> Self {
        Self { counting }
    }

    pub fn counting(&self) -> ErrorCounting {
        self.counting
    }

    pub fn errors(&self, snapshot: &TrackSnapshot) -> usize {
        match self.counting {
            ErrorCounting::Permanent => snapshot.error_tally,
            ErrorCounting::Visible => snapshot.incorrect_count(),
        }
    }

    pub fn live(&self, snapshot: &TrackSnapshot, elapsed_seconds: u64) -> LiveStats {
        let errors = self.errors(snapshot);
        LiveStats {
            wpm: net_wpm(snapshot.correct_count(), elapsed_seconds),
            accuracy: accuracy(snapshot.cursor, errors),
            errors,
        }
    }

    pub fn compute_result(&self, snapshot: &TrackSnapshot, elapsed_seconds: u64) -> SessionResult {
        let errors = self.errors(snapshot);
        let correct_chars = snapshot.correct_count();

        SessionResult {
            wpm: net_wpm(correct_chars, elapsed_seconds),
            accuracy: accuracy(snapshot.cursor, errors),
            total_chars: snapshot.cursor,
            errors,
            correct_chars,
            incorrect_chars: snapshot.incorrect_count(),
            elapsed_seconds,
        }
    }
}
