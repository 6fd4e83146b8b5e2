use crate::error::{Result, TypingError};

/// Stand-in the input layer may deliver instead of a literal space
pub const NO_BREAK_SPACE: char = '\u{a0}';

#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Pending,
    Correct,
    Incorrect,
}

/// One slot of the ledger, aligned with a code point of the target text
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub expected: char,
    pub status: Status,
    pub typed: Option<char>,
}

/// Per-character status ledger over the passage being typed.
///
/// Entries before `cursor` are classified, entries at or after it are
/// pending. `error_tally` counts every incorrect advance and is never
/// decremented, so an undo reopens a slot without forgiving the mistake.
#[derive(Clone, Debug)]
pub struct CharacterTrack {
    entries: Vec<Entry>,
    cursor: usize,
    error_tally: usize,
    finalized: bool,
}

/// Read-only view over a track, used for stats and rendering
#[derive(Clone, Copy, Debug)]
pub struct TrackSnapshot<'a> {
    pub entries: &'a [Entry],
    pub cursor: usize,
    pub error_tally: usize,
}

impl TrackSnapshot<'_> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.entries.len()
    }

    /// Character at the cursor, if the test is not complete
    pub fn current(&self) -> Option<&Entry> {
        self.entries.get(self.cursor)
    }

    pub fn correct_count(&self) -> usize {
        self.count(Status::Correct)
    }

    pub fn incorrect_count(&self) -> usize {
        self.count(Status::Incorrect)
    }

    fn count(&self, status: Status) -> usize {
        self.entries[..self.cursor]
            .iter()
            .filter(|e| e.status == status)
            .count()
    }
}

fn normalize(c: char) -> char {
    match c {
        NO_BREAK_SPACE => ' ',
        c => c,
    }
}

impl CharacterTrack {
    pub fn new(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(TypingError::InvalidInput(
                "target text must not be empty".to_string(),
            ));
        }

        let entries = text
            .chars()
            .map(|expected| Entry {
                expected: normalize(expected),
                status: Status::Pending,
                typed: None,
            })
            .collect();

        Ok(Self {
            entries,
            cursor: 0,
            error_tally: 0,
            finalized: false,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn error_tally(&self) -> usize {
        self.error_tally
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.entries.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn get_expected_char(&self, idx: usize) -> Option<char> {
        self.entries.get(idx).map(|e| e.expected)
    }

    /// Classifies `typed` against the current character and moves on.
    /// Returns whether the whole text has now been visited.
    pub fn advance(&mut self, typed: char) -> Result<bool> {
        if self.finalized || self.cursor >= self.entries.len() {
            return Err(self.out_of_range("advance"));
        }

        let typed = normalize(typed);
        let entry = &mut self.entries[self.cursor];
        entry.status = if typed == entry.expected {
            Status::Correct
        } else {
            self.error_tally += 1;
            Status::Incorrect
        };
        entry.typed = Some(typed);
        self.cursor += 1;

        Ok(self.is_complete())
    }

    /// Steps back one character and reopens it. The error tally is kept.
    pub fn undo(&mut self) -> Result<()> {
        if self.finalized || self.cursor == 0 {
            return Err(self.out_of_range("undo"));
        }

        self.cursor -= 1;
        let entry = &mut self.entries[self.cursor];
        entry.status = Status::Pending;
        entry.typed = None;

        Ok(())
    }

    /// Freezes the track once the session is over
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    pub fn snapshot(&self) -> TrackSnapshot<'_> {
        TrackSnapshot {
            entries: &self.entries,
            cursor: self.cursor,
            error_tally: self.error_tally,
        }
    }

    fn out_of_range(&self, operation: &'static str) -> TypingError {
        TypingError::OutOfRange {
            operation,
            cursor: self.cursor,
            len: self.entries.len(),
        }
    }
}
