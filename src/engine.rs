use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::Result;
use crate::track::{CharacterTrack, TrackSnapshot};

/// Logical events that drive a session, independent of the input device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypingEvent {
    CharTyped(char),
    Backspace,
    TimerTick,
}

/// Notifications produced while handling a keystroke
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// First accepted advance of the session
    Started,
    /// The last character of the text was just typed
    Completed,
}

/// Maps a terminal key press to a typing event.
///
/// Releases, control chords and non-printable keys other than Backspace
/// yield `None`.
pub fn key_to_event(key: &KeyEvent) -> Option<TypingEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }

    match key.code {
        KeyCode::Backspace => Some(TypingEvent::Backspace),
        KeyCode::Char(c) if c.is_whitespace() => Some(TypingEvent::CharTyped(' ')),
        KeyCode::Char(c) if !c.is_control() => Some(TypingEvent::CharTyped(c)),
        _ => None,
    }
}

/// Sole mutator of a [`CharacterTrack`]; enforces sequencing rules
#[derive(Debug)]
pub struct TypingEngine {
    track: CharacterTrack,
    started: bool,
    completed: bool,
}

impl TypingEngine {
    pub fn new(text: &str) -> Result<Self> {
        Ok(Self {
            track: CharacterTrack::new(text)?,
            started: false,
            completed: false,
        })
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn snapshot(&self) -> TrackSnapshot<'_> {
        self.track.snapshot()
    }

    /// Applies one keystroke. Returns the signals it produced; rejected
    /// input (after completion, or a backspace at the start) yields none.
    pub fn handle(&mut self, event: TypingEvent) -> Vec<Signal> {
        if self.completed {
            return vec![];
        }

        match event {
            TypingEvent::CharTyped(c) => self.write(c),
            TypingEvent::Backspace => {
                if let Err(err) = self.track.undo() {
                    tracing::warn!("backspace rejected: {}", err);
                }
                vec![]
            }
            TypingEvent::TimerTick => vec![],
        }
    }

    fn write(&mut self, c: char) -> Vec<Signal> {
        let mut signals = vec![];

        let finished = match self.track.advance(c) {
            Ok(finished) => finished,
            Err(err) => {
                tracing::warn!("keystroke rejected: {}", err);
                return signals;
            }
        };

        if !self.started {
            self.started = true;
            signals.push(Signal::Started);
        }

        if finished {
            self.finish();
            signals.push(Signal::Completed);
        }

        signals
    }

    /// Ends the session (text exhausted or time expired); further input is rejected
    pub fn finish(&mut self) {
        self.completed = true;
        self.track.finalize();
    }
}
