use serde::{Deserialize, Serialize};

use crate::error::{Result, TypingError};

/// Test duration, independent of the passage being typed
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
    strum_macros::Display,
)]
#[serde(try_from = "u64", into = "u64")]
pub enum Mode {
    #[default]
    #[strum(serialize = "30s")]
    Thirty,
    #[strum(serialize = "60s")]
    Sixty,
    #[strum(serialize = "120s")]
    OneTwenty,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Thirty, Mode::Sixty, Mode::OneTwenty];

    pub fn seconds(self) -> u64 {
        match self {
            Mode::Thirty => 30,
            Mode::Sixty => 60,
            Mode::OneTwenty => 120,
        }
    }

    /// Next mode in display order, wrapping around
    pub fn next(self) -> Mode {
        match self {
            Mode::Thirty => Mode::Sixty,
            Mode::Sixty => Mode::OneTwenty,
            Mode::OneTwenty => Mode::Thirty,
        }
    }

    pub fn previous(self) -> Mode {
        match self {
            Mode::Thirty => Mode::OneTwenty,
            Mode::Sixty => Mode::Thirty,
            Mode::OneTwenty => Mode::Sixty,
        }
    }
}

impl TryFrom<u64> for Mode {
    type Error = TypingError;

    fn try_from(secs: u64) -> Result<Self> {
        match secs {
            30 => Ok(Mode::Thirty),
            60 => Ok(Mode::Sixty),
            120 => Ok(Mode::OneTwenty),
            other => Err(TypingError::InvalidInput(format!(
                "unsupported mode duration {other}s (expected 30, 60 or 120)"
            ))),
        }
    }
}

impl From<Mode> for u64 {
    fn from(mode: Mode) -> Self {
        mode.seconds()
    }
}
