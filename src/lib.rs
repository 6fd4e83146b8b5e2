//! Typing test engine: character track, countdown timer, statistics and
//! personal bests, plus the stores and widget the `typetest` binary uses.
pub mod app_dirs;
pub mod bests;
pub mod config;
pub mod controller;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod history;
pub mod mode;
pub mod runtime;
pub mod stats;
pub mod timer;
pub mod track;
pub mod ui;

pub use controller::ModeController;
pub use error::{Result, TypingError};
pub use mode::Mode;
