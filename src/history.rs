use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::mode::Mode;
use crate::stats::SessionResult;

/// One completed session, as written to the history file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub date: DateTime<Local>,
    pub mode_secs: u64,
    pub elapsed_secs: u64,
    pub wpm: u32,
    pub accuracy: u32,
    pub total_chars: usize,
    pub errors: usize,
    pub new_best: bool,
}

impl SessionRecord {
    pub fn new(mode: Mode, result: &SessionResult, new_best: bool) -> Self {
        Self {
            date: Local::now(),
            mode_secs: mode.seconds(),
            elapsed_secs: result.elapsed_seconds,
            wpm: result.wpm,
            accuracy: result.accuracy,
            total_chars: result.total_chars,
            errors: result.errors,
            new_best,
        }
    }
}

/// Append-only CSV log of finished sessions
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn open_default() -> Option<Self> {
        AppDirs::history_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<SessionRecord>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<SessionRecord>, csv::Error>>()?;
        Ok(records)
    }
}
