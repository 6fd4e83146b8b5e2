use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::mode::Mode;

/// Best net WPM per mode. Stored values only ever increase.
pub trait PersonalBestsStore {
    fn get(&self, mode: Mode) -> Option<u32>;

    /// Stores `wpm` if it strictly beats the current best (or none exists).
    /// Returns whether the stored value changed.
    fn record_if_better(&mut self, mode: Mode, wpm: u32) -> Result<bool>;

    fn all(&self) -> [(Mode, Option<u32>); 3] {
        Mode::ALL.map(|mode| (mode, self.get(mode)))
    }
}

fn beats(current: Option<u32>, wpm: u32) -> bool {
    match current {
        Some(best) => wpm > best,
        None => true,
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBestsStore {
    bests: BTreeMap<Mode, u32>,
}

impl PersonalBestsStore for MemoryBestsStore {
    fn get(&self, mode: Mode) -> Option<u32> {
        self.bests.get(&mode).copied()
    }

    fn record_if_better(&mut self, mode: Mode, wpm: u32) -> Result<bool> {
        if !beats(self.get(mode), wpm) {
            return Ok(false);
        }
        self.bests.insert(mode, wpm);
        Ok(true)
    }
}

/// JSON file keyed by mode seconds, e.g. `{"30": 72, "60": 65}`
#[derive(Debug, Clone)]
pub struct FileBestsStore {
    path: PathBuf,
    bests: BTreeMap<Mode, u32>,
}

impl FileBestsStore {
    /// Opens the store at the default location, loading any saved bests
    pub fn open_default() -> Self {
        let path = AppDirs::bests_path().unwrap_or_else(|| PathBuf::from("typetest_bests.json"));
        Self::open(path)
    }

    /// A missing or unreadable file starts an empty store
    pub fn open<P: AsRef<Path>>(p: P) -> Self {
        let path = p.as_ref().to_path_buf();
        let bests = match Self::load(&path) {
            Ok(bests) => bests,
            Err(err) => {
                if path.exists() {
                    tracing::warn!("ignoring unreadable bests file {}: {}", path.display(), err);
                }
                BTreeMap::new()
            }
        };
        for mode in Mode::ALL {
            tracing::debug!("personal best for {}: {:?}", mode, bests.get(&mode));
        }
        Self { path, bests }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<Mode, u32>> {
        let bytes = fs::read(path)?;
        let raw: BTreeMap<u64, u32> = serde_json::from_slice(&bytes)?;
        Ok(raw
            .into_iter()
            .filter_map(|(secs, wpm)| Mode::try_from(secs).ok().map(|mode| (mode, wpm)))
            .collect())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw: BTreeMap<u64, u32> = self
            .bests
            .iter()
            .map(|(mode, wpm)| (mode.seconds(), *wpm))
            .collect();
        fs::write(&self.path, serde_json::to_vec_pretty(&raw)?)?;
        Ok(())
    }
}

impl PersonalBestsStore for FileBestsStore {
    fn get(&self, mode: Mode) -> Option<u32> {
        self.bests.get(&mode).copied()
    }

    fn record_if_better(&mut self, mode: Mode, wpm: u32) -> Result<bool> {
        let previous = self.get(mode);
        if !beats(previous, wpm) {
            return Ok(false);
        }

        self.bests.insert(mode, wpm);
        if let Err(err) = self.save() {
            // keep the on-disk and in-memory views in step
            match previous {
                Some(best) => self.bests.insert(mode, best),
                None => self.bests.remove(&mode),
            };
            return Err(err);
        }
        Ok(true)
    }
}
