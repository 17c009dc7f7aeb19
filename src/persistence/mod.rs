//! Save/load persistence
//!
//! Features:
//! - Three manual slots plus an autosave slot, one JSON file each
//! - Lenient envelope: missing fields take defaults
//! - Write to a temp file, then rename over the slot
//! - Corruption detection: a malformed slot loads as a fresh game

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::economy::{AuxiliaryFlags, Ledger, UpgradeLevels};
use crate::settings::Settings;

/// Directory name under the platform data dir
pub const APP_DIR_NAME: &str = "NeonDefender";
/// Number of manual slots
pub const MANUAL_SLOTS: u8 = 3;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed save {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode save data: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Where a save lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveSlot {
    /// Numbered 1..=3
    Manual(u8),
    Auto,
}

impl SaveSlot {
    /// Manual slot `n`, if it exists
    pub fn manual(n: u8) -> Option<Self> {
        (1..=MANUAL_SLOTS).contains(&n).then_some(SaveSlot::Manual(n))
    }

    /// Every slot, manual ones first
    pub fn all() -> impl Iterator<Item = SaveSlot> {
        (1..=MANUAL_SLOTS).map(SaveSlot::Manual).chain(std::iter::once(SaveSlot::Auto))
    }

    pub fn file_name(&self) -> String {
        match self {
            SaveSlot::Manual(n) => format!("save_{n}.json"),
            SaveSlot::Auto => "autosave.json".to_string(),
        }
    }
}

/// Everything that survives between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    pub currency: u64,
    pub score: u64,
    pub upgrades: UpgradeLevels,
    pub auxiliaries: AuxiliaryFlags,
    pub volume: f32,
    /// Control name -> key name
    pub keys: BTreeMap<String, String>,
    /// Unlocked achievement ids
    pub achievements: Vec<String>,
}

impl Default for SaveData {
    fn default() -> Self {
        Self::capture(&Ledger::default(), &Settings::default(), Vec::new())
    }
}

impl SaveData {
    pub fn capture(ledger: &Ledger, settings: &Settings, achievements: Vec<String>) -> Self {
        Self {
            currency: ledger.currency,
            score: ledger.score,
            upgrades: ledger.upgrades,
            auxiliaries: ledger.auxiliaries,
            volume: settings.master_volume,
            keys: settings.raw_bindings(),
            achievements,
        }
    }

    /// Ledger restored from the save; combo state starts fresh
    pub fn ledger(&self) -> Ledger {
        Ledger {
            currency: self.currency,
            score: self.score,
            upgrades: self.upgrades,
            auxiliaries: self.auxiliaries,
            ..Ledger::default()
        }
    }

    pub fn settings(&self) -> Settings {
        Settings::from_raw(self.volume, &self.keys)
    }
}

/// What a slot holds, for the slot menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSummary {
    Empty,
    Corrupted,
    Filled { score: u64, currency: u64 },
}

/// Directory of save slots
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `%APPDATA%\NeonDefender` on Windows, `~/.local/share/NeonDefender`
    /// elsewhere. `None` when no home directory can be found.
    pub fn default_location() -> Option<PathBuf> {
        #[cfg(windows)]
        let base = std::env::var_os("APPDATA")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from);
        #[cfg(not(windows))]
        let base = std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("share"));

        base.map(|b| b.join(APP_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, slot: SaveSlot) -> PathBuf {
        self.dir.join(slot.file_name())
    }

    /// Raw read: `Ok(None)` for a missing slot, `Malformed` for bad JSON
    pub fn read(&self, slot: SaveSlot) -> Result<Option<SaveData>, PersistError> {
        let path = self.path(slot);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| PersistError::Malformed { path, source })
    }

    /// Load a slot, falling back to a fresh game when it is missing or unreadable
    pub fn load(&self, slot: SaveSlot) -> SaveData {
        match self.read(slot) {
            Ok(Some(data)) => {
                log::info!(
                    "Loaded {} (score {}, {} credits)",
                    slot.file_name(),
                    data.score,
                    data.currency
                );
                data
            }
            Ok(None) => {
                log::info!("No save in {}, starting fresh", slot.file_name());
                SaveData::default()
            }
            Err(e) => {
                log::warn!("Could not load {}: {}; starting fresh", slot.file_name(), e);
                SaveData::default()
            }
        }
    }

    /// Write a slot via a temp file and rename
    pub fn save(&self, slot: SaveSlot, data: &SaveData) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(data).map_err(PersistError::Encode)?;
        let path = self.path(slot);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        log::info!("Saved {} (score {})", slot.file_name(), data.score);
        Ok(())
    }

    pub fn summary(&self, slot: SaveSlot) -> SlotSummary {
        match self.read(slot) {
            Ok(Some(data)) => SlotSummary::Filled {
                score: data.score,
                currency: data.currency,
            },
            Ok(None) => SlotSummary::Empty,
            Err(_) => SlotSummary::Corrupted,
        }
    }

    /// Remove a slot. Returns false when there was nothing to delete.
    pub fn delete(&self, slot: SaveSlot) -> Result<bool, PersistError> {
        match fs::remove_file(self.path(slot)) {
            Ok(()) => {
                log::info!("Deleted {}", slot.file_name());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
