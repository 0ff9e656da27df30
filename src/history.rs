//! Journal history: the persisted record shape and the stores behind the
//! [`HistoryStore`] trait. The JSON file is a plain array of entries,
//! appended by a single writer.

use crate::case::CaseType;
use crate::pipeline::DocumentSentimentResult;
use crate::sentiment::Label;
use crate::MoodError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Hours ahead of UTC for stored timestamps (Vietnam, no DST).
const LOCAL_OFFSET_HOURS: i64 = 7;

/// Current wall-clock time at UTC+7, e.g. `2025-11-20 10:22:05`.
pub fn local_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    (at.naive_utc() + chrono::Duration::hours(LOCAL_OFFSET_HOURS))
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// One persisted journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(default = "default_status")]
    pub status: String,
    pub text: String,
    #[serde(flatten)]
    pub sentiment: DocumentSentimentResult,
    #[serde(default)]
    pub advice_text: String,
    #[serde(default)]
    pub advice_source: String,
    #[serde(default)]
    pub timestamp: String,
    /// Seconds spent in the pipeline run that produced this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

fn default_status() -> String {
    "success".into()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub label: Option<Label>,
    pub case_type: Option<CaseType>,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        self.label.is_none_or(|l| entry.sentiment.predicted_label == l)
            && self.case_type.is_none_or(|c| entry.sentiment.case_type == c)
    }
}

pub trait HistoryStore {
    /// Up to `max_records` entries matching `filter`, newest first.
    fn load(
        &self,
        max_records: usize,
        filter: Option<&HistoryFilter>,
    ) -> Result<Vec<JournalEntry>, MoodError>;

    fn append(&self, entry: &JournalEntry) -> Result<(), MoodError>;
}

/// Newest first by timestamp; among equal timestamps the later-appended wins.
fn select_recent(
    entries: Vec<JournalEntry>,
    max_records: usize,
    filter: Option<&HistoryFilter>,
) -> Vec<JournalEntry> {
    let mut picked: Vec<JournalEntry> = entries
        .into_iter()
        .rev()
        .filter(|e| filter.is_none_or(|f| f.matches(e)))
        .collect();
    picked.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    picked.truncate(max_records);
    picked
}

pub struct JsonFileHistory {
    path: PathBuf,
}

impl JsonFileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileHistory { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw array contents; a missing or blank file is an empty history.
    fn read_raw(&self) -> Result<Vec<serde_json::Value>, MoodError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn read_all(&self) -> Result<Vec<JournalEntry>, MoodError> {
        let raw = self.read_raw()?;
        let mut entries = Vec::with_capacity(raw.len());
        for (i, value) in raw.into_iter().enumerate() {
            match serde_json::from_value::<JournalEntry>(value) {
                Ok(entry) => entries.push(entry),
                Err(e) => log::warn!(
                    "skipping malformed history record {i} in {}: {e}",
                    self.path.display()
                ),
            }
        }
        Ok(entries)
    }
}

impl HistoryStore for JsonFileHistory {
    fn load(
        &self,
        max_records: usize,
        filter: Option<&HistoryFilter>,
    ) -> Result<Vec<JournalEntry>, MoodError> {
        Ok(select_recent(self.read_all()?, max_records, filter))
    }

    fn append(&self, entry: &JournalEntry) -> Result<(), MoodError> {
        // Keep records we cannot parse; they are someone else's data
        let mut raw = self.read_raw()?;
        raw.push(serde_json::to_value(entry)?);

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&raw)?;
        std::fs::write(&self.path, json)?;
        log::debug!("appended history record to {}", self.path.display());
        Ok(())
    }
}

/// In-process store, for tests and dry runs.
#[derive(Default)]
pub struct MemoryHistory {
    entries: RefCell<Vec<JournalEntry>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<JournalEntry>) -> Self {
        MemoryHistory {
            entries: RefCell::new(entries),
        }
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.borrow().clone()
    }
}

impl HistoryStore for MemoryHistory {
    fn load(
        &self,
        max_records: usize,
        filter: Option<&HistoryFilter>,
    ) -> Result<Vec<JournalEntry>, MoodError> {
        Ok(select_recent(self.entries(), max_records, filter))
    }

    fn append(&self, entry: &JournalEntry) -> Result<(), MoodError> {
        self.entries.borrow_mut().push(entry.clone());
        Ok(())
    }
}
