//! Session history of accepted diagnoses. Kept in memory only and owned by
//! whoever serves the session; nothing here is global.

pub mod recorder;
pub mod thumbnail;

pub use recorder::{RecordError, ResultRecorder};

use chrono::{DateTime, Local};
use shared::HistoryEntryDto;
use uuid::Uuid;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub label: String,
    /// Percentage rounded to one decimal.
    pub confidence: f64,
    /// `data:image/jpeg;base64,...` thumbnail.
    pub thumbnail: String,
    pub image_hash: String,
    /// Local time truncated to the minute.
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    pub fn timestamp_display(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn to_dto(&self) -> HistoryEntryDto {
        HistoryEntryDto {
            id: self.id,
            label: self.label.clone(),
            confidence: self.confidence,
            thumbnail: self.thumbnail.clone(),
            image_hash: self.image_hash.clone(),
            timestamp: self.timestamp_display(),
        }
    }
}

/// Append-only log; only [`History::clear`] removes entries.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    display_limit: usize,
}

impl History {
    pub fn new(display_limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            display_limit,
        }
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// The trailing window of at most `display_limit` entries, oldest first.
    pub fn recent(&self) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(self.display_limit);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        log::info!("Clearing {} history entries", self.entries.len());
        self.entries.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            id: Uuid::new_v4(),
            label: format!("label-{}", n),
            confidence: 75.0,
            thumbnail: String::new(),
            image_hash: String::new(),
            timestamp: Local::now(),
        }
    }

    #[test]
    fn view_is_bounded_to_most_recent_in_insertion_order() {
        let mut history = History::default();
        for n in 0..15 {
            history.append(entry(n));
        }
        assert_eq!(history.len(), 15);
        let labels: Vec<_> = history.recent().iter().map(|e| e.label.clone()).collect();
        let expected: Vec<_> = (5..15).map(|n| format!("label-{}", n)).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn short_history_is_shown_whole() {
        let mut history = History::new(10);
        history.append(entry(0));
        history.append(entry(1));
        assert_eq!(history.recent().len(), 2);
        assert_eq!(history.recent()[0].label, "label-0");
    }

    #[test]
    fn clear_empties_everything() {
        let mut history = History::new(3);
        for n in 0..4 {
            history.append(entry(n));
        }
        history.clear();
        assert!(history.is_empty());
        assert!(history.recent().is_empty());
    }
}
