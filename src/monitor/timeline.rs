//! Append-only incident timeline

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// One timeline line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: DateTime<Local>,
    pub text: String,
}

impl fmt::Display for TimelineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

/// Ordered log of detection, reasoning and action events.
///
/// Entries are never rewritten. With a cap configured the oldest entries
/// are dropped, but `total_recorded` keeps counting every append.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: VecDeque<TimelineEntry>,
    max_entries: Option<usize>,
    total_recorded: usize,
}

impl Timeline {
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
            total_recorded: 0,
        }
    }

    /// Append a timestamped entry
    pub fn append(&mut self, text: impl Into<String>) {
        self.entries.push_back(TimelineEntry {
            timestamp: Local::now(),
            text: text.into(),
        });
        self.total_recorded += 1;

        if let Some(max) = self.max_entries {
            while self.entries.len() > max.max(1) {
                self.entries.pop_front();
            }
        }
    }

    /// Append a detection entry unless the previous entry carries the same marker.
    ///
    /// Returns whether the entry was appended.
    pub fn append_detection(&mut self, marker: &str, text: impl Into<String>) -> bool {
        if self
            .entries
            .back()
            .is_some_and(|last| last.text.contains(marker))
        {
            return false;
        }
        self.append(text);
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter()
    }

    /// The last `count` entries, oldest first
    pub fn recent(&self, count: usize) -> Vec<TimelineEntry> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn last(&self) -> Option<&TimelineEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries ever appended, including evicted ones
    pub fn total_recorded(&self) -> usize {
        self.total_recorded
    }

    /// Retained entries, one rendered line each
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_detections_deduplicated() {
        let mut timeline = Timeline::new(None);
        assert!(timeline.append_detection(
            "High Failure Rate",
            "DETECTED: High Failure Rate (90%) on HDFC"
        ));
        // different entity, same marker: still suppressed
        assert!(!timeline.append_detection(
            "High Failure Rate",
            "DETECTED: High Failure Rate (40%) on AXIS"
        ));
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_dedup_is_adjacency_based() {
        let mut timeline = Timeline::new(None);
        timeline.append_detection("High Failure Rate", "DETECTED: High Failure Rate (90%) on HDFC");
        timeline.append("REASONED: Bank gateway timeout");
        assert!(timeline.append_detection(
            "High Failure Rate",
            "DETECTED: High Failure Rate (85%) on HDFC"
        ));
        assert!(timeline.append_detection("High Latency", "DETECTED: High Latency (2100ms) on ICICI"));
        assert!(!timeline.append_detection("High Latency", "DETECTED: High Latency (2300ms) on ICICI"));
        assert_eq!(timeline.len(), 4);
    }

    #[test]
    fn test_cap_evicts_oldest_but_counts_all() {
        let mut timeline = Timeline::new(Some(2));
        timeline.append("one");
        timeline.append("two");
        timeline.append("three");

        let texts: Vec<&str> = timeline.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
        assert_eq!(timeline.total_recorded(), 3);
    }

    #[test]
    fn test_render_format() {
        let mut timeline = Timeline::new(None);
        timeline.append("ACT: Rerouting HDFC");
        let rendered = timeline.render();
        // HH:MM:SS - text
        assert_eq!(&rendered[2..3], ":");
        assert!(rendered.ends_with(" - ACT: Rerouting HDFC"));
        assert_eq!(timeline.recent(7).len(), 1);
    }
}
