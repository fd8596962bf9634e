//! Results of a single organize run.

use crate::conflict::ConflictOutcome;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Why a file was left at the top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The name has no extension to group by.
    NoExtension,
    /// A filter rule from the configuration file matched.
    Excluded,
    /// The operator chose to skip a conflicting file.
    ConflictSkipped,
    /// A filesystem operation failed; carries the error message.
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoExtension => write!(f, "no extension"),
            SkipReason::Excluded => write!(f, "excluded"),
            SkipReason::ConflictSkipped => write!(f, "skipped on conflict"),
            SkipReason::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// A file recorded as skipped, in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub name: String,
    pub reason: SkipReason,
}

/// Number of conflicts per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConflictCounts {
    pub overwritten: usize,
    pub renamed_incoming: usize,
    pub renamed_existing: usize,
    pub skipped: usize,
}

impl ConflictCounts {
    /// Counts one resolved conflict.
    pub fn record(&mut self, outcome: ConflictOutcome) {
        match outcome {
            ConflictOutcome::Overwritten => self.overwritten += 1,
            ConflictOutcome::RenamedIncoming => self.renamed_incoming += 1,
            ConflictOutcome::RenamedExisting => self.renamed_existing += 1,
            ConflictOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn get(&self, outcome: ConflictOutcome) -> usize {
        match outcome {
            ConflictOutcome::Overwritten => self.overwritten,
            ConflictOutcome::RenamedIncoming => self.renamed_incoming,
            ConflictOutcome::RenamedExisting => self.renamed_existing,
            ConflictOutcome::Skipped => self.skipped,
        }
    }

    /// Total number of conflicts encountered.
    pub fn total(&self) -> usize {
        self.overwritten + self.renamed_incoming + self.renamed_existing + self.skipped
    }
}

/// Everything that happened during one `organize` call.
///
/// Built up locally by the organizer and handed back to the caller; nothing
/// is shared between runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// The directory that was organized.
    pub directory: PathBuf,
    /// When the run started.
    pub started_at: DateTime<Local>,
    /// Files placed per lowercase extension, including renamed ones.
    pub moved: BTreeMap<String, usize>,
    /// Conflict outcomes.
    pub conflicts: ConflictCounts,
    /// Files left in place, in encounter order.
    pub skipped: Vec<SkippedFile>,
    /// Extension folders this run had to create.
    pub created_folders: Vec<String>,
}

impl RunSummary {
    /// Starts an empty summary for `directory`.
    pub fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
            started_at: Local::now(),
            moved: BTreeMap::new(),
            conflicts: ConflictCounts::default(),
            skipped: Vec::new(),
            created_folders: Vec::new(),
        }
    }

    pub fn record_move(&mut self, extension: &str) {
        *self.moved.entry(extension.to_string()).or_insert(0) += 1;
    }

    pub fn record_skip(&mut self, name: &str, reason: SkipReason) {
        self.skipped.push(SkippedFile {
            name: name.to_string(),
            reason,
        });
    }

    /// Total number of files placed into extension folders.
    pub fn total_moved(&self) -> usize {
        self.moved.values().sum()
    }

    /// Number of files moved under `extension`.
    pub fn moved_for(&self, extension: &str) -> usize {
        self.moved.get(extension).copied().unwrap_or(0)
    }

    /// Names of skipped files, in encounter order.
    pub fn skipped_names(&self) -> impl Iterator<Item = &str> {
        self.skipped.iter().map(|s| s.name.as_str())
    }

    /// True if the run neither moved nor skipped anything.
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.skipped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_counts_record() {
        let mut counts = ConflictCounts::default();
        counts.record(ConflictOutcome::Overwritten);
        counts.record(ConflictOutcome::Skipped);
        counts.record(ConflictOutcome::Skipped);

        assert_eq!(counts.get(ConflictOutcome::Overwritten), 1);
        assert_eq!(counts.get(ConflictOutcome::Skipped), 2);
        assert_eq!(counts.get(ConflictOutcome::RenamedExisting), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_summary_counts_and_order() {
        let mut summary = RunSummary::new(Path::new("/tmp/inbox"));
        assert!(summary.is_empty());

        summary.record_move("jpg");
        summary.record_move("jpg");
        summary.record_move("pdf");
        summary.record_skip("notes", SkipReason::NoExtension);
        summary.record_skip("photo.jpg", SkipReason::ConflictSkipped);

        assert_eq!(summary.total_moved(), 3);
        assert_eq!(summary.moved_for("jpg"), 2);
        assert_eq!(summary.moved_for("png"), 0);
        let names: Vec<_> = summary.skipped_names().collect();
        assert_eq!(names, vec!["notes", "photo.jpg"]);
    }

    #[test]
    fn test_summary_serializes_skip_reasons() {
        let mut summary = RunSummary::new(Path::new("/tmp/inbox"));
        summary.record_skip("a.txt", SkipReason::Failed("denied".to_string()));
        summary.record_skip("notes", SkipReason::NoExtension);

        let json = serde_json::to_value(&summary).expect("Failed to serialize");
        assert_eq!(json["skipped"][0]["reason"]["kind"], "failed");
        assert_eq!(json["skipped"][0]["reason"]["detail"], "denied");
        assert_eq!(json["skipped"][1]["reason"]["kind"], "no_extension");
        assert_eq!(json["conflicts"]["renamed_incoming"], 0);
    }
}
