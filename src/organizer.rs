/// Per-extension organization of a single directory.
///
/// The [`DirectoryOrganizer`] lists the top level of a directory, moves every
/// file into a subdirectory named after its lowercase extension, and hands
/// collisions to its [`ConflictResolver`]. Failures on one file never abort the
/// run: the file is recorded as skipped and the next entry is processed.
use crate::config::CompiledFilters;
use crate::conflict::{ConflictOutcome, ConflictResolver, is_occupied, move_file};
use crate::output::OutputFormatter;
use crate::prompt::ChoiceProvider;
use crate::summary::{RunSummary, SkipReason, SkippedFile};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while organizing a directory.
///
/// Only [`OrganizeError::InvalidTarget`] and [`OrganizeError::EnumerationFailed`]
/// end a run; the others are recovered per file.
#[derive(Debug)]
pub enum OrganizeError {
    /// The target does not exist or is not a directory.
    InvalidTarget {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Listing the target directory failed.
    EnumerationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create an extension folder.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move or rename a file.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTarget { path, source } => {
                write!(f, "Invalid target {}: {}", path.display(), source)
            }
            Self::EnumerationFailed { path, source } => {
                write!(f, "Failed to list {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidTarget { source, .. }
            | Self::EnumerationFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
        }
    }
}

/// Result type for organize operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// One top-level directory entry.
#[derive(Debug, Clone)]
pub struct Entry {
    /// File name with its original casing.
    pub name: String,
    /// Lowercase extension without the dot; empty if there is none.
    pub extension: String,
    /// Full path of the entry.
    pub source_path: PathBuf,
    /// Directories (including symlinks to them) are never moved.
    pub is_directory: bool,
}

/// A move that a run would perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub name: String,
    pub extension: String,
    pub destination: PathBuf,
    /// The destination is already occupied and would need resolving.
    pub conflict: bool,
    /// The extension folder does not exist yet.
    pub creates_folder: bool,
}

/// What a run would do, computed without touching the filesystem.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub directory: PathBuf,
    pub moves: Vec<PlannedMove>,
    pub skipped: Vec<SkippedFile>,
}

impl Plan {
    /// Number of planned moves that would hit an occupied destination.
    pub fn conflicts(&self) -> usize {
        self.moves.iter().filter(|m| m.conflict).count()
    }
}

/// How a file ended up after [`DirectoryOrganizer::place`].
enum Placement {
    Moved,
    Resolved(ConflictOutcome),
}

/// Organizes the top level of a directory by file extension.
pub struct DirectoryOrganizer<P> {
    resolver: ConflictResolver<P>,
    filters: CompiledFilters,
}

impl<P: ChoiceProvider> DirectoryOrganizer<P> {
    /// Creates an organizer that resolves conflicts with `provider`.
    pub fn new(provider: P) -> Self {
        Self {
            resolver: ConflictResolver::new(provider),
            filters: CompiledFilters::default(),
        }
    }

    /// Leaves files matched by `filters` in place.
    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Moves every top-level file of `directory` into `directory/<extension>/`.
    ///
    /// Files without extension, files matched by a filter, conflicts the
    /// provider skips, and files whose folder creation or move fails are all
    /// left in place and listed in the summary's skipped files.
    ///
    /// # Errors
    ///
    /// Returns an error only if `directory` is not a directory or cannot be
    /// listed. In that case no file has been touched.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use extidy::conflict::ConflictChoice;
    /// use extidy::organizer::DirectoryOrganizer;
    /// use extidy::prompt::FixedChoice;
    /// use std::path::Path;
    ///
    /// let mut organizer = DirectoryOrganizer::new(FixedChoice(ConflictChoice::Skip));
    /// match organizer.organize(Path::new("/home/user/Downloads")) {
    ///     Ok(summary) => println!("Moved {} files", summary.total_moved()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn organize(&mut self, directory: &Path) -> OrganizeResult<RunSummary> {
        let entries = list_entries(directory)?;
        let mut summary = RunSummary::new(directory);
        let mut folders: HashSet<String> = HashSet::new();

        for entry in entries.iter().filter(|e| !e.is_directory) {
            if entry.extension.is_empty() {
                summary.record_skip(&entry.name, SkipReason::NoExtension);
                continue;
            }
            if self.filters.excludes(&entry.name, &entry.extension) {
                summary.record_skip(&entry.name, SkipReason::Excluded);
                continue;
            }

            match self.place(directory, entry, &mut folders, &mut summary) {
                Ok(Placement::Moved) => {
                    OutputFormatter::success(&format!(
                        "{} → {}/",
                        entry.name, entry.extension
                    ));
                    summary.record_move(&entry.extension);
                }
                Ok(Placement::Resolved(outcome)) => {
                    summary.conflicts.record(outcome);
                    if outcome == ConflictOutcome::Skipped {
                        summary.record_skip(&entry.name, SkipReason::ConflictSkipped);
                    } else {
                        summary.record_move(&entry.extension);
                    }
                }
                Err(e) => {
                    OutputFormatter::error(&format!("{}: {}", entry.name, e));
                    summary.record_skip(&entry.name, SkipReason::Failed(e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    /// Computes what [`organize`](Self::organize) would do with this
    /// organizer's filters, without changing anything.
    pub fn plan(&self, directory: &Path) -> OrganizeResult<Plan> {
        plan_directory(directory, &self.filters)
    }

    fn place(
        &mut self,
        directory: &Path,
        entry: &Entry,
        folders: &mut HashSet<String>,
        summary: &mut RunSummary,
    ) -> OrganizeResult<Placement> {
        let folder = directory.join(&entry.extension);
        if !folders.contains(&entry.extension) {
            if ensure_folder(&folder)? {
                OutputFormatter::info(&format!("Created folder {}/", entry.extension));
                summary.created_folders.push(entry.extension.clone());
            }
            folders.insert(entry.extension.clone());
        }

        let destination = folder.join(file_name_of(entry));
        if !is_occupied(&destination) {
            move_file(&entry.source_path, &destination)?;
            return Ok(Placement::Moved);
        }

        let outcome = self.resolver.resolve(&entry.source_path, &destination)?;
        Ok(Placement::Resolved(outcome))
    }
}

/// Computes the moves an organize run over `directory` would perform.
///
/// Conflicts are flagged but not resolved, so the plan does not depend on
/// operator choices.
pub fn plan_directory(directory: &Path, filters: &CompiledFilters) -> OrganizeResult<Plan> {
    let entries = list_entries(directory)?;
    let mut plan = Plan {
        directory: directory.to_path_buf(),
        moves: Vec::new(),
        skipped: Vec::new(),
    };
    let mut new_folders: HashSet<String> = HashSet::new();

    for entry in entries.iter().filter(|e| !e.is_directory) {
        let reason = if entry.extension.is_empty() {
            Some(SkipReason::NoExtension)
        } else if filters.excludes(&entry.name, &entry.extension) {
            Some(SkipReason::Excluded)
        } else {
            None
        };
        if let Some(reason) = reason {
            plan.skipped.push(SkippedFile {
                name: entry.name.clone(),
                reason,
            });
            continue;
        }

        let folder = directory.join(&entry.extension);
        if is_occupied(&folder) && !folder.is_dir() {
            plan.skipped.push(SkippedFile {
                name: entry.name.clone(),
                reason: SkipReason::Failed(format!(
                    "{} exists and is not a directory",
                    folder.display()
                )),
            });
            continue;
        }
        let creates_folder = !folder.is_dir() && new_folders.insert(entry.extension.clone());
        let destination = folder.join(file_name_of(entry));
        let conflict = is_occupied(&destination);

        plan.moves.push(PlannedMove {
            name: entry.name.clone(),
            extension: entry.extension.clone(),
            destination,
            conflict,
            creates_folder,
        });
    }

    Ok(plan)
}

/// Lists the top level of `directory` into entries.
///
/// The whole listing is read before anything is moved, so folders created
/// during the run are never visited.
pub fn list_entries(directory: &Path) -> OrganizeResult<Vec<Entry>> {
    let metadata = fs::metadata(directory).map_err(|e| OrganizeError::InvalidTarget {
        path: directory.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_dir() {
        return Err(OrganizeError::InvalidTarget {
            path: directory.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let enumeration_error = |e: io::Error| OrganizeError::EnumerationFailed {
        path: directory.to_path_buf(),
        source: e,
    };

    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(directory).map_err(enumeration_error)? {
        let dir_entry = dir_entry.map_err(enumeration_error)?;
        let source_path = dir_entry.path();
        let extension = source_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        entries.push(Entry {
            name: dir_entry.file_name().to_string_lossy().into_owned(),
            extension,
            is_directory: source_path.is_dir(),
            source_path,
        });
    }

    Ok(entries)
}

/// Makes sure `folder` exists as a directory. Returns true if it was created.
fn ensure_folder(folder: &Path) -> OrganizeResult<bool> {
    if folder.is_dir() {
        return Ok(false);
    }
    fs::create_dir(folder).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: folder.to_path_buf(),
        source: e,
    })?;
    Ok(true)
}

/// The entry's raw file name, falling back to the display name.
fn file_name_of(entry: &Entry) -> PathBuf {
    entry
        .source_path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&entry.name))
}
