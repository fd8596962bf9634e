/// Conflict resolution for files whose destination name is already taken.
///
/// When a file is about to be moved onto a path that is already occupied, the
/// [`ConflictResolver`] asks its [`ChoiceProvider`] which of the four
/// strategies to apply and then performs the matching filesystem mutation.
/// Every strategy either leaves both files intact under distinct names, replaces
/// the destination atomically, or touches nothing at all.
use crate::organizer::{OrganizeError, OrganizeResult};
use crate::output::OutputFormatter;
use crate::prompt::ChoiceProvider;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A strategy the operator can pick for a single conflicting file.
///
/// The numbering matches the menu shown by the console prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictChoice {
    /// Replace the existing destination file with the incoming one.
    Overwrite,
    /// Move the incoming file under the first free numbered name.
    RenameIncoming,
    /// Leave the incoming file where it is.
    Skip,
    /// Move the existing file to a numbered name, then take its place.
    RenameExisting,
}

impl ConflictChoice {
    /// All choices in menu order.
    pub const ALL: [ConflictChoice; 4] = [
        ConflictChoice::Overwrite,
        ConflictChoice::RenameIncoming,
        ConflictChoice::Skip,
        ConflictChoice::RenameExisting,
    ];

    /// Returns the menu number for this choice.
    pub fn key(self) -> u8 {
        match self {
            ConflictChoice::Overwrite => 1,
            ConflictChoice::RenameIncoming => 2,
            ConflictChoice::Skip => 3,
            ConflictChoice::RenameExisting => 4,
        }
    }

    /// Returns the menu label for this choice.
    pub fn description(self) -> &'static str {
        match self {
            ConflictChoice::Overwrite => "Overwrite the existing file",
            ConflictChoice::RenameIncoming => "Rename the incoming file",
            ConflictChoice::Skip => "Skip this file",
            ConflictChoice::RenameExisting => "Rename the existing file",
        }
    }
}

/// Error returned when operator input does not name a valid choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceParseError {
    /// The rejected input, trimmed.
    pub input: String,
}

impl fmt::Display for ChoiceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid choice '{}': expected 1-4 or one of overwrite, rename-incoming, skip, rename-existing",
            self.input
        )
    }
}

impl std::error::Error for ChoiceParseError {}

impl FromStr for ConflictChoice {
    type Err = ChoiceParseError;

    /// Accepts the menu number or the choice name (`-` and `_` are interchangeable).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "1" | "overwrite" => Ok(ConflictChoice::Overwrite),
            "2" | "rename-incoming" => Ok(ConflictChoice::RenameIncoming),
            "3" | "skip" => Ok(ConflictChoice::Skip),
            "4" | "rename-existing" => Ok(ConflictChoice::RenameExisting),
            _ => Err(ChoiceParseError {
                input: s.trim().to_string(),
            }),
        }
    }
}

/// What happened to a conflicting file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictOutcome {
    Overwritten,
    RenamedIncoming,
    RenamedExisting,
    Skipped,
}

impl ConflictOutcome {
    /// Returns the snake_case label used in summaries.
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictOutcome::Overwritten => "overwritten",
            ConflictOutcome::RenamedIncoming => "renamed_incoming",
            ConflictOutcome::RenamedExisting => "renamed_existing",
            ConflictOutcome::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ConflictOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies operator-selected strategies to destination collisions.
pub struct ConflictResolver<P> {
    provider: P,
}

impl<P: ChoiceProvider> ConflictResolver<P> {
    /// Creates a resolver that asks `provider` for each conflict.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Resolves a collision between `source` and the occupied `destination`.
    ///
    /// Asks the provider for a choice exactly once and applies it. Filesystem
    /// failures are returned to the caller; no partial mutation is left behind.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use extidy::conflict::{ConflictChoice, ConflictOutcome, ConflictResolver};
    /// use extidy::prompt::FixedChoice;
    /// use std::path::Path;
    ///
    /// let mut resolver = ConflictResolver::new(FixedChoice(ConflictChoice::RenameIncoming));
    /// let outcome = resolver
    ///     .resolve(Path::new("/data/a.txt"), Path::new("/data/txt/a.txt"))
    ///     .expect("resolution failed");
    /// assert_eq!(outcome, ConflictOutcome::RenamedIncoming);
    /// ```
    pub fn resolve(
        &mut self,
        source: &Path,
        destination: &Path,
    ) -> OrganizeResult<ConflictOutcome> {
        let choice = self.provider.choose(source, destination);
        apply_choice(choice, source, destination)
    }
}

/// Performs the filesystem mutation for `choice`.
pub fn apply_choice(
    choice: ConflictChoice,
    source: &Path,
    destination: &Path,
) -> OrganizeResult<ConflictOutcome> {
    match choice {
        ConflictChoice::Overwrite => {
            // rename replaces the occupant atomically
            move_file(source, destination)?;
            OutputFormatter::success(&format!("Overwrote {}", destination.display()));
            Ok(ConflictOutcome::Overwritten)
        }
        ConflictChoice::RenameIncoming => {
            let (_, base, ext) = name_parts(source)?;
            let directory = destination.parent().unwrap_or(Path::new("."));
            let target = first_available_name(directory, &base, &ext);
            move_file(source, &target)?;
            OutputFormatter::success(&format!("Moved as {}", target.display()));
            Ok(ConflictOutcome::RenamedIncoming)
        }
        ConflictChoice::Skip => {
            OutputFormatter::warning(&format!("Skipped {}", source.display()));
            Ok(ConflictOutcome::Skipped)
        }
        ConflictChoice::RenameExisting => {
            let (directory, base, ext) = name_parts(destination)?;
            let parked = first_available_name(&directory, &base, &ext);
            move_file(destination, &parked)?;
            if let Err(e) = move_file(source, destination) {
                if let Err(restore) = fs::rename(&parked, destination) {
                    OutputFormatter::error(&format!(
                        "Could not restore {} from {}: {}",
                        destination.display(),
                        parked.display(),
                        restore
                    ));
                }
                return Err(e);
            }
            OutputFormatter::success(&format!("Kept previous file as {}", parked.display()));
            Ok(ConflictOutcome::RenamedExisting)
        }
    }
}

/// Returns the first `{base}_{n}{ext}` path in `directory` that is not taken,
/// trying `n = 1, 2, 3, ...` in order.
///
/// `ext` includes its leading dot, or is empty for names without extension.
/// The name is assembled from OS strings, so bytes that are not valid UTF-8
/// survive unchanged. The search has no upper bound.
///
/// # Examples
///
/// ```no_run
/// use extidy::conflict::first_available_name;
/// use std::path::Path;
///
/// // With report.pdf and report_1.pdf present this yields report_2.pdf.
/// let path = first_available_name(Path::new("/data/pdf"), "report", ".pdf");
/// println!("{}", path.display());
/// ```
pub fn first_available_name(
    directory: &Path,
    base: impl AsRef<OsStr>,
    ext: impl AsRef<OsStr>,
) -> PathBuf {
    let mut counter: u64 = 1;
    loop {
        let mut name = base.as_ref().to_os_string();
        name.push(format!("_{counter}"));
        name.push(ext.as_ref());
        let candidate = directory.join(name);
        if !is_occupied(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Splits a file name into its base and dotted extension.
///
/// Only the last dot separates the extension, and a leading dot never does:
/// `archive.tar.gz` gives `("archive.tar", ".gz")`, `.profile` gives
/// `(".profile", "")`.
pub fn split_name(file_name: impl AsRef<OsStr>) -> (OsString, OsString) {
    let file_name = file_name.as_ref();
    let path = Path::new(file_name);
    let base = path.file_stem().unwrap_or(file_name).to_os_string();
    let ext = path
        .extension()
        .map(|e| {
            let mut dotted = OsString::from(".");
            dotted.push(e);
            dotted
        })
        .unwrap_or_default();
    (base, ext)
}

/// Returns true if anything, including a dangling symlink, sits at `path`.
pub(crate) fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Renames `source` to `destination`, replacing a file already there.
pub(crate) fn move_file(source: &Path, destination: &Path) -> OrganizeResult<()> {
    fs::rename(source, destination).map_err(|e| OrganizeError::FileMoveFailure {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error: e,
    })
}

/// Parent directory, base and dotted extension of `path`.
fn name_parts(path: &Path) -> OrganizeResult<(PathBuf, OsString, OsString)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| OrganizeError::FileMoveFailure {
            source: path.to_path_buf(),
            destination: path.to_path_buf(),
            source_error: io::Error::new(
                io::ErrorKind::InvalidInput,
                "file has no name component",
            ),
        })?;
    let (base, ext) = split_name(file_name);
    let parent = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    Ok((parent, base, ext))
}
