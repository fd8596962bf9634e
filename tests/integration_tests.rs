use extidy::cli::{Report, RunOptions, Session};
use extidy::config::Config;
use extidy::conflict::ConflictChoice;
use extidy::organizer::{DirectoryOrganizer, OrganizeError};
use extidy::prompt::{FixedChoice, ScriptedChoices};
use extidy::summary::SkipReason;
/// Integration tests for extidy
///
/// These tests drive complete organize runs against temporary directories.
///
/// Test categories:
/// 1. Basic organization by extension
/// 2. Conflict resolution strategies
/// 3. Skipping, filtering and per-file failures
/// 4. Dry run and the interactive session
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory with helpers for building and inspecting layouts.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file with text content, creating parent folders as needed.
    fn create_file(&self, rel_path: &str, content: &str) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content.as_bytes())
            .expect("Failed to write file content");
    }

    fn create_subdir(&self, name: &str) {
        fs::create_dir(self.path().join(name)).expect("Failed to create subdirectory");
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", rel_path, e))
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Count top-level files (non-recursive).
    fn count_files(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .flatten()
            .filter(|e| e.path().is_file())
            .count()
    }

    /// Count the entries of a subdirectory.
    fn count_entries(&self, rel_path: &str) -> usize {
        fs::read_dir(self.path().join(rel_path))
            .expect("Failed to read directory")
            .count()
    }

    /// List all files in the directory recursively, sorted.
    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(self.path(), &mut files);
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    Self::walk_dir(&path, files);
                } else {
                    files.push(path);
                }
            }
        }
    }
}

fn organizer(choice: ConflictChoice) -> DirectoryOrganizer<FixedChoice> {
    DirectoryOrganizer::new(FixedChoice(choice))
}

// ============================================================================
// Test Suite 1: Basic Organization
// ============================================================================

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();

    let summary = organizer(ConflictChoice::Skip)
        .organize(fixture.path())
        .expect("Should succeed on empty directory");

    assert!(summary.is_empty());
    assert_eq!(summary.conflicts.total(), 0);
    assert_eq!(fixture.list_files_recursive().len(), 0);
}

#[test]
fn test_organize_mixed_extensions() {
    let fixture = TestFixture::new();
    for name in ["photo1.jpg", "photo2.jpg", "report.pdf", "song.mp3", "data.tar.gz"] {
        fixture.create_file(name, name);
    }

    let summary = organizer(ConflictChoice::Skip)
        .organize(fixture.path())
        .expect("Organize failed");

    fixture.assert_file_exists("jpg/photo1.jpg");
    fixture.assert_file_exists("jpg/photo2.jpg");
    fixture.assert_file_exists("pdf/report.pdf");
    fixture.assert_file_exists("mp3/song.mp3");
    fixture.assert_file_exists("gz/data.tar.gz");
    assert_eq!(fixture.count_files(), 0, "Root should hold no files");

    assert_eq!(summary.moved_for("jpg"), 2);
    assert_eq!(summary.moved_for("gz"), 1);
    assert_eq!(summary.total_moved(), 5);
    assert!(summary.skipped.is_empty());
}

#[test]
fn test_organize_preserves_content() {
    let fixture = TestFixture::new();
    fixture.create_file("letter.docx", "Dear reader");

    organizer(ConflictChoice::Skip)
        .organize(fixture.path())
        .expect("Organize failed");

    assert_eq!(fixture.read("docx/letter.docx"), "Dear reader");
    fixture.assert_file_not_exists("letter.docx");
}

#[test]
fn test_extension_folders_are_lowercase_and_names_keep_case() {
    let fixture = TestFixture::new();
    fixture.create_file("Holiday.JPG", "a");
    fixture.create_file("beach.Jpg", "b");
    fixture.create_file("cliff.jpg", "c");

    let summary = organizer(ConflictChoice::Skip)
        .organize(fixture.path())
        .expect("Organize failed");

    fixture.assert_file_exists("jpg/Holiday.JPG");
    fixture.assert_file_exists("jpg/beach.Jpg");
    fixture.assert_file_exists("jpg/cliff.jpg");
    assert_eq!(summary.moved_for("jpg"), 3);
    assert_eq!(summary.moved.len(), 1);
    assert_eq!(summary.created_folders, vec!["jpg".to_string()]);
}

#[test]
fn test_subdirectories_are_left_alone() {
    let fixture = TestFixture::new();
    fixture.create_subdir("projects.old");
    fixture.create_file("projects.old/readme.txt", "inner");
    fixture.create_file("todo.txt", "outer");

    let summary = organizer(ConflictChoice::Skip)
        .organize(fixture.path())
        .expect("Organize failed");

    fixture.assert_dir_exists("projects.old");
    fixture.assert_file_exists("projects.old/readme.txt");
    fixture.assert_file_exists("txt/todo.txt");
    assert_eq!(summary.total_moved(), 1);
    assert!(summary.skipped.is_empty(), "Directories are never recorded");
}

#[test]
fn test_files_without_extension_stay_and_are_skipped() {
    let fixture = TestFixture::new();
    fixture.create_file("README", "readme");
    fixture.create_file(".bashrc", "alias ll='ls -l'");
    fixture.create_file("notes.md", "# notes");

    let summary = organizer(ConflictChoice::Skip)
        .organize(fixture.path())
        .expect("Organize failed");

    fixture.assert_file_exists("README");
    fixture.assert_file_exists(".bashrc");
    fixture.assert_file_exists("md/notes.md");

    let mut skipped: Vec<_> = summary.skipped_names().collect();
    skipped.sort();
    assert_eq!(skipped, vec![".bashrc", "README"]);
    assert!(
        summary
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::NoExtension)
    );
}

#[test]
fn test_organize_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.png", "png");
    fixture.create_file("report.pdf", "pdf");

    organizer(ConflictChoice::Overwrite)
        .organize(fixture.path())
        .expect("First run failed");
    let files_after_first = fixture.list_files_recursive();

    let second = organizer(ConflictChoice::Overwrite)
        .organize(fixture.path())
        .expect("Second run failed");

    assert_eq!(files_after_first, fixture.list_files_recursive());
    assert!(second.is_empty(), "Second run should process nothing");
    assert!(second.created_folders.is_empty());
}

#[test]
fn test_second_run_picks_up_new_files_only() {
    let fixture = TestFixture::new();
    fixture.create_file("a.csv", "1");

    organizer(ConflictChoice::Skip)
        .organize(fixture.path())
        .expect("First run failed");
    fixture.create_file("b.csv", "2");

    let second = organizer(ConflictChoice::Skip)
        .organize(fixture.path())
        .expect("Second run failed");

    assert_eq!(second.total_moved(), 1);
    assert_eq!(fixture.count_entries("csv"), 2);
}

#[test]
fn test_invalid_target_is_fatal() {
    let fixture = TestFixture::new();
    fixture.create_file("plain.txt", "x");

    let missing = organizer(ConflictChoice::Skip).organize(&fixture.path().join("missing"));
    assert!(matches!(missing, Err(OrganizeError::InvalidTarget { .. })));

    let not_dir = organizer(ConflictChoice::Skip).organize(&fixture.path().join("plain.txt"));
    assert!(matches!(not_dir, Err(OrganizeError::InvalidTarget { .. })));
    fixture.assert_file_exists("plain.txt");
}

// ============================================================================
// Test Suite 2: Conflict Resolution
// ============================================================================

#[test]
fn test_rename_incoming_skips_used_numbers() {
    let fixture = TestFixture::new();
    fixture.create_file("txt/a.txt", "first");
    fixture.create_file("txt/a_1.txt", "second");
    fixture.create_file("a.txt", "third");

    let summary = organizer(ConflictChoice::RenameIncoming)
        .organize(fixture.path())
        .expect("Organize failed");

    assert_eq!(fixture.read("txt/a.txt"), "first");
    assert_eq!(fixture.read("txt/a_1.txt"), "second");
    assert_eq!(fixture.read("txt/a_2.txt"), "third");
    fixture.assert_file_not_exists("a.txt");
    assert_eq!(summary.conflicts.renamed_incoming, 1);
    assert_eq!(summary.moved_for("txt"), 1);
}

#[test]
fn test_overwrite_leaves_single_incoming_file() {
    let fixture = TestFixture::new();
    fixture.create_file("log/app.log", "old entries");
    fixture.create_file("app.log", "new entries");

    let summary = organizer(ConflictChoice::Overwrite)
        .organize(fixture.path())
        .expect("Organize failed");

    assert_eq!(fixture.read("log/app.log"), "new entries");
    assert_eq!(fixture.count_entries("log"), 1);
    fixture.assert_file_not_exists("app.log");
    assert_eq!(summary.conflicts.overwritten, 1);
    assert_eq!(summary.moved_for("log"), 1);
}

#[test]
fn test_rename_existing_keeps_old_copy() {
    let fixture = TestFixture::new();
    fixture.create_file("pdf/report.pdf", "old report");
    fixture.create_file("report.pdf", "new report");

    let summary = organizer(ConflictChoice::RenameExisting)
        .organize(fixture.path())
        .expect("Organize failed");

    assert_eq!(fixture.read("pdf/report_1.pdf"), "old report");
    assert_eq!(fixture.read("pdf/report.pdf"), "new report");
    assert_eq!(fixture.count_entries("pdf"), 2);
    assert_eq!(summary.conflicts.renamed_existing, 1);
}

#[test]
fn test_skip_scenario_with_duplicate_photo() {
    let fixture = TestFixture::new();
    fixture.create_file("jpg/photo.jpg", "first upload");
    fixture.create_file("photo.jpg", "second upload");
    fixture.create_file("notes", "shopping list");

    let summary = organizer(ConflictChoice::Skip)
        .organize(fixture.path())
        .expect("Organize failed");

    assert_eq!(fixture.read("jpg/photo.jpg"), "first upload");
    assert_eq!(fixture.count_entries("jpg"), 1);
    assert_eq!(fixture.read("photo.jpg"), "second upload");
    assert_eq!(fixture.read("notes"), "shopping list");

    let mut skipped: Vec<_> = summary.skipped_names().collect();
    skipped.sort();
    assert_eq!(skipped, vec!["notes", "photo.jpg"]);
    assert_eq!(summary.conflicts.skipped, 1);
    assert_eq!(summary.moved_for("jpg"), 0);
}

#[test]
fn test_each_conflict_asks_once() {
    let fixture = TestFixture::new();
    fixture.create_file("txt/a.txt", "old a");
    fixture.create_file("txt/b.txt", "old b");
    fixture.create_file("a.txt", "new a");
    fixture.create_file("b.txt", "new b");
    fixture.create_file("c.txt", "new c");

    let script = ScriptedChoices::new([ConflictChoice::Skip, ConflictChoice::Skip]);
    let mut organizer = DirectoryOrganizer::new(script);
    let summary = organizer.organize(fixture.path()).expect("Organize failed");

    assert_eq!(summary.conflicts.total(), 2);
    assert_eq!(summary.conflicts.skipped, 2);
    assert_eq!(summary.moved_for("txt"), 1);
    fixture.assert_file_exists("txt/c.txt");
    // Every file is either moved or skipped.
    assert_eq!(summary.total_moved() + summary.skipped.len(), 3);
}

// ============================================================================
// Test Suite 3: Filters and Failures
// ============================================================================

#[test]
fn test_config_filters_leave_files_in_place() {
    let fixture = TestFixture::new();
    fixture.create_file("movie.mkv.part", "partial");
    fixture.create_file("Thumbs.db", "cache");
    fixture.create_file("movie.mkv", "full");

    let filters = Config::parse(
        r#"
[filters]
exclude_names = ["Thumbs.db"]
exclude_extensions = ["part"]
"#,
    )
    .expect("Failed to parse config")
    .compile()
    .expect("Failed to compile config");

    let summary = organizer(ConflictChoice::Skip)
        .with_filters(filters)
        .organize(fixture.path())
        .expect("Organize failed");

    fixture.assert_file_exists("movie.mkv.part");
    fixture.assert_file_exists("Thumbs.db");
    fixture.assert_file_exists("mkv/movie.mkv");
    fixture.assert_file_not_exists("part");
    assert_eq!(summary.skipped.len(), 2);
    assert!(
        summary
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::Excluded)
    );
}

#[test]
fn test_blocked_folder_records_failure_and_continues() {
    let fixture = TestFixture::new();
    fixture.create_file("zip", "a file where the folder should go");
    fixture.create_file("archive.zip", "zipped");
    fixture.create_file("image.gif", "gif");

    let summary = organizer(ConflictChoice::Skip)
        .organize(fixture.path())
        .expect("Run should survive per-file failures");

    fixture.assert_file_exists("archive.zip");
    fixture.assert_file_exists("gif/image.gif");
    assert_eq!(summary.moved_for("gif"), 1);

    let archive = summary
        .skipped
        .iter()
        .find(|s| s.name == "archive.zip")
        .expect("archive.zip should be skipped");
    assert!(matches!(archive.reason, SkipReason::Failed(_)));
    assert!(summary.skipped_names().any(|n| n == "zip"));
}

// ============================================================================
// Test Suite 4: Dry Run and Session
// ============================================================================

#[test]
fn test_session_dry_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("a.txt", "a");
    fixture.create_file("txt/b.txt", "b");
    fixture.create_file("b.txt", "b2");

    let options = RunOptions {
        dry_run: true,
        ..Default::default()
    };
    let mut output = Vec::new();
    let mut session = Session::new(Cursor::new(Vec::new()), &mut output, options);

    let report = session.process(fixture.path()).expect("Dry run failed");
    let Report::Planned(plan) = report else {
        panic!("Expected a plan");
    };

    assert_eq!(plan.moves.len(), 2);
    assert_eq!(plan.conflicts(), 1);
    fixture.assert_file_exists("a.txt");
    fixture.assert_file_exists("b.txt");
    assert_eq!(fixture.count_entries("txt"), 1);
}

#[test]
fn test_session_prompts_for_conflicts() {
    let fixture = TestFixture::new();
    fixture.create_file("csv/data.csv", "old");
    fixture.create_file("data.csv", "new");

    let input = format!("{}\nbogus\n4\nn\n", fixture.path().display());
    let mut output = Vec::new();
    let reports = {
        let mut session = Session::new(
            Cursor::new(input.into_bytes()),
            &mut output,
            RunOptions::default(),
        );
        session.run().expect("Session failed")
    };
    let output = String::from_utf8(output).expect("Invalid UTF-8 output");

    assert_eq!(reports.len(), 1);
    let Report::Organized(summary) = &reports[0] else {
        panic!("Expected an organize report");
    };
    assert_eq!(summary.conflicts.renamed_existing, 1);
    assert_eq!(fixture.read("csv/data.csv"), "new");
    assert_eq!(fixture.read("csv/data_1.csv"), "old");
    assert!(output.contains("Invalid choice 'bogus'"));
    assert!(output.contains("Organize another directory?"));
}

#[test]
fn test_session_continues_after_invalid_target() {
    let first = TestFixture::new();
    let second = TestFixture::new();
    first.create_file("one.txt", "1");
    second.create_file("two.txt", "2");

    let input = format!(
        "{}\ny\n/definitely/not/here\ny\n\"{}\"\nq\n",
        first.path().display(),
        second.path().display()
    );
    let mut output = Vec::new();
    let reports = Session::new(
        Cursor::new(input.into_bytes()),
        &mut output,
        RunOptions::default(),
    )
    .run()
    .expect("Session failed");

    assert_eq!(reports.len(), 2);
    first.assert_file_exists("txt/one.txt");
    second.assert_file_exists("txt/two.txt");
}

#[test]
fn test_session_fixed_policy_never_prompts() {
    let fixture = TestFixture::new();
    fixture.create_file("md/a.md", "old");
    fixture.create_file("a.md", "new");

    let options = RunOptions {
        policy: Some(ConflictChoice::Overwrite),
        ..Default::default()
    };
    let mut output = Vec::new();
    let report = Session::new(Cursor::new(Vec::new()), &mut output, options)
        .process(fixture.path())
        .expect("Organize failed");

    assert!(matches!(report, Report::Organized(ref s) if s.conflicts.overwritten == 1));
    assert_eq!(fixture.read("md/a.md"), "new");
    assert!(!String::from_utf8_lossy(&output).contains("Choose [1-4]"));
}

#[test]
fn test_session_stops_at_end_of_input() {
    let mut output = Vec::new();
    let reports = Session::new(Cursor::new(Vec::new()), &mut output, RunOptions::default())
        .run()
        .expect("Session failed");

    assert!(reports.is_empty());
    assert!(String::from_utf8_lossy(&output).contains("Goodbye!"));
}

#[test]
fn test_session_json_output_parses() {
    let fixture = TestFixture::new();
    fixture.create_file("txt/a.txt", "old");
    fixture.create_file("a.txt", "new");
    fixture.create_file("b.pdf", "pdf");

    // No fixed policy: the conflict prompt must stay out of the JSON stream.
    let options = RunOptions {
        json: true,
        ..Default::default()
    };
    let mut output = Vec::new();
    let report = Session::new(Cursor::new(b"2\n".to_vec()), &mut output, options)
        .process(fixture.path())
        .expect("Organize failed");

    assert!(matches!(report, Report::Organized(_)));
    let value: serde_json::Value =
        serde_json::from_slice(&output).expect("Session output is not a JSON document");
    assert_eq!(value["moved"]["pdf"], 1);
    assert_eq!(value["moved"]["txt"], 1);
    assert_eq!(value["conflicts"]["renamed_incoming"], 1);
    assert_eq!(fixture.read("txt/a_1.txt"), "new");
}

#[test]
fn test_session_json_dry_run_parses() {
    let fixture = TestFixture::new();
    fixture.create_file("a.txt", "a");
    fixture.create_file("notes", "n");

    let options = RunOptions {
        json: true,
        dry_run: true,
        ..Default::default()
    };
    let mut output = Vec::new();
    Session::new(Cursor::new(Vec::new()), &mut output, options)
        .process(fixture.path())
        .expect("Dry run failed");

    let value: serde_json::Value =
        serde_json::from_slice(&output).expect("Session output is not a JSON document");
    assert_eq!(value["moves"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["skipped"][0]["name"], "notes");
    fixture.assert_file_exists("a.txt");
}
