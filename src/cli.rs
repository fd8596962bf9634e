//! Command-line interface module for extidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - The interactive session that asks for directories one at a time
//! - Choosing how conflicts are resolved (prompt or fixed policy)
//! - Rendering summaries as tables or JSON

use crate::config::{CompiledFilters, Config};
use crate::conflict::ConflictChoice;
use crate::organizer::{DirectoryOrganizer, Plan, plan_directory};
use crate::output::OutputFormatter;
use crate::prompt::{ChoiceProvider, ConsolePrompt, FixedChoice};
use crate::summary::RunSummary;
use clap::Parser;
use colored::*;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Organize files into subdirectories named after their extension.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "extidy", version, about)]
pub struct Args {
    /// Directories to organize. Prompts for paths interactively when omitted.
    pub directories: Vec<PathBuf>,

    /// TOML file with filter rules for files to leave in place
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Resolve every conflict the same way instead of asking:
    /// overwrite, rename-incoming, skip, rename-existing (or 1-4)
    #[arg(long, value_name = "CHOICE")]
    pub on_conflict: Option<ConflictChoice>,

    /// Show what would be moved without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print summaries as JSON
    #[arg(long)]
    pub json: bool,
}

/// Settings shared by every directory of one invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub filters: CompiledFilters,
    /// Fixed conflict policy; `None` asks the operator.
    pub policy: Option<ConflictChoice>,
    pub dry_run: bool,
    pub json: bool,
}

/// Result of processing one directory.
#[derive(Debug)]
pub enum Report {
    Organized(RunSummary),
    Planned(Plan),
}

/// Drives organize runs, reading operator input from `input` and writing
/// prompts to `output`.
///
/// With `json` set, `output` receives only the JSON documents and prompts go
/// to stderr.
pub struct Session<R, W> {
    input: R,
    output: W,
    options: RunOptions,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W, options: RunOptions) -> Self {
        Self {
            input,
            output,
            options,
        }
    }

    /// Repeatedly asks for a directory, processes it, and asks whether to
    /// continue.
    ///
    /// Stops on `q`, `quit`, `exit`, a negative answer, or end of input.
    /// Directories that cannot be organized are reported and the session goes
    /// on. Returns the reports of all directories processed.
    pub fn run(&mut self) -> io::Result<Vec<Report>> {
        writeln!(
            prompt_stream(&mut self.output, self.options.json),
            "{}",
            "Welcome to extidy - files sorted by extension!".bold()
        )?;

        let mut reports = Vec::new();
        loop {
            let Some(line) = self.read_answer("Enter a directory path (q to quit): ")? else {
                break;
            };
            let answer = line.trim().trim_matches(|c| c == '"' || c == '\'');
            if answer.is_empty() {
                continue;
            }
            if is_quit(answer) {
                break;
            }

            if let Some(report) = self.process(Path::new(answer)) {
                reports.push(report);
            }

            match self.read_answer("Organize another directory? [y/N]: ")? {
                Some(again) if is_yes(again.trim()) => continue,
                _ => break,
            }
        }

        writeln!(prompt_stream(&mut self.output, self.options.json), "Goodbye!")?;
        Ok(reports)
    }

    /// Organizes (or plans) a single directory and prints the result.
    ///
    /// Returns `None` if the directory could not be processed; the error has
    /// already been reported.
    pub fn process(&mut self, directory: &Path) -> Option<Report> {
        if self.options.dry_run {
            return match plan_directory(directory, &self.options.filters) {
                Ok(plan) => {
                    self.render(&plan, OutputFormatter::plan);
                    Some(Report::Planned(plan))
                }
                Err(e) => {
                    OutputFormatter::error(&e.to_string());
                    None
                }
            };
        }

        OutputFormatter::info(&format!("Organizing contents of: {}", directory.display()));
        let provider: Box<dyn ChoiceProvider + '_> = match self.options.policy {
            Some(choice) => Box::new(FixedChoice(choice)),
            None => Box::new(ConsolePrompt::new(
                &mut self.input,
                prompt_stream(&mut self.output, self.options.json),
            )),
        };
        let mut organizer =
            DirectoryOrganizer::new(provider).with_filters(self.options.filters.clone());
        let result = organizer.organize(directory);
        // The prompt borrows our input and output until the organizer is gone.
        drop(organizer);

        match result {
            Ok(summary) => {
                self.render(&summary, OutputFormatter::run_summary);
                Some(Report::Organized(summary))
            }
            Err(e) => {
                OutputFormatter::error(&e.to_string());
                None
            }
        }
    }

    fn render<T: Serialize>(&mut self, value: &T, table: fn(&T)) {
        if !self.options.json {
            table(value);
            return;
        }
        let written = serde_json::to_string_pretty(value)
            .map_err(io::Error::from)
            .and_then(|json| writeln!(self.output, "{}", json));
        if let Err(e) = written {
            OutputFormatter::error(&format!("Could not write JSON summary: {}", e));
        }
    }

    /// Writes `prompt` and reads one line; `None` at end of input.
    fn read_answer(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut out = prompt_stream(&mut self.output, self.options.json);
        write!(out, "{}", prompt.magenta())?;
        out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Where operator prompts go: the session output, or stderr when the output
/// is reserved for JSON.
fn prompt_stream<W: Write>(output: &mut W, json: bool) -> Box<dyn Write + '_> {
    if json {
        Box::new(io::stderr())
    } else {
        Box::new(output)
    }
}

fn is_quit(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "q" | "quit" | "exit")
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}

/// Runs the CLI application with parsed arguments.
///
/// With directories on the command line each is processed once; otherwise an
/// interactive session reads paths from stdin.
///
/// # Examples
///
/// ```no_run
/// use extidy::cli::{Args, run_cli};
/// use std::path::PathBuf;
///
/// let args = Args {
///     directories: vec![PathBuf::from("/path/to/directory")],
///     dry_run: true,
///     ..Default::default()
/// };
/// if let Err(e) = run_cli(args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(args: Args) -> Result<(), String> {
    let filters = Config::load(args.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let options = RunOptions {
        filters,
        policy: args.on_conflict,
        dry_run: args.dry_run,
        json: args.json,
    };

    OutputFormatter::status_to_stderr(options.json);
    let mut session = Session::new(io::stdin().lock(), io::stdout(), options);

    if args.directories.is_empty() {
        session
            .run()
            .map_err(|e| format!("Error reading input: {}", e))?;
        return Ok(());
    }

    let failed = args
        .directories
        .iter()
        .filter(|dir| session.process(dir).is_none())
        .count();
    if failed > 0 {
        return Err(format!("{} directory(ies) could not be organized", failed));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_conflict_policy() {
        let args = Args::try_parse_from(["extidy", "--on-conflict", "rename-existing", "/tmp"])
            .expect("Failed to parse args");
        assert_eq!(args.on_conflict, Some(ConflictChoice::RenameExisting));
        assert_eq!(args.directories, vec![PathBuf::from("/tmp")]);

        let args = Args::try_parse_from(["extidy", "--on-conflict", "2"]).unwrap();
        assert_eq!(args.on_conflict, Some(ConflictChoice::RenameIncoming));
    }

    #[test]
    fn test_args_reject_unknown_policy() {
        assert!(Args::try_parse_from(["extidy", "--on-conflict", "merge"]).is_err());
    }

    #[test]
    fn test_args_flags() {
        let args = Args::try_parse_from(["extidy", "-n", "--json", "-c", "rules.toml", "a", "b"])
            .unwrap();
        assert!(args.dry_run);
        assert!(args.json);
        assert_eq!(args.config, Some(PathBuf::from("rules.toml")));
        assert_eq!(args.directories.len(), 2);
    }

    #[test]
    fn test_quit_and_yes_answers() {
        assert!(is_quit("Q"));
        assert!(is_quit("exit"));
        assert!(!is_quit("/tmp/q"));
        assert!(is_yes("YES"));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }
}
