//! Sources of conflict-resolution choices.
//!
//! The organizer never reads the terminal itself. Whoever drives a run hands it
//! a [`ChoiceProvider`]: the interactive [`ConsolePrompt`], a [`FixedChoice`]
//! policy applied to every conflict, or [`ScriptedChoices`] for tests.

use crate::conflict::ConflictChoice;
use crate::output::OutputFormatter;
use colored::*;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Supplies the strategy for one conflicting file.
///
/// Called exactly once per conflict, on the organizing thread. Implementations
/// may block for as long as they need.
pub trait ChoiceProvider {
    /// Picks a strategy for moving `source` onto the occupied `destination`.
    fn choose(&mut self, source: &Path, destination: &Path) -> ConflictChoice;
}

impl<P: ChoiceProvider + ?Sized> ChoiceProvider for Box<P> {
    fn choose(&mut self, source: &Path, destination: &Path) -> ConflictChoice {
        (**self).choose(source, destination)
    }
}

/// Applies the same choice to every conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedChoice(pub ConflictChoice);

impl ChoiceProvider for FixedChoice {
    fn choose(&mut self, _source: &Path, _destination: &Path) -> ConflictChoice {
        self.0
    }
}

/// Replays a queue of choices, then falls back to a default once exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedChoices {
    queue: VecDeque<ConflictChoice>,
    fallback: ConflictChoice,
    asked: usize,
}

impl ScriptedChoices {
    /// Creates a script; conflicts beyond its end are skipped.
    pub fn new(choices: impl IntoIterator<Item = ConflictChoice>) -> Self {
        Self {
            queue: choices.into_iter().collect(),
            fallback: ConflictChoice::Skip,
            asked: 0,
        }
    }

    /// Sets the choice returned once the script runs out.
    pub fn with_fallback(mut self, fallback: ConflictChoice) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of times a choice was requested.
    pub fn asked(&self) -> usize {
        self.asked
    }
}

impl ChoiceProvider for ScriptedChoices {
    fn choose(&mut self, _source: &Path, _destination: &Path) -> ConflictChoice {
        self.asked += 1;
        self.queue.pop_front().unwrap_or(self.fallback)
    }
}

/// Interactive menu on a line-oriented reader and writer.
///
/// Invalid input is reported and the menu repeats until a valid choice is
/// entered. End of input or a read error resolves to [`ConflictChoice::Skip`].
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    /// Creates a prompt reading answers from `input` and writing the menu to `output`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, source: &Path, destination: &Path) -> io::Result<ConflictChoice> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());
        let folder = destination
            .parent()
            .unwrap_or(destination)
            .display()
            .to_string();

        writeln!(
            self.output,
            "{} '{}' already exists in {}",
            "Conflict:".yellow().bold(),
            name,
            folder
        )?;
        for choice in ConflictChoice::ALL {
            writeln!(self.output, "  {}) {}", choice.key(), choice.description())?;
        }

        loop {
            write!(self.output, "{}", "Choose [1-4]: ".magenta())?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                writeln!(
                    self.output,
                    "{} end of input, skipping '{}'",
                    "⚠".yellow(),
                    name
                )?;
                return Ok(ConflictChoice::Skip);
            }

            match line.parse::<ConflictChoice>() {
                Ok(choice) => return Ok(choice),
                Err(e) => writeln!(self.output, "{} {}", "✗".red(), e)?,
            }
        }
    }
}

impl<R: BufRead, W: Write> ChoiceProvider for ConsolePrompt<R, W> {
    fn choose(&mut self, source: &Path, destination: &Path) -> ConflictChoice {
        match self.ask(source, destination) {
            Ok(choice) => choice,
            Err(e) => {
                OutputFormatter::error(&format!("Could not read choice: {}", e));
                ConflictChoice::Skip
            }
        }
    }
}
