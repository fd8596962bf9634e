//! extidy - sort the files of a directory into per-extension subdirectories
//!
//! This library moves every top-level file of a directory into a folder named
//! after its lowercase extension, resolves name collisions through a pluggable
//! choice provider, and reports what happened as a structured run summary.

pub mod cli;
pub mod config;
pub mod conflict;
pub mod organizer;
pub mod output;
pub mod prompt;
pub mod summary;

pub use config::{CompiledFilters, Config, ConfigError};
pub use conflict::{
    ChoiceParseError, ConflictChoice, ConflictOutcome, ConflictResolver, first_available_name,
};
pub use organizer::{DirectoryOrganizer, OrganizeError, OrganizeResult, Plan, plan_directory};
pub use prompt::{ChoiceProvider, ConsolePrompt, FixedChoice, ScriptedChoices};
pub use summary::{ConflictCounts, RunSummary, SkipReason, SkippedFile};

pub use cli::{Args, Session, run_cli};
