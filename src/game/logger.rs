//! Append-only game log
//!
//! Every event the engine reports lands in the log buffer, whatever the
//! verbosity. Verbosity and output mode only decide what is echoed to stdout.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// Verbosity level for game output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// Silent - no output during game
    Silent = 0,
    /// Minimal - only game outcome
    Minimal = 1,
    /// Normal - turns, steps, and key actions (default)
    #[default]
    Normal = 2,
    /// Verbose - all actions and state changes
    Verbose = 3,
}

impl std::str::FromStr for VerbosityLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityLevel::Silent),
            "minimal" | "1" => Ok(VerbosityLevel::Minimal),
            "normal" | "2" => Ok(VerbosityLevel::Normal),
            "verbose" | "3" => Ok(VerbosityLevel::Verbose),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

/// Output format for echoed log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Machine-readable JSON output (one object per line)
    Json,
}

/// Where log messages go besides the in-memory log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Keep the log in memory only (default)
    #[default]
    Memory,
    /// Keep the log in memory and echo it to stdout
    Both,
}

/// Event categories used by the engine
pub mod category {
    pub const STACK: &str = "stack";
    pub const COMBAT: &str = "combat";
    pub const TURN: &str = "turn";
    pub const PRIORITY: &str = "priority";
    pub const INTERACTION: &str = "interaction";
    pub const STATE: &str = "state";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Read-only view of the log entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// The game log
///
/// Logging goes through `&self` so read-only queries and effects holding a
/// shared borrow of the game can still report what they did.
pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,
    log_buffer: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    pub fn new() -> Self {
        GameLogger {
            verbosity: VerbosityLevel::default(),
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            ..GameLogger::new()
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    /// Record an entry and echo it if the output mode and verbosity allow
    pub fn log(&self, level: VerbosityLevel, category: Option<&str>, message: impl Into<String>) {
        let entry = LogEntry {
            level,
            message: message.into(),
            category: category.map(str::to_string),
        };
        self.echo(&entry);
        self.log_buffer.borrow_mut().push(entry);
    }

    #[inline]
    pub fn minimal(&self, message: impl Into<String>) {
        self.log(VerbosityLevel::Minimal, None, message);
    }

    #[inline]
    pub fn normal(&self, message: impl Into<String>) {
        self.log(VerbosityLevel::Normal, None, message);
    }

    #[inline]
    pub fn verbose(&self, message: impl Into<String>) {
        self.log(VerbosityLevel::Verbose, None, message);
    }

    /// Log a game event at Normal level under a category
    #[inline]
    pub fn event(&self, category: &str, message: impl Into<String>) {
        self.log(VerbosityLevel::Normal, Some(category), message);
    }

    #[cfg(feature = "verbose-logging")]
    fn echo(&self, entry: &LogEntry) {
        if self.output_mode != OutputMode::Both || entry.level > self.verbosity {
            return;
        }
        match self.output_format {
            OutputFormat::Text => {
                if entry.level == VerbosityLevel::Minimal {
                    println!("{}", entry.message);
                } else {
                    println!("  {}", entry.message);
                }
            }
            OutputFormat::Json => {
                if let Ok(line) = serde_json::to_string(entry) {
                    println!("{line}");
                }
            }
        }
    }

    #[cfg(not(feature = "verbose-logging"))]
    fn echo(&self, _entry: &LogEntry) {}

    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    /// All messages in order
    pub fn messages(&self) -> Vec<String> {
        self.log_buffer
            .borrow()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// Does any message contain `needle`?
    pub fn contains(&self, needle: &str) -> bool {
        self.log_buffer
            .borrow()
            .iter()
            .any(|entry| entry.message.contains(needle))
    }

    pub fn last(&self) -> Option<String> {
        self.log_buffer
            .borrow()
            .last()
            .map(|entry| entry.message.clone())
    }

    pub fn len(&self) -> usize {
        self.log_buffer.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_buffer.borrow().is_empty()
    }

    /// Export the whole log as a JSON array
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&*self.log_buffer.borrow())?)
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

impl Clone for GameLogger {
    fn clone(&self) -> Self {
        GameLogger {
            verbosity: self.verbosity,
            output_format: self.output_format,
            output_mode: self.output_mode,
            log_buffer: RefCell::new(self.log_buffer.borrow().clone()),
        }
    }
}
