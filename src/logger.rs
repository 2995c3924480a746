//! Logging utilities with colored output.
//!
//! Provides the `log!` and `debug!` macros for formatted terminal output
//! with colored module prefixes, plus a single-line rebuild status display
//! for watch mode.

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module {
        "serve" => prefix.bright_blue().bold().to_string(),
        "watch" | "build" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Rebuild Status (single-line status with overwrite)
// ============================================================================

/// Get current time formatted as HH:MM:SS (UTC)
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Single-line status display for watch mode.
///
/// Each message overwrites the previous one, keeping the terminal clean
/// across rebuild cycles. Error blocks may span multiple lines and are
/// cleared by the next status.
struct RebuildStatus {
    /// Lines of previous output to clear
    last_lines: usize,
}

/// Global rebuild status shared across the build/reload subsystems.
static REBUILD_STATUS: LazyLock<Mutex<RebuildStatus>> =
    LazyLock::new(|| Mutex::new(RebuildStatus { last_lines: 0 }));

impl RebuildStatus {
    /// Internal display logic with line overwriting.
    fn display(&mut self, symbol: String, message: &str) {
        let mut stdout = stdout().lock();

        // Clear previous output by moving cursor up and clearing
        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }

        let timestamp = format!("[{}]", now()).dimmed().to_string();
        let line = if symbol.is_empty() {
            format!("{timestamp} {message}")
        } else {
            format!("{timestamp} {symbol} {message}")
        };

        writeln!(stdout, "{line}").ok();
        stdout.flush().ok();

        // Track actual line count (including newlines in message)
        self.last_lines = message.matches('\n').count() + 1;
    }
}

/// Rebuild status: success (✓ prefix, green).
pub fn status_success(message: &str) {
    REBUILD_STATUS
        .lock()
        .display(format!("{}", "✓".green()), message);
}

/// Rebuild status: error (✗ prefix, red) with detail block.
pub fn status_error(summary: &str, detail: &str) {
    let message = if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    };
    REBUILD_STATUS
        .lock()
        .display(format!("{}", "✗".red()), &message);
}
