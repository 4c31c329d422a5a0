//! Logging utilities with colored output and workflow commands.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro gated by `--verbose`
//! - GitHub workflow commands (`::add-mask::`, `::error::`) for the host runner
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "running {} with {} args", manager, args.len());
//! logger::add_mask(&token);
//! logger::report_failure("Command `git` failed");
//! ```

use owo_colors::{AnsiColors, OwoColorize, Stream, Style};
use std::{
    io::{Write, stdout},
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

// ============================================================================
// Log Macro
// ============================================================================

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
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    let color = match module_lower {
        "deploy" => AnsiColors::BrightBlue,
        "done" => AnsiColors::BrightGreen,
        "error" => AnsiColors::BrightRed,
        _ => AnsiColors::BrightYellow,
    };
    prefix
        .if_supports_color(Stream::Stdout, |p| {
            p.style(Style::new().color(color).bold())
        })
        .to_string()
}

// ============================================================================
// Workflow Commands
// ============================================================================

/// Ask the host runner to redact `secret` from every subsequent log line.
pub fn add_mask(secret: &str) {
    if secret.is_empty() {
        return;
    }
    let mut stdout = stdout().lock();
    writeln!(stdout, "::add-mask::{}", escape_data(secret)).ok();
    stdout.flush().ok();
}

/// Report the terminal failure of the run through the host's error channel.
pub fn report_failure(message: &str) {
    let mut stdout = stdout().lock();
    writeln!(stdout, "::error::{}", escape_data(message)).ok();
    stdout.flush().ok();
}

/// Escape a workflow command payload (`%`, CR and LF are significant).
fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

// ============================================================================
// Tests
// ============================================================================
