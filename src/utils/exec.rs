//! External command execution.
//!
//! Two layers:
//! - [`Invocation`] + [`ProcessRunner`]: what the pipeline asks for. Fakes
//!   implement the trait in tests, [`SystemRunner`] spawns real processes.
//! - [`Cmd`]: builder used by [`SystemRunner`] to actually run a process,
//!   either streaming its output or capturing and filtering it.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::{Cmd, Invocation, ProcessRunner, SystemRunner};
//!
//! // Through the runner (PATH lookup, redaction)
//! SystemRunner.run(&Invocation::new("npm", ["install"], "site"))?;
//!
//! // Direct builder use
//! Cmd::new("git").args(["status", "-s"]).cwd(root).run()?;
//! ```

use crate::debug;
use anyhow::{Context, Result, bail};
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    fmt,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    sync::OnceLock,
};

/// Placeholder shown wherever a secret argument would be printed.
pub const REDACTED: &str = "***";

// ============================================================================
// Invocation
// ============================================================================

/// A single external command the pipeline wants to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Value that must never be printed (e.g. a token embedded in an argument).
    pub secret: Option<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I, cwd: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.as_ref().to_path_buf(),
            secret: None,
        }
    }

    /// Mark `secret` as sensitive for logging and error messages.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.secret = (!secret.is_empty()).then_some(secret);
        self
    }

    /// Replace every occurrence of the secret in `text`.
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match &self.secret {
            Some(secret) if text.contains(secret.as_str()) => {
                Cow::Owned(text.replace(secret.as_str(), REDACTED))
            }
            _ => Cow::Borrowed(text),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", self.redact(arg))?;
        }
        Ok(())
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Runs [`Invocation`]s to completion. Non-zero exit is an error.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<()>;
}

/// Runner backed by real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        let program = which::which(&invocation.program).map_err(|_| {
            anyhow::anyhow!("Unable to locate executable file: {}", invocation.program)
        })?;

        debug!("exec"; "{} (in {})", invocation, invocation.cwd.display());

        let cmd = Cmd::new(program)
            .args(&invocation.args)
            .cwd(&invocation.cwd);

        // Captured output can be redacted before it is shown; streamed output cannot.
        if invocation.secret.is_some() {
            let output = cmd
                .filter(&SILENT_FILTER)
                .run()
                .map_err(|e| anyhow::anyhow!("{}", invocation.redact(&format!("{e:#}"))))
                .with_context(|| format!("`{invocation}` failed"))?;
            let stderr = String::from_utf8_lossy(&output.stderr);
            EMPTY_FILTER.log(&invocation.program, &invocation.redact(stderr.trim()));
        } else {
            cmd.stream(true)
                .run()
                .with_context(|| format!("`{invocation}` failed"))?;
        }
        Ok(())
    }
}

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    stream: bool,
    filter: Option<&'static FilterRule>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Inherit stdout/stderr instead of capturing them.
    ///
    /// Streamed commands return an [`Output`] with empty buffers.
    pub fn stream(mut self, enable: bool) -> Self {
        self.stream = enable;
        self
    }

    /// Set output filter for logging captured stderr.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Execute the command and return output.
    pub fn run(self) -> Result<Output> {
        let filter = self.filter.unwrap_or(&EMPTY_FILTER);

        if self.stream {
            self.run_streamed()
        } else {
            self.run_captured(filter)
        }
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .unwrap_or(&self.program)
            .to_string_lossy()
            .to_string()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Execution with captured stdout/stderr.
    fn run_captured(self, filter: &'static FilterRule) -> Result<Output> {
        let name = self.program_name();
        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute `{name}`"))?;

        log_output(&name, &output, filter)?;
        Ok(output)
    }

    /// Execution with inherited stdout/stderr.
    fn run_streamed(self) -> Result<Output> {
        let name = self.program_name();
        let status = self
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to execute `{name}`"))?;

        if !status.success() {
            bail!("Command `{name}` failed with {status}");
        }

        Ok(Output {
            status,
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command output logging.
///
/// Used to reduce noise by skipping known warnings or irrelevant messages.
pub struct FilterRule {
    /// Prefixes to skip when logging output.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    /// Create a new filter rule.
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    /// Check if a line should be skipped.
    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Lines that pass the filter, ANSI codes stripped.
    fn kept_lines(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(|line| strip_ansi(line).trim().to_string())
            .filter(|line| !self.should_skip(line))
            .collect()
    }

    /// Log output lines that pass the filter.
    pub fn log(&self, name: &str, output: &str) {
        let lines = self.kept_lines(output);
        if !lines.is_empty() {
            crate::log!(name; "{}", lines.join("\n"));
        }
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Silent filter (skip all output).
pub const SILENT_FILTER: FilterRule = FilterRule::new(&[""]);

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI regex"));
    re.replace_all(s, "")
}

/// Log command output, returning error on failure.
fn log_output(name: &str, output: &Output, filter: &'static FilterRule) -> Result<()> {
    if !output.status.success() {
        bail!(format_error(name, output, filter));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    filter.log(name, stderr.trim());
    Ok(())
}

/// Format error message for failed command.
fn format_error(name: &str, output: &Output, filter: &'static FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let error_msg = filter
        .skip_prefixes
        .iter()
        .fold(stderr.trim(), |s, p| s.trim_start_matches(p).trim_start());

    let mut msg = format!("Command `{name}` failed with {}", output.status);
    if !error_msg.is_empty() {
        msg.push('\n');
        msg.push_str(&strip_ansi(error_msg));
    }

    let stdout_trimmed = stdout.trim();
    if !stdout_trimmed.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout_trimmed);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================
