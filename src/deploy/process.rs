//! Subprocess gateway.
//!
//! Every external tool the pipeline touches (`xcrun`, `codesign`, `unzip`,
//! `open`, `PlistBuddy`, `security` and the conversion tool) runs through a
//! [`CommandRunner`]. The runner captures output and reports the exit status;
//! it never decides whether a status means success. That is up to the caller.

use super::error::{Error, Result};
use std::{fmt, path::Path, process::Stdio};

/// Xcode command line tool dispatcher (`xcrun simctl ...`)
pub const XCRUN: &str = "xcrun";

/// Code signing tool
pub const CODESIGN: &str = "codesign";

/// Archive extraction tool
pub const UNZIP: &str = "unzip";

/// macOS application launcher
pub const OPEN: &str = "open";

/// Property list query tool
pub const PLIST_BUDDY: &str = "/usr/libexec/PlistBuddy";

/// Keychain inventory tool
pub const SECURITY: &str = "security";

/// A single external command: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends a path argument, rejecting non-UTF8 paths.
    pub fn path_arg(self, path: &Path) -> Result<Self> {
        Ok(self.arg(path_arg(path)?))
    }

    /// Returns true if this is `program` called with `leading` as its first arguments.
    pub fn matches(&self, program: &str, leading: &[&str]) -> bool {
        self.program == program
            && self.args.len() >= leading.len()
            && self.args.iter().zip(leading).all(|(a, b)| a == b)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit status; `-1` when the process was terminated by a signal
    pub status: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Successful output with the given stdout.
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Failed output with the given status and stderr.
    pub fn failure(status: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == 0
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Stdout and stderr combined, for tools whose diagnostics land on either stream.
    pub fn combined(&self) -> String {
        let stdout = String::from_utf8_lossy(&self.stdout);
        let stderr = String::from_utf8_lossy(&self.stderr);
        match (stdout.trim(), stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }

    /// Converts a non-zero status into [`Error::ToolFailure`].
    pub fn check(self, invocation: &Invocation) -> Result<Self> {
        if self.succeeded() {
            Ok(self)
        } else {
            Err(Error::ToolFailure {
                command: invocation.to_string(),
                status: self.status,
                stderr: self.stderr_str(),
            })
        }
    }
}

/// Runs external commands.
///
/// Implementations must wait for the process to exit before returning.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Runs the invocation to completion.
    ///
    /// Fails with [`Error::LaunchFailure`] only when the process cannot be
    /// started. A non-zero exit status is returned as a normal [`ProcessOutput`].
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        log::debug!("Running: {}", invocation);

        let output = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::LaunchFailure {
                program: invocation.program.clone(),
                source,
            })?;

        let status = output.status.code().unwrap_or(-1);
        if status != 0 {
            log::debug!("`{}` exited with status {}", invocation.program, status);
        }

        Ok(ProcessOutput {
            status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Converts a path into a command argument.
pub fn path_arg(path: &Path) -> Result<String> {
    match path.to_str() {
        Some(s) => Ok(s.to_string()),
        None => crate::bail!("path contains non-UTF8 characters: {}", path.display()),
    }
}
