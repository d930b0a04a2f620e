//! Colored terminal output.
//!
//! Progress and status lines go to stdout, warnings to stderr. Color is only
//! used when the stream is a terminal.

use std::io::{self, IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Lines captured instead of printed, in order.
#[cfg(test)]
pub(crate) type Transcript = std::sync::Arc<std::sync::Mutex<Vec<String>>>;

/// Writes user-facing messages with verbosity control.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    #[cfg(test)]
    transcript: Option<Transcript>,
}

impl OutputManager {
    /// `quiet` wins over `verbose`.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose: verbose && !quiet,
            quiet,
            #[cfg(test)]
            transcript: None,
        }
    }

    /// Manager that records every line it would print.
    #[cfg(test)]
    pub(crate) fn recording(verbose: bool, quiet: bool) -> (Self, Transcript) {
        let transcript = Transcript::default();
        let mut output = Self::new(verbose, quiet);
        output.transcript = Some(transcript.clone());
        (output, transcript)
    }

    /// `==> message` in bold blue.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet || self.captured(|| format!("==> {}", message)) {
            return Ok(());
        }
        let mut out = stdout();
        write_prefixed(&mut out, "==> ", Color::Blue, message)
    }

    /// `✓ message` in green.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet || self.captured(|| format!("✓ {}", message)) {
            return Ok(());
        }
        let mut out = stdout();
        write_prefixed(&mut out, "✓ ", Color::Green, message)
    }

    /// `warning: message` on stderr.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet || self.captured(|| format!("warning: {}", message)) {
            return Ok(());
        }
        let mut err = stderr();
        write_prefixed(&mut err, "warning: ", Color::Yellow, message)
    }

    /// Dimmed detail line, only with `--verbose`.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose || self.captured(|| format!("    {}", message)) {
            return Ok(());
        }
        let mut out = stdout();
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        writeln!(out, "    {}", message)?;
        out.reset()
    }

    /// Plain line indented under the previous message.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet || self.captured(|| format!("  {}", message)) {
            return Ok(());
        }
        writeln!(io::stdout(), "  {}", message)
    }

    #[cfg(test)]
    fn captured(&self, line: impl FnOnce() -> String) -> bool {
        match &self.transcript {
            Some(transcript) => {
                transcript.lock().unwrap().push(line());
                true
            }
            None => false,
        }
    }

    #[cfg(not(test))]
    fn captured(&self, _line: impl FnOnce() -> String) -> bool {
        false
    }
}

fn stdout() -> StandardStream {
    StandardStream::stdout(color_choice(io::stdout().is_terminal()))
}

fn stderr() -> StandardStream {
    StandardStream::stderr(color_choice(io::stderr().is_terminal()))
}

fn color_choice(is_terminal: bool) -> ColorChoice {
    if is_terminal {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn write_prefixed(
    stream: &mut StandardStream,
    prefix: &str,
    color: Color,
    message: &str,
) -> io::Result<()> {
    stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(stream, "{}", prefix)?;
    stream.reset()?;
    writeln!(stream, "{}", message)
}
