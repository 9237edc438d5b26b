//! External encoder invocation.
//!
//! Every transform in the pipeline is a single subprocess call built as a
//! structured argument vector - nothing is ever passed through a shell.

use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Errors from launching the encoder process itself.
///
/// A nonzero exit is not an error at this layer - callers inspect
/// [`ToolOutput`] and attach their own stage-specific context.
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Failed to launch '{tool}': {source}")]
    LaunchFailed {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for encoder invocations.
pub type EncoderResult<T> = Result<T, EncoderError>;

/// Captured output of a finished tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl ToolOutput {
    /// Last lines of stderr, for error messages.
    pub fn stderr_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.stderr.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// A single tool invocation: program plus argument vector.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
}

impl Invocation {
    /// Start building an invocation of the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument.
    pub fn path_arg(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// The program name (for error context).
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The built argument vector.
    pub fn arg_slice(&self) -> &[String] {
        &self.args
    }

    /// Render the full command line for logging.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Run the invocation to completion, capturing stdout and stderr.
    pub fn run(&self) -> EncoderResult<ToolOutput> {
        tracing::debug!(tool = %self.program, "running: {}", self.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| EncoderError::LaunchFailed {
                tool: self.program.clone(),
                source: e,
            })?;

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
            success: output.status.success(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn builds_argument_vector() {
        let inv = Invocation::new("ffmpeg")
            .arg("-y")
            .args(["-i", "input.mp4"])
            .path_arg(&PathBuf::from("out dir/out.mp4"));

        assert_eq!(inv.program(), "ffmpeg");
        assert_eq!(
            inv.arg_slice(),
            &["-y", "-i", "input.mp4", "out dir/out.mp4"]
        );
    }

    #[test]
    fn display_joins_tokens() {
        let inv = Invocation::new("ffprobe").args(["-v", "error"]);
        assert_eq!(inv.display(), "ffprobe -v error");
    }

    #[test]
    fn launch_failure_is_reported() {
        let inv = Invocation::new("/nonexistent/binary-xyz");
        let result = inv.run();
        assert!(matches!(result, Err(EncoderError::LaunchFailed { .. })));
    }

    #[test]
    fn stderr_tail_truncates() {
        let out = ToolOutput {
            stdout: String::new(),
            stderr: (0..30).map(|i| format!("line {}\n", i)).collect(),
            exit_code: 1,
            success: false,
        };
        let tail = out.stderr_tail(3);
        assert_eq!(tail, "line 27\nline 28\nline 29");
    }
}
