use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Raw result of one checker invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
}

impl ProcessOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// How PHP_CodeSniffer's exit status is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Exit code 0.
    Clean,
    /// Exit code 1 (violations) or 2 (violations, some auto-fixable).
    Violations,
    /// Anything else. Carries a human-readable description of the exit.
    Failure(String),
}

impl ExecutionStatus {
    pub fn from_output(output: &ProcessOutput) -> Self {
        match output.exit_code {
            Some(0) => ExecutionStatus::Clean,
            Some(1) | Some(2) => ExecutionStatus::Violations,
            Some(code) => ExecutionStatus::Failure(format!("Exited with code {code}")),
            None => match output.signal {
                Some(signal) => ExecutionStatus::Failure(format!("Terminated by signal {signal}")),
                None => ExecutionStatus::Failure("Exited abnormally".to_string()),
            },
        }
    }
}

/// Spawns a program, feeds it stdin and waits for it to exit.
pub trait ProcessRunner: Send + Sync {
    /// Runs `program` with `args`, writing each of `stdin` in order to the
    /// child's standard input before closing it.
    ///
    /// Returns `Err` only when the process could not be started or waited on.
    /// Any exit status, successful or not, is an `Ok`.
    fn run(&self, program: &Path, args: &[String], stdin: &[&[u8]])
    -> std::io::Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `std::process`.
///
/// Arguments are passed as a discrete argv list; no shell is involved.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        stdin: &[&[u8]],
    ) -> std::io::Result<ProcessOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        log::debug!("Spawned {} (pid {})", program.display(), child.id());

        let child_stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            if let Some(mut pipe) = child_stdin {
                scope.spawn(move || {
                    for chunk in stdin {
                        // The child may exit before reading everything. Its exit
                        // status is the error worth reporting, not the broken pipe.
                        if let Err(e) = pipe.write_all(chunk) {
                            log::debug!("Error writing to child stdin: {e}");
                            return;
                        }
                    }
                });
            }
            child.wait_with_output()
        })?;

        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            output.status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Ok(ProcessOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
            signal,
        })
    }
}
