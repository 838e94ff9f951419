use crate::command::{ResolvedCommand, build_command};
use crate::config::CheckerConfig;
use crate::executor::{ExecutionStatus, ProcessRunner, SystemRunner};
use crate::file::{CheckReport, Contents, SourceFile};
use crate::resolver::{ExecutableResolver, ResolveError};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub const INPUT_FILE_MARKER: &str = "phpcs_input_file: ";

/// Fatal outcome for a single file. Other files are unaffected.
#[derive(Error, Debug)]
pub enum CheckError {
    /// The file's contents is a live stream, which the checker cannot take.
    #[error("Streams are not supported ({path})")]
    UnsupportedStream { path: String },

    #[error("Cannot check {path}: {source}")]
    Resolve {
        path: String,
        #[source]
        source: ResolveError,
    },

    /// The resolved executable could not be started or waited on.
    #[error("Execution of Code Sniffer failed on {path}: could not run {}: {source}", .executable.display())]
    Spawn {
        path: String,
        executable: PathBuf,
        #[source]
        source: std::io::Error,
        stdout: String,
    },

    /// The checker exited outside the 0/1/2 convention.
    #[error("Execution of Code Sniffer failed on {path}: {status}")]
    UnexpectedExit {
        path: String,
        status: String,
        stdout: String,
        stderr: String,
    },
}

impl CheckError {
    pub fn path(&self) -> &str {
        match self {
            CheckError::UnsupportedStream { path }
            | CheckError::Resolve { path, .. }
            | CheckError::Spawn { path, .. }
            | CheckError::UnexpectedExit { path, .. } => path,
        }
    }

    /// Checker output captured before the failure, if any.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            CheckError::Spawn { stdout, .. } | CheckError::UnexpectedExit { stdout, .. } => {
                Some(stdout)
            }
            _ => None,
        }
    }
}

/// Runs the checker on files and attaches a [`CheckReport`] to each.
///
/// The checker's stdin gets a marker line naming the file, then the raw
/// content:
///
/// ```text
/// phpcs_input_file: /src/bad_file.php
/// <file content>
/// ```
///
/// The marker line ends with the same line ending the file itself uses.
pub struct CheckStage {
    command: ResolvedCommand,
    resolver: Arc<ExecutableResolver>,
    runner: Box<dyn ProcessRunner>,
}

impl CheckStage {
    pub fn new(config: &CheckerConfig, resolver: Arc<ExecutableResolver>) -> Self {
        Self::from_command(build_command(config), resolver)
    }

    pub fn from_command(command: ResolvedCommand, resolver: Arc<ExecutableResolver>) -> Self {
        Self {
            command,
            resolver,
            runner: Box::new(SystemRunner),
        }
    }

    pub fn with_runner(mut self, runner: impl ProcessRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn command(&self) -> &ResolvedCommand {
        &self.command
    }

    /// Checks one file.
    ///
    /// Files without contents are returned untouched. Buffered files come back
    /// with a report attached.
    pub fn process(&self, mut file: SourceFile) -> Result<SourceFile, CheckError> {
        let report = match &file.contents {
            Contents::Null => {
                log::trace!("Skipping {} (no contents)", file.path);
                return Ok(file);
            }
            Contents::Stream(_) => {
                return Err(CheckError::UnsupportedStream { path: file.path });
            }
            Contents::Buffer(bytes) => self.check_bytes(&file.path, bytes)?,
        };

        file.report = Some(report);
        Ok(file)
    }

    fn check_bytes(&self, path: &str, bytes: &[u8]) -> Result<CheckReport, CheckError> {
        let executable =
            self.resolver
                .resolve(&self.command.executable)
                .map_err(|source| CheckError::Resolve {
                    path: path.to_string(),
                    source,
                })?;

        let marker = input_marker(path, bytes);
        let output = self
            .runner
            .run(&executable, &self.command.arguments, &[marker.as_bytes(), bytes])
            .map_err(|source| CheckError::Spawn {
                path: path.to_string(),
                executable: executable.clone(),
                source,
                stdout: String::new(),
            })?;

        match ExecutionStatus::from_output(&output) {
            ExecutionStatus::Clean => Ok(CheckReport::clean()),
            ExecutionStatus::Violations => {
                log::debug!("Style violations found in {path}");
                Ok(CheckReport::violations(output.stdout_lossy()))
            }
            ExecutionStatus::Failure(status) => Err(CheckError::UnexpectedExit {
                path: path.to_string(),
                status,
                stdout: output.stdout_lossy(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
        }
    }

    /// Lazily checks `files` one at a time, in order.
    pub fn process_all<'a, I>(
        &'a self,
        files: I,
    ) -> impl Iterator<Item = Result<SourceFile, CheckError>> + 'a
    where
        I: IntoIterator<Item = SourceFile>,
        I::IntoIter: 'a,
    {
        files.into_iter().map(move |file| self.process(file))
    }

    /// Checks `files` with up to `jobs` checker processes in flight.
    ///
    /// Results come back in the same order as `files`.
    pub fn process_parallel(
        &self,
        files: Vec<SourceFile>,
        jobs: usize,
    ) -> Vec<Result<SourceFile, CheckError>> {
        if jobs <= 1 {
            return self.process_all(files).collect();
        }

        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| {
                files
                    .into_par_iter()
                    .map(|file| self.process(file))
                    .collect()
            }),
            Err(e) => {
                log::warn!("Could not start {jobs} worker threads ({e}), checking sequentially");
                self.process_all(files).collect()
            }
        }
    }
}

/// Line ending used by `content`: the first CRLF or LF found, LF otherwise.
pub fn detect_line_ending(content: &[u8]) -> &'static str {
    match content.iter().position(|&b| b == b'\n') {
        Some(i) if i > 0 && content[i - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

/// The first stdin line, telling the checker which file it is looking at.
pub fn input_marker(path: &str, content: &[u8]) -> String {
    format!("{INPUT_FILE_MARKER}{path}{}", detect_line_ending(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ProcessOutput;
    use crate::resolver::ExecutableLookup;
    use std::path::Path;
    use std::sync::Mutex;

    struct FixedLookup;

    impl ExecutableLookup for FixedLookup {
        fn lookup(&self, executable: &str) -> Result<Option<PathBuf>, std::io::Error> {
            Ok((executable == "phpcs").then(|| PathBuf::from("/usr/bin/phpcs")))
        }
    }

    /// Records every invocation and answers with a fixed exit code,
    /// echoing stdin back as stdout.
    struct RecordingRunner {
        exit_code: Option<i32>,
        calls: Arc<Mutex<Vec<(PathBuf, Vec<String>, Vec<u8>)>>>,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(
            &self,
            program: &Path,
            args: &[String],
            stdin: &[&[u8]],
        ) -> std::io::Result<ProcessOutput> {
            let input = stdin.concat();
            self.calls
                .lock()
                .unwrap()
                .push((program.to_path_buf(), args.to_vec(), input.clone()));
            Ok(ProcessOutput {
                stdout: input,
                exit_code: self.exit_code,
                ..Default::default()
            })
        }
    }

    struct FailingRunner;

    impl ProcessRunner for FailingRunner {
        fn run(&self, _: &Path, _: &[String], _: &[&[u8]]) -> std::io::Result<ProcessOutput> {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "executable vanished",
            ))
        }
    }

    fn stage_with(
        exit_code: Option<i32>,
    ) -> (CheckStage, Arc<Mutex<Vec<(PathBuf, Vec<String>, Vec<u8>)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let runner = RecordingRunner {
            exit_code,
            calls: calls.clone(),
        };
        let resolver = Arc::new(ExecutableResolver::with_lookup(FixedLookup));
        let stage = CheckStage::new(&CheckerConfig::default(), resolver).with_runner(runner);
        (stage, calls)
    }

    #[test]
    fn line_ending_detection() {
        assert_eq!(detect_line_ending(b"a\r\nb\nc"), "\r\n");
        assert_eq!(detect_line_ending(b"a\nb\r\nc"), "\n");
        assert_eq!(detect_line_ending(b"no newline"), "\n");
        assert_eq!(detect_line_ending(b""), "\n");
        assert_eq!(detect_line_ending(b"\nfirst"), "\n");
        assert_eq!(
            input_marker("/src/a.php", b"x\r\ny"),
            "phpcs_input_file: /src/a.php\r\n"
        );
    }

    #[test]
    fn null_files_pass_through_without_spawning() {
        let (stage, calls) = stage_with(Some(0));
        let file = stage.process(SourceFile::null("/src")).unwrap();
        assert!(file.is_null());
        assert!(file.report.is_none());
        assert_eq!(file.path, "/src");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn streamed_files_are_rejected() {
        let (stage, calls) = stage_with(Some(0));
        let err = stage
            .process(SourceFile::streamed("/src/a.php", std::io::empty()))
            .unwrap_err();
        assert!(matches!(err, CheckError::UnsupportedStream { .. }));
        assert!(err.to_string().contains("Streams are not supported"));
        assert_eq!(err.path(), "/src/a.php");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn clean_exit_attaches_empty_report() {
        let (stage, calls) = stage_with(Some(0));
        let file = stage.process(SourceFile::new("/src/a.php", "<?php\n")).unwrap();
        assert_eq!(file.report, Some(CheckReport::clean()));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (program, args, stdin) = &calls[0];
        assert_eq!(program, &PathBuf::from("/usr/bin/phpcs"));
        assert_eq!(args, &vec!["-".to_string()]);
        assert_eq!(stdin, b"phpcs_input_file: /src/a.php\n<?php\n");
    }

    #[test]
    fn exit_one_and_two_attach_output() {
        for code in [1, 2] {
            let (stage, _) = stage_with(Some(code));
            let file = stage
                .process(SourceFile::new("/src/bad_file.php", "Give me these lines\nback!"))
                .unwrap();
            let report = file.report.unwrap();
            assert!(report.failed);
            assert_eq!(
                report.output,
                "phpcs_input_file: /src/bad_file.php\nGive me these lines\nback!"
            );
        }
    }

    #[test]
    fn other_exit_codes_are_errors_with_stdout() {
        let (stage, _) = stage_with(Some(3));
        let err = stage.process(SourceFile::new("/src/a.php", "boom")).unwrap_err();
        match &err {
            CheckError::UnexpectedExit { status, stdout, .. } => {
                assert!(status.contains("code 3"));
                assert!(stdout.ends_with("boom"));
            }
            other => panic!("Expected UnexpectedExit, got {other:?}"),
        }
        assert!(err.stdout().unwrap().contains("boom"));
        assert!(err.to_string().contains("/src/a.php"));
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let resolver = Arc::new(ExecutableResolver::with_lookup(FixedLookup));
        let stage = CheckStage::new(&CheckerConfig::default(), resolver).with_runner(FailingRunner);
        let err = stage.process(SourceFile::new("/src/a.php", "x")).unwrap_err();
        assert!(matches!(err, CheckError::Spawn { .. }));
        assert_eq!(err.stdout(), Some(""));
    }

    #[test]
    fn unresolvable_executable_names_the_token() {
        let resolver = Arc::new(ExecutableResolver::with_lookup(FixedLookup));
        let stage = CheckStage::new(
            &CheckerConfig::with_executable("./fixtures/missing"),
            resolver,
        );
        let err = stage.process(SourceFile::new("/src/a.php", "x")).unwrap_err();
        assert!(matches!(
            err,
            CheckError::Resolve {
                source: ResolveError::NotFound { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("Cannot find"));
        assert!(err.to_string().contains("./fixtures/missing"));
    }

    #[test]
    fn process_all_preserves_order_and_continues_after_errors() {
        let (stage, _) = stage_with(Some(0));
        let files = vec![
            SourceFile::new("/src/one.php", "1"),
            SourceFile::streamed("/src/two.php", std::io::empty()),
            SourceFile::null("/src/dir"),
            SourceFile::new("/src/four.php", "4"),
        ];
        let results: Vec<_> = stage.process_all(files).collect();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().path, "/src/one.php");
        assert_eq!(results[1].as_ref().unwrap_err().path(), "/src/two.php");
        assert_eq!(results[2].as_ref().unwrap().path, "/src/dir");
        assert_eq!(results[3].as_ref().unwrap().path, "/src/four.php");
    }

    #[test]
    fn parallel_processing_keeps_input_order() {
        let (stage, calls) = stage_with(Some(1));
        let files: Vec<_> = (0..32)
            .map(|i| SourceFile::new(format!("/src/file_{i}.php"), format!("content {i}")))
            .collect();

        let results = stage.process_parallel(files, 4);
        assert_eq!(results.len(), 32);
        for (i, result) in results.into_iter().enumerate() {
            let file = result.unwrap();
            assert_eq!(file.path, format!("/src/file_{i}.php"));
            assert!(file.report.unwrap().output.ends_with(&format!("content {i}")));
        }
        assert_eq!(calls.lock().unwrap().len(), 32);
    }
}
