use crate::config::ReporterSettings;
use crate::file::SourceFile;
use std::path::PathBuf;
use thiserror::Error;

pub mod console;
pub mod fail;
pub mod file;

pub use console::LogReporter;
pub use fail::FailReporter;
pub use file::FileReporter;

/// Errors raised by reporters, either when they are built or while the
/// stream runs.
#[derive(Error, Debug)]
pub enum ReporterError {
    /// The `file` reporter was created without a target path.
    #[error("You have to specify a path for the file reporter!")]
    MissingPath,

    #[error("Reporter cannot be named \"index\"")]
    ReservedName,

    #[error("There is no reporter \"{name}\"")]
    UnknownReporter { name: String },

    #[error("There is no fail reporter \"{name}\"")]
    UnknownFailReporter { name: String },

    /// One or more files had style violations and the reporter's policy is to
    /// fail the run.
    #[error("PHP Code Sniffer failed on {}", .paths.join(", "))]
    Failed { paths: Vec<String> },

    /// The combined report could not be written.
    #[error("Failed to write report to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A `Reporter` consumes files that went through the checker stage and
/// decides how failures surface to the user.
///
/// The pipeline host calls [`Reporter::on_item`] for every file, in stream
/// order, then [`Reporter::on_end`] once after the last file.
pub trait Reporter: Send {
    /// Short identifier used in logs and by [`load_reporter`].
    fn name(&self) -> &'static str;

    /// Handles one decorated file and hands it on.
    ///
    /// Returning `Err` aborts the whole stream; the file is not forwarded.
    fn on_item(&mut self, file: SourceFile) -> Result<SourceFile, ReporterError>;

    /// Called once after the last file.
    fn on_end(&mut self) -> Result<(), ReporterError> {
        Ok(())
    }
}

/// Options shared by the bundled reporters. Each reporter reads only the
/// fields it understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReporterOptions {
    pub path: Option<PathBuf>,
    pub fail_on_first: Option<bool>,
}

impl From<&ReporterSettings> for ReporterOptions {
    fn from(settings: &ReporterSettings) -> Self {
        Self {
            path: settings.path.clone(),
            fail_on_first: settings.fail_on_first,
        }
    }
}

/// Builds a bundled reporter by name: `fail`, `log` or `file`.
pub fn load_reporter(
    name: &str,
    options: &ReporterOptions,
) -> Result<Box<dyn Reporter>, ReporterError> {
    match name {
        "index" => Err(ReporterError::ReservedName),
        "fail" => Ok(Box::new(FailReporter::from_options(options))),
        "log" => Ok(Box::new(LogReporter::new())),
        "file" => Ok(Box::new(FileReporter::from_options(options)?)),
        other => Err(ReporterError::UnknownReporter {
            name: other.to_string(),
        }),
    }
}

/// Builds a fail reporter by name, defaulting to `fail`.
pub fn load_fail_reporter(
    name: Option<&str>,
    options: &ReporterOptions,
) -> Result<Box<dyn Reporter>, ReporterError> {
    match name.unwrap_or("fail") {
        "fail" => Ok(Box::new(FailReporter::from_options(options))),
        other => Err(ReporterError::UnknownFailReporter {
            name: other.to_string(),
        }),
    }
}
