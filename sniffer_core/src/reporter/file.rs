use super::{Reporter, ReporterError, ReporterOptions};
use crate::file::SourceFile;
use std::path::{Path, PathBuf};

const REPORT_SEPARATOR: &str = "\n\n\n";

/// Collects the checker output of every failed file and writes it to one
/// file when the stream ends. Nothing is written if no file failed.
#[derive(Debug, Clone)]
pub struct FileReporter {
    path: PathBuf,
    errors: usize,
    output: String,
}

impl FileReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            errors: 0,
            output: String::new(),
        }
    }

    pub fn from_options(options: &ReporterOptions) -> Result<Self, ReporterError> {
        options
            .path
            .as_ref()
            .map(Self::new)
            .ok_or(ReporterError::MissingPath)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of failed files seen so far.
    pub fn errors(&self) -> usize {
        self.errors
    }
}

pub fn summary_message(errors: usize, path: &Path) -> String {
    let noun = if errors == 1 { "error" } else { "errors" };
    format!(
        "Your report with {errors} {noun} got written to \"{}\"",
        path.display()
    )
}

impl Reporter for FileReporter {
    fn name(&self) -> &'static str {
        "file"
    }

    fn on_item(&mut self, file: SourceFile) -> Result<SourceFile, ReporterError> {
        if let Some(report) = file.report.as_ref().filter(|r| r.failed) {
            self.errors += 1;
            self.output.push_str(&report.output);
            self.output.push_str(REPORT_SEPARATOR);
        }
        Ok(file)
    }

    fn on_end(&mut self) -> Result<(), ReporterError> {
        let report = self.output.trim();
        if report.is_empty() {
            return Ok(());
        }

        std::fs::write(&self.path, report).map_err(|source| ReporterError::Write {
            path: self.path.clone(),
            source,
        })?;

        let message = summary_message(self.errors, &self.path);
        if self.errors > 0 {
            log::warn!("{message}");
        } else {
            log::info!("{message}");
        }
        Ok(())
    }
}
