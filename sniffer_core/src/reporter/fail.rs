use super::{Reporter, ReporterError, ReporterOptions};
use crate::file::SourceFile;

/// Turns style violations into a pipeline error.
///
/// With `fail_on_first` (the default) the first failed file stops the stream
/// and is not forwarded. Otherwise every file passes and the run fails at the
/// end, listing every file that had problems.
#[derive(Debug, Clone)]
pub struct FailReporter {
    fail_on_first: bool,
    failed_paths: Vec<String>,
}

impl FailReporter {
    pub fn new(fail_on_first: bool) -> Self {
        Self {
            fail_on_first,
            failed_paths: Vec::new(),
        }
    }

    pub fn from_options(options: &ReporterOptions) -> Self {
        Self::new(options.fail_on_first.unwrap_or(true))
    }

    pub fn failed_paths(&self) -> &[String] {
        &self.failed_paths
    }
}

impl Default for FailReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Reporter for FailReporter {
    fn name(&self) -> &'static str {
        "fail"
    }

    fn on_item(&mut self, file: SourceFile) -> Result<SourceFile, ReporterError> {
        if !file.has_failed() {
            return Ok(file);
        }

        if self.fail_on_first {
            return Err(ReporterError::Failed {
                paths: vec![file.path],
            });
        }

        self.failed_paths.push(file.path.clone());
        Ok(file)
    }

    fn on_end(&mut self) -> Result<(), ReporterError> {
        if self.failed_paths.is_empty() {
            return Ok(());
        }
        Err(ReporterError::Failed {
            paths: std::mem::take(&mut self.failed_paths),
        })
    }
}
