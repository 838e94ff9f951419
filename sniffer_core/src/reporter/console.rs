use super::{Reporter, ReporterError};
use crate::file::SourceFile;

type Sink = Box<dyn FnMut(&str) + Send>;

/// Logs the checker output of every file with problems. Never fails.
pub struct LogReporter {
    sink: Sink,
}

impl LogReporter {
    /// Writes through the `log` facade at `warn` level.
    pub fn new() -> Self {
        Self::with_sink(|message| log::warn!("{message}"))
    }

    pub fn with_sink(sink: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// `PHP Code Sniffer found a problem in <path>` followed by the output,
/// indented by four spaces.
pub fn problem_message(path: &str, output: &str) -> String {
    format!(
        "PHP Code Sniffer found a problem in {path}\n{}",
        output.replace('\n', "\n    ")
    )
}

impl Reporter for LogReporter {
    fn name(&self) -> &'static str {
        "log"
    }

    fn on_item(&mut self, file: SourceFile) -> Result<SourceFile, ReporterError> {
        if let Some(report) = file.report.as_ref().filter(|r| r.failed) {
            (self.sink)(&problem_message(&file.path, &report.output));
        }
        Ok(file)
    }
}
