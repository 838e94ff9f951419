use serde::Serialize;
use sniffer_core::{PipelineError, RunOutcome};

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

#[derive(Serialize, Debug)]
pub struct FileError {
    pub path: String,
    pub message: String,
}

/// End-of-run summary, printed as text or as a JSON document.
#[derive(Serialize, Debug)]
pub struct Summary {
    pub checked: usize,
    pub clean: usize,
    pub violations: Vec<String>,
    pub errors: Vec<FileError>,
    /// Set when a reporter stopped the run. The other fields then describe
    /// the files handled before it stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl Summary {
    pub fn from_result(checked: usize, result: &Result<RunOutcome, PipelineError>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(checked, outcome, None),
            Err(err) => Self::from_outcome(checked, err.partial_outcome(), Some(err.to_string())),
        }
    }

    fn from_outcome(checked: usize, outcome: &RunOutcome, aborted: Option<String>) -> Self {
        Self {
            checked,
            clean: outcome.clean_files().count(),
            violations: outcome.failed_files().map(|f| f.path.clone()).collect(),
            errors: outcome
                .errors
                .iter()
                .map(|e| FileError {
                    path: e.path().to_string(),
                    message: e.to_string(),
                })
                .collect(),
            aborted,
        }
    }

    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.errors.is_empty()
    }
}

pub fn print_summary(summary: &Summary, mode: OutputMode) -> Result<(), serde_json::Error> {
    match mode {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        OutputMode::Human => {
            for error in &summary.errors {
                eprintln!("error: {}", error.message);
            }
            if let Some(reason) = &summary.aborted {
                eprintln!("Run aborted: {reason}");
            }
            println!(
                "Checked {} file(s): {} clean, {} with problems, {} error(s)",
                summary.checked,
                summary.clean,
                summary.violations.len(),
                summary.errors.len()
            );
        }
    }
    Ok(())
}
