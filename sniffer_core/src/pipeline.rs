use crate::file::SourceFile;
use crate::reporter::{Reporter, ReporterError};
use crate::stage::{CheckError, CheckStage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A reporter decided the run must stop. `outcome` holds what was
    /// collected up to that point, check errors included.
    #[error("Reporter '{reporter}' stopped the run: {source}")]
    Reporter {
        reporter: &'static str,
        #[source]
        source: ReporterError,
        outcome: RunOutcome,
    },
}

impl PipelineError {
    pub fn reporter_error(&self) -> &ReporterError {
        match self {
            PipelineError::Reporter { source, .. } => source,
        }
    }

    /// Files and check errors gathered before the run stopped.
    pub fn partial_outcome(&self) -> &RunOutcome {
        match self {
            PipelineError::Reporter { outcome, .. } => outcome,
        }
    }
}

/// Everything that came out of a completed run.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Files that made it through the stage and every reporter, in input order.
    pub files: Vec<SourceFile>,
    /// Files the stage could not check.
    pub errors: Vec<CheckError>,
}

impl RunOutcome {
    pub fn failed_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.has_failed())
    }

    pub fn clean_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files
            .iter()
            .filter(|f| f.report.as_ref().is_some_and(|r| !r.failed))
    }

    /// No check errors and no style violations.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.failed_files().next().is_none()
    }
}

/// Drives files through a [`CheckStage`] and then through each reporter.
///
/// A file the stage cannot check is recorded in [`RunOutcome::errors`] and the
/// run goes on with the next file. A reporter error stops the run.
pub struct Pipeline {
    stage: CheckStage,
    reporters: Vec<Box<dyn Reporter>>,
    jobs: usize,
}

impl Pipeline {
    pub fn new(stage: CheckStage) -> Self {
        Self {
            stage,
            reporters: Vec::new(),
            jobs: 1,
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn with_reporters(mut self, reporters: impl IntoIterator<Item = Box<dyn Reporter>>) -> Self {
        self.reporters.extend(reporters);
        self
    }

    /// Number of checker processes allowed in flight. Output order is the
    /// input order regardless.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn run<I>(&mut self, files: I) -> Result<RunOutcome, PipelineError>
    where
        I: IntoIterator<Item = SourceFile>,
    {
        let Pipeline {
            stage,
            reporters,
            jobs,
        } = self;

        if *jobs > 1 {
            let files: Vec<SourceFile> = files.into_iter().collect();
            log::debug!("Checking {} files with {jobs} jobs", files.len());
            let results = stage.process_parallel(files, *jobs);
            drive(reporters, results.into_iter())
        } else {
            drive(reporters, stage.process_all(files))
        }
    }
}

fn drive(
    reporters: &mut [Box<dyn Reporter>],
    results: impl Iterator<Item = Result<SourceFile, CheckError>>,
) -> Result<RunOutcome, PipelineError> {
    let mut outcome = RunOutcome::default();

    for result in results {
        let mut file = match result {
            Ok(file) => file,
            Err(err) => {
                log::error!("{err}");
                outcome.errors.push(err);
                continue;
            }
        };

        for reporter in reporters.iter_mut() {
            match reporter.on_item(file) {
                Ok(forwarded) => file = forwarded,
                Err(source) => {
                    return Err(PipelineError::Reporter {
                        reporter: reporter.name(),
                        source,
                        outcome,
                    });
                }
            }
        }
        outcome.files.push(file);
    }

    // Every reporter gets its end-of-stream call, even after an earlier one failed.
    let mut first_error = None;
    for reporter in reporters.iter_mut() {
        if let Err(source) = reporter.on_end() {
            log::debug!("Reporter '{}' failed at end of stream: {source}", reporter.name());
            if first_error.is_none() {
                first_error = Some((reporter.name(), source));
            }
        }
    }

    match first_error {
        Some((reporter, source)) => Err(PipelineError::Reporter {
            reporter,
            source,
            outcome,
        }),
        None => Ok(outcome),
    }
}
