pub mod command;
pub mod config;
pub mod executor;
pub mod file;
pub mod pipeline;
pub mod reporter;
pub mod resolver;
pub mod stage;

pub use command::{ResolvedCommand, build_command};
pub use config::{CheckerConfig, CheckerSettings, ConfigError, SnifferConfig};
pub use executor::{ExecutionStatus, ProcessOutput, ProcessRunner, SystemRunner};
pub use file::{CheckReport, Contents, SourceFile};
pub use pipeline::{Pipeline, PipelineError, RunOutcome};
pub use reporter::{
    FailReporter, FileReporter, LogReporter, Reporter, ReporterError, ReporterOptions,
    load_fail_reporter, load_reporter,
};
pub use resolver::{ExecutableLookup, ExecutableResolver, PathLookup, ResolveError};
pub use stage::{CheckError, CheckStage};
