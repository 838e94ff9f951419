mod output;

use sniffer_core::config::{NumericSetting, ReporterSettings, SnifferConfig};
use sniffer_core::{
    CheckStage, ExecutableResolver, Pipeline, Reporter, ReporterOptions, SourceFile,
    load_reporter,
};

use anyhow::Context;
use clap::Parser;
use output::{OutputMode, Summary};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

const DEFAULT_CONFIG_FILE: &str = "sniffer.toml";
const DEFAULT_REPORTERS: &[&str] = &["log", "fail"];

#[derive(Parser, Debug)]
#[clap(author, version, about = "Runs PHP_CodeSniffer over files and reports style problems", long_about = None)]
struct Cli {
    #[clap(short = 'c', long = "config", value_parser)]
    config_file: Option<PathBuf>,
    /// Checker executable (name on PATH or path)
    #[clap(long)]
    bin: Option<String>,
    #[clap(long)]
    standard: Option<String>,
    #[clap(long)]
    severity: Option<u32>,
    /// PHP_CodeSniffer report format, e.g. `summary` or `full`
    #[clap(long)]
    report: Option<String>,
    /// Checker processes to run at once
    #[clap(short, long)]
    jobs: Option<usize>,
    /// Reporter to run (`log`, `fail`, `file`); repeatable
    #[clap(long = "reporter")]
    reporters: Vec<String>,
    /// Target of the `file` reporter
    #[clap(long)]
    report_file: Option<PathBuf>,
    /// Let every file through and fail once at the end
    #[clap(long)]
    no_fail_on_first: bool,
    #[clap(long, value_enum, default_value_t = OutputMode::Human)]
    output: OutputMode,
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[clap(required = true)]
    paths: Vec<PathBuf>,
}

fn main() -> Result<ExitCode, anyhow::Error> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(cli.config_file.as_deref(), Path::new(DEFAULT_CONFIG_FILE))?;
    apply_overrides(&mut config, &cli);
    log::debug!("Effective configuration: {config:#?}");

    let checker = config
        .checker
        .validate()
        .context("Invalid [checker] configuration")?;

    let options = ReporterOptions::from(&config.reporters);
    let reporters = reporter_names(&cli.reporters, &config.reporters)
        .iter()
        .map(|name| load_reporter(name, &options))
        .collect::<Result<Vec<Box<dyn Reporter>>, _>>()?;

    let files = cli
        .paths
        .iter()
        .map(|path| read_source(path))
        .collect::<Result<Vec<_>, _>>()?;

    let resolver = Arc::new(ExecutableResolver::new());
    let stage = CheckStage::new(&checker, resolver);
    log::debug!(
        "Running {} {}",
        stage.command().executable,
        stage.command().arguments.join(" ")
    );

    let mut pipeline = Pipeline::new(stage)
        .with_reporters(reporters)
        .with_jobs(config.run.jobs);

    let checked = files.len();
    let result = pipeline.run(files);
    let summary = Summary::from_result(checked, &result);
    output::print_summary(&summary, cli.output)?;

    Ok(ExitCode::from(exit_status(&summary)))
}

/// Command-line flags win over the configuration file.
fn apply_overrides(config: &mut SnifferConfig, cli: &Cli) {
    if let Some(bin) = &cli.bin {
        config.checker.bin = Some(bin.clone());
    }
    if let Some(standard) = &cli.standard {
        config.checker.standard = Some(standard.clone());
    }
    if let Some(severity) = cli.severity {
        config.checker.severity = Some(NumericSetting::Integer(severity.into()));
    }
    if let Some(report) = &cli.report {
        config.checker.report = Some(report.clone());
    }
    if let Some(jobs) = cli.jobs {
        config.run.jobs = jobs;
    }
    if let Some(path) = &cli.report_file {
        config.reporters.path = Some(path.clone());
    }
    if cli.no_fail_on_first {
        config.reporters.fail_on_first = Some(false);
    }
}

fn reporter_names(requested: &[String], settings: &ReporterSettings) -> Vec<String> {
    if !requested.is_empty() {
        requested.to_vec()
    } else if let Some(names) = &settings.names {
        names.clone()
    } else {
        DEFAULT_REPORTERS.iter().map(|s| s.to_string()).collect()
    }
}

fn exit_status(summary: &Summary) -> u8 {
    if summary.is_success() { 0 } else { 1 }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config(explicit: Option<&Path>, fallback: &Path) -> Result<SnifferConfig, anyhow::Error> {
    match explicit {
        Some(config_path) => {
            log::info!("Loading configuration from specified path: {config_path:?}");
            Ok(SnifferConfig::load_from_file(config_path)?)
        }
        None if fallback.exists() => {
            log::info!("Loading default configuration: {fallback:?}");
            Ok(SnifferConfig::load_from_file(fallback)?)
        }
        None => {
            log::debug!("No {} found, using built-in defaults", fallback.display());
            Ok(SnifferConfig::default())
        }
    }
}

/// Directories become contentless placeholders; regular files are read whole.
fn read_source(path: &Path) -> Result<SourceFile, anyhow::Error> {
    let display = path.to_string_lossy().into_owned();
    let metadata =
        std::fs::metadata(path).with_context(|| format!("Cannot access {display}"))?;
    if metadata.is_dir() {
        return Ok(SourceFile::null(display));
    }
    let contents = std::fs::read(path).with_context(|| format!("Failed to read {display}"))?;
    Ok(SourceFile::new(display, contents))
}
