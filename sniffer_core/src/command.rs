use crate::config::CheckerConfig;

/// Tells PHP_CodeSniffer to read the file content from standard input.
pub const STDIN_MARKER: &str = "-";

/// The executable token plus its ordered argument list.
///
/// `executable` is the raw token from the configuration; it is resolved to an
/// absolute path by [`crate::resolver::ExecutableResolver`] before spawning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub executable: String,
    pub arguments: Vec<String>,
}

/// Builds the command line for `config`.
///
/// Pure: no filesystem access, no process spawning. The argument order is
/// fixed so that invocations are reproducible.
pub fn build_command(config: &CheckerConfig) -> ResolvedCommand {
    let mut arguments = Vec::new();

    if let Some(standard) = &config.standard {
        arguments.push(format!("--standard={standard}"));
    }
    if let Some(severity) = config.severity {
        arguments.push(format!("--severity={severity}"));
    }
    if let Some(severity) = config.warning_severity {
        arguments.push(format!("--warning-severity={severity}"));
    }
    if let Some(severity) = config.error_severity {
        arguments.push(format!("--error-severity={severity}"));
    }
    if let Some(encoding) = &config.encoding {
        arguments.push(format!("--encoding={encoding}"));
    }
    if let Some(report) = &config.report_format {
        arguments.push(format!("--report={report}"));
    }
    if config.show_sniff_codes {
        arguments.push("-s".to_string());
    }
    arguments.extend(list_argument("--sniffs", config.sniff_whitelist.as_deref()));
    arguments.extend(list_argument("--exclude", config.exclude_list.as_deref()));
    arguments.extend(list_argument("--ignore", config.ignore_list.as_deref()));
    if config.use_color_output {
        arguments.push("--colors".to_string());
    }

    arguments.push(STDIN_MARKER.to_string());

    ResolvedCommand {
        executable: config.executable_path.clone(),
        arguments,
    }
}

fn list_argument(flag: &str, items: Option<&[String]>) -> Option<String> {
    match items {
        Some(items) if !items.is_empty() => Some(format!("{flag}={}", items.join(","))),
        _ => None,
    }
}
