use serde::Serialize;
use std::fmt;
use std::io::Read;

/// The verdict attached to a [`SourceFile`] once the checker has run on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// `true` when the checker found style violations.
    pub failed: bool,
    /// Raw checker stdout. Empty for clean files.
    pub output: String,
}

impl CheckReport {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn violations(output: String) -> Self {
        Self {
            failed: true,
            output,
        }
    }
}

/// Content carried by a [`SourceFile`].
pub enum Contents {
    /// No content at all, e.g. a directory placeholder.
    Null,
    Buffer(Vec<u8>),
    /// A live reader. The checker stage rejects this shape.
    Stream(Box<dyn Read + Send>),
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contents::Null => f.write_str("Null"),
            Contents::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Contents::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// One unit of content flowing through the pipeline.
///
/// `path` is a logical identifier and does not have to exist on disk. The
/// checker stage never touches `path` or `contents`; it only fills in `report`.
#[derive(Debug)]
pub struct SourceFile {
    pub path: String,
    pub contents: Contents,
    pub report: Option<CheckReport>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: Contents::Buffer(contents.into()),
            report: None,
        }
    }

    pub fn null(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: Contents::Null,
            report: None,
        }
    }

    pub fn streamed(path: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self {
            path: path.into(),
            contents: Contents::Stream(Box::new(reader)),
            report: None,
        }
    }

    pub fn with_report(mut self, report: CheckReport) -> Self {
        self.report = Some(report);
        self
    }

    pub fn is_null(&self) -> bool {
        matches!(self.contents, Contents::Null)
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.contents, Contents::Stream(_))
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.contents {
            Contents::Buffer(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    /// Whether a report is attached and says the checker found problems.
    pub fn has_failed(&self) -> bool {
        self.report.as_ref().is_some_and(|r| r.failed)
    }
}
