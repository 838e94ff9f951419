use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{MAIN_SEPARATOR, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors that can occur while resolving the checker executable.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Nothing matched the requested token, neither on `PATH` nor on disk.
    #[error("Cannot find \"{executable}\" executable")]
    NotFound { executable: String },

    /// The lookup itself failed (e.g. the current directory is gone).
    /// Not cached; the next attempt looks again.
    #[error("Failed to resolve \"{executable}\": {source}")]
    Lookup {
        executable: String,
        #[source]
        source: std::io::Error,
    },
}

/// Backend that performs the actual filesystem / `PATH` search.
pub trait ExecutableLookup: Send + Sync {
    /// Returns `Ok(None)` when the executable genuinely does not exist.
    fn lookup(&self, executable: &str) -> Result<Option<PathBuf>, std::io::Error>;
}

/// `PATH` search backed by the `which` crate.
///
/// Tokens containing a path separator are checked relative to the current
/// directory, bare names are searched for on `PATH`.
#[derive(Debug, Default, Clone)]
pub struct PathLookup {
    search_path: Option<OsString>,
}

impl PathLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches `search_path` (same format as `PATH`) instead of the
    /// process environment.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl ExecutableLookup for PathLookup {
    fn lookup(&self, executable: &str) -> Result<Option<PathBuf>, std::io::Error> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir()?;
                which::which_in(executable, Some(paths), cwd)
            }
            None => which::which(executable),
        };

        match found {
            Ok(path) => Ok(Some(path)),
            Err(
                which::Error::CannotFindBinaryPath
                | which::Error::BadAbsolutePath
                | which::Error::BadRelativePath,
            ) => Ok(None),
            Err(other) => Err(std::io::Error::other(other)),
        }
    }
}

/// Resolves executable tokens to absolute paths, once per distinct token.
///
/// Successful and "not found" results are cached for the lifetime of the
/// resolver. Share one instance (behind an `Arc`) between every stage of a
/// process so the search happens only once.
pub struct ExecutableResolver {
    lookup: Box<dyn ExecutableLookup>,
    cache: Mutex<HashMap<String, Option<PathBuf>>>,
}

impl ExecutableResolver {
    pub fn new() -> Self {
        Self::with_lookup(PathLookup::new())
    }

    pub fn with_lookup(lookup: impl ExecutableLookup + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, executable: &str) -> Result<PathBuf, ResolveError> {
        // Held across the lookup so concurrent callers never search twice.
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        let resolved = match cache.get(executable) {
            Some(cached) => {
                log::trace!("Resolution cache hit for '{executable}'");
                cached.clone()
            }
            None => {
                let normalized = normalize_separators(executable);
                let found = self
                    .lookup
                    .lookup(&normalized)
                    .map_err(|source| ResolveError::Lookup {
                        executable: executable.to_string(),
                        source,
                    })?;
                match &found {
                    Some(path) => log::debug!("Resolved '{executable}' to {}", path.display()),
                    None => log::debug!("'{executable}' not found"),
                }
                cache.insert(executable.to_string(), found.clone());
                found
            }
        };

        resolved.ok_or_else(|| ResolveError::NotFound {
            executable: executable.to_string(),
        })
    }

    pub fn cached_entries(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for ExecutableResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrites both `/` and `\` to the host separator.
pub fn normalize_separators(executable: &str) -> String {
    executable
        .chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect()
}
