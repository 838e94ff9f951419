#![allow(dead_code)]

use sniffer_core::{CheckStage, CheckerConfig, ExecutableResolver, PathLookup};
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

/// Fake checkers. Each mimics one PHP_CodeSniffer outcome.
const FIXTURES: &[(&str, &str)] = &[
    ("zero", "#!/bin/sh\ncat > /dev/null\nexit 0\n"),
    ("style_error", "#!/bin/sh\ncat\nexit 1\n"),
    ("fixable_style_error", "#!/bin/sh\ncat\nexit 2\n"),
    (
        "error",
        "#!/bin/sh\ncat > /dev/null\necho \"This is a test error.\"\nexit 3\n",
    ),
    ("args", "#!/bin/sh\ncat > /dev/null\necho \"$@\"\nexit 1\n"),
    ("broken_interpreter", "#!/nonexistent/interpreter/sh\nexit 0\n"),
];

pub struct Fixtures {
    dir: PathBuf,
}

// Written once, before any test spawns a child, so no fixture is ever
// executed while another thread still holds it open for writing.
static INSTALLED: LazyLock<Fixtures> = LazyLock::new(|| {
    let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("sniffer-fixtures");
    std::fs::create_dir_all(&dir).expect("create fixture dir");
    for (name, body) in FIXTURES {
        let path = dir.join(name);
        std::fs::write(&path, body).expect("write fixture");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fixture");
    }
    Fixtures { dir }
});

pub fn fixtures() -> &'static Fixtures {
    &INSTALLED
}

impl Fixtures {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn absolute(&self, name: &str) -> String {
        self.dir.join(name).to_string_lossy().into_owned()
    }

    /// `name` as a path relative to the working directory, `/`-separated,
    /// without a leading `./`.
    pub fn relative(&self, name: &str) -> String {
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        let target = self.dir.join(name).canonicalize().unwrap();

        let common = cwd
            .components()
            .zip(target.components())
            .take_while(|(a, b)| a == b)
            .count();
        let mut parts: Vec<String> = cwd
            .components()
            .skip(common)
            .map(|_| "..".to_string())
            .collect();
        parts.extend(target.components().skip(common).filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        }));
        parts.join("/")
    }

    /// A resolver that searches only the fixture directory for bare names.
    pub fn resolver(&self) -> Arc<ExecutableResolver> {
        Arc::new(ExecutableResolver::with_lookup(PathLookup::with_search_path(
            self.dir.as_os_str(),
        )))
    }

    pub fn stage(&self, config: &CheckerConfig) -> CheckStage {
        CheckStage::new(config, self.resolver())
    }

    pub fn stage_for(&self, name: &str) -> CheckStage {
        self.stage(&CheckerConfig::with_executable(self.absolute(name)))
    }
}
