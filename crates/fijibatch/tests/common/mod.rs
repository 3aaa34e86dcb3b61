//! Shared test utilities for fijibatch integration tests.
//!
//! Provides a `TestHarness` with an isolated data directory and a stub
//! executable standing in for the external tool. The default stub mimics the
//! behavior the pipeline relies on: it honors `saveAs("Measurements", ...)`
//! statements by writing a small result table and prints one inline
//! measurement line.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use fijibatch::{BatchRunner, FileConfig, MacroDefaults, ToolGateway};

/// Stub body that extracts the measurement export path from the macro file
/// and writes a plausible result table there.
pub const MEASURING_STUB: &str = r#"macro="$2"
csv=$(sed -n 's/.*saveAs("Measurements", "\(.*\)");.*/\1/p' "$macro" | head -n 1)
if [ -n "$csv" ]; then
    printf ' ,Area,Mean\n1,42.5,7.1\n' > "$csv"
fi
echo "MEASURE:area=42.5"
exit 0"#;

pub struct TestHarness {
    temp: TempDir,
    pub data_dir: PathBuf,
    pub tool_path: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_stub(MEASURING_STUB)
    }

    /// Builds a harness whose stub tool runs the given shell body. The stub
    /// is invoked as `<stub> -macro <macro-file>`.
    pub fn with_stub(body: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();

        let tool_path = temp.path().join("fiji-stub");
        std::fs::write(&tool_path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tool_path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        Self {
            temp,
            data_dir,
            tool_path,
        }
    }

    /// Root of the harness temp directory (the stub executable lives here).
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn create_document(&self, name: &str) -> PathBuf {
        self.create_file(name, "II*\0FAKE_IMAGE_DATA")
    }

    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.data_dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn runner(&self) -> BatchRunner {
        self.runner_with_timeout(Duration::from_secs(30))
    }

    pub fn runner_with_timeout(&self, timeout: Duration) -> BatchRunner {
        let gateway = ToolGateway::new(&self.tool_path, timeout).unwrap();
        BatchRunner::new(gateway, FileConfig::default(), MacroDefaults::default())
    }

    /// Files in `<data>/<folder>` whose name starts with `prefix`.
    pub fn files_with_prefix(&self, folder: &str, prefix: &str) -> Vec<PathBuf> {
        let dir = self.data_dir.join(folder);
        if !dir.exists() {
            return Vec::new();
        }
        let mut found: Vec<PathBuf> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix))
            })
            .collect();
        found.sort();
        found
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn read_to_string(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
