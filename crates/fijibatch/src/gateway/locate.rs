use std::path::{Path, PathBuf};

use log::debug;

/// Platform-specific candidate locations for the Fiji executable, probed in
/// order.
pub fn candidate_paths() -> Vec<PathBuf> {
    let home = dirs::home_dir();
    let under_home = |tail: &str| home.as_ref().map(|h| h.join(tail));

    let mut candidates: Vec<Option<PathBuf>> = Vec::new();

    if cfg!(target_os = "macos") {
        candidates.push(Some(PathBuf::from(
            "/Applications/Fiji.app/Contents/MacOS/ImageJ-macosx",
        )));
        candidates.push(under_home("Applications/Fiji.app/Contents/MacOS/ImageJ-macosx"));
        candidates.push(under_home("Downloads/Fiji.app/Contents/MacOS/ImageJ-macosx"));
        candidates.push(under_home("Desktop/Fiji.app/Contents/MacOS/ImageJ-macosx"));
    } else if cfg!(target_os = "windows") {
        candidates.push(Some(PathBuf::from(r"C:\Program Files\Fiji\ImageJ-win64.exe")));
        candidates.push(Some(PathBuf::from(
            r"C:\Program Files (x86)\Fiji\ImageJ-win64.exe",
        )));
        candidates.push(under_home(r"Fiji\ImageJ-win64.exe"));
        candidates.push(under_home(r"Desktop\Fiji\ImageJ-win64.exe"));
        candidates.push(under_home(r"Downloads\Fiji\ImageJ-win64.exe"));
    } else {
        candidates.push(Some(PathBuf::from("/opt/fiji/ImageJ-linux64")));
        candidates.push(Some(PathBuf::from("/usr/local/fiji/ImageJ-linux64")));
        candidates.push(under_home("fiji/ImageJ-linux64"));
        candidates.push(under_home("Fiji.app/ImageJ-linux64"));
        candidates.push(under_home("Desktop/fiji/ImageJ-linux64"));
    }

    candidates.into_iter().flatten().collect()
}

/// Probes the candidate locations and returns the first existing executable.
pub fn find_tool() -> Option<PathBuf> {
    for candidate in candidate_paths() {
        if validate_tool_path(&candidate) {
            debug!("Found tool executable at {}", candidate.display());
            return Some(candidate);
        }
    }
    None
}

/// An executable path is acceptable when it names an existing file.
pub fn validate_tool_path(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_candidate_paths_are_nonempty() {
        assert!(!candidate_paths().is_empty());
    }

    #[test]
    fn test_validate_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let exe = temp_dir.path().join("ImageJ-linux64");
        std::fs::write(&exe, b"#!/bin/sh\n").unwrap();

        assert!(validate_tool_path(&exe));
    }

    #[test]
    fn test_validate_rejects_missing_and_directories() {
        let temp_dir = TempDir::new().unwrap();

        assert!(!validate_tool_path(&temp_dir.path().join("missing")));
        assert!(!validate_tool_path(temp_dir.path()));
    }
}
