use std::path::PathBuf;

use indexmap::IndexMap;

/// One matched input file plus its ROI association and eventual measurement
/// outcome. Ephemeral: lives only for the duration of a run.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Absolute path of the matched file.
    pub file_path: PathBuf,
    /// Filename without extension.
    pub stem: String,
    /// All keywords searched for in this run.
    pub keywords: Vec<String>,
    /// The first caller-supplied keyword that matched the filename.
    pub matched_keyword: String,
    /// Secondary-filter token confirmed present in the filename stem.
    pub secondary_key: Option<String>,
    /// First ROI template candidate that resolved to an existing file.
    pub roi_path: Option<PathBuf>,
    /// Measurement payload attached after successful processing.
    pub measurements: Option<IndexMap<String, String>>,
}

impl DocumentRecord {
    /// File extension in lowercase, without the leading dot.
    pub fn extension(&self) -> String {
        self.file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }
}
