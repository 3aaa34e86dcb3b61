use std::path::PathBuf;

use serde::Serialize;

use crate::summary::MeasurementEntry;

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    pub filename: String,
    pub matched_keyword: String,
    pub secondary_key: Option<String>,
    pub source_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDocument {
    pub filename: String,
    pub matched_keyword: String,
    pub secondary_key: Option<String>,
    pub error: String,
}

/// Aggregate outcome of one batch run. Built incrementally while documents
/// are processed; `success` is finalized once the whole batch completes.
#[derive(Debug, Serialize)]
pub struct RunResult {
    pub run_id: String,
    pub success: bool,
    /// Run-level error, set when discovery matched nothing.
    pub error: Option<String>,
    pub processed_documents: Vec<ProcessedDocument>,
    pub failed_documents: Vec<FailedDocument>,
    pub measurements: Vec<MeasurementEntry>,
    pub searched_keywords: Vec<String>,
    /// Consolidated summary artifact, when one was written.
    pub summary_path: Option<PathBuf>,
}

impl RunResult {
    pub(crate) fn new(searched_keywords: Vec<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            success: false,
            error: None,
            processed_documents: Vec::new(),
            failed_documents: Vec::new(),
            measurements: Vec::new(),
            searched_keywords,
            summary_path: None,
        }
    }

    /// success holds exactly when no document failed.
    pub(crate) fn finalize(&mut self) {
        self.success = self.failed_documents.is_empty();
    }
}
