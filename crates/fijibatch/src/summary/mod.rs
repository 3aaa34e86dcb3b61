pub mod csv;

use std::path::{Path, PathBuf};

use chrono::Local;
use indexmap::{IndexMap, IndexSet};
use log::{info, warn};
use serde::Serialize;

use crate::error::StorageError;

/// One measured document, carried from the batch loop into aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementEntry {
    /// Document filename stem.
    pub filename: String,
    pub source_path: PathBuf,
    pub matched_keyword: String,
    pub secondary_key: Option<String>,
    /// Per-document measurement export written by the tool, when enabled.
    pub export_path: Option<PathBuf>,
    /// Inline measurements captured from tool output.
    pub values: IndexMap<String, String>,
}

/// The consolidated measurement export: metadata columns first, then the
/// union of all data columns in first-seen order.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryTable {
    pub columns: Vec<String>,
    pub rows: Vec<IndexMap<String, String>>,
}

impl SummaryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_csv(&self) -> String {
        let mut out = csv::format_row(&self.columns);
        out.push('\n');
        for row in &self.rows {
            let fields: Vec<&str> = self
                .columns
                .iter()
                .map(|col| row.get(col).map(String::as_str).unwrap_or(""))
                .collect();
            out.push_str(&csv::format_row(&fields));
            out.push('\n');
        }
        out
    }
}

const EXPORT_METADATA_COLUMNS: &[&str] = &[
    "filename",
    "source_csv",
    "source_path",
    "searched_keywords",
    "matched_keyword",
    "secondary_key",
];

const IN_MEMORY_METADATA_COLUMNS: &[&str] = &["filename", "matched_keyword", "secondary_key"];

/// Builds the summary table for one run.
///
/// When any per-document export file exists on disk those files are the
/// source of truth: each of their rows becomes one summary row, left-joined
/// with that document's metadata. Otherwise the in-memory measurement maps
/// collected from tool output are used. Unreadable export files are skipped,
/// never fatal.
pub fn aggregate(entries: &[MeasurementEntry], searched_keywords: &[String]) -> SummaryTable {
    let with_exports: Vec<&MeasurementEntry> = entries
        .iter()
        .filter(|e| e.export_path.as_deref().is_some_and(Path::exists))
        .collect();

    if !with_exports.is_empty() {
        aggregate_from_exports(&with_exports, searched_keywords)
    } else {
        aggregate_in_memory(entries)
    }
}

fn aggregate_from_exports(
    entries: &[&MeasurementEntry],
    searched_keywords: &[String],
) -> SummaryTable {
    let keywords_joined = searched_keywords.join(", ");

    let mut data_columns: IndexSet<String> = IndexSet::new();
    let mut tables: Vec<(&MeasurementEntry, Vec<String>, Vec<Vec<String>>)> = Vec::new();

    for entry in entries {
        let Some(export_path) = entry.export_path.as_deref() else {
            continue;
        };
        match csv::read_table(export_path) {
            Ok(Some((header, rows))) => {
                for column in &header {
                    data_columns.insert(column.clone());
                }
                tables.push((entry, header, rows));
            }
            Ok(None) => {
                warn!("Skipping empty export {}", export_path.display());
            }
            Err(e) => {
                warn!("Skipping unreadable export {}: {}", export_path.display(), e);
            }
        }
    }

    let mut columns: Vec<String> = EXPORT_METADATA_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .collect();
    columns.extend(data_columns.iter().cloned());

    let mut summary_rows = Vec::new();
    for (entry, header, rows) in tables {
        let source_csv = entry
            .export_path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for row in rows {
            let mut summary_row: IndexMap<String, String> = IndexMap::new();
            summary_row.insert("filename".to_string(), entry.filename.clone());
            summary_row.insert("source_csv".to_string(), source_csv.clone());
            summary_row.insert(
                "source_path".to_string(),
                entry.source_path.display().to_string(),
            );
            summary_row.insert("searched_keywords".to_string(), keywords_joined.clone());
            summary_row.insert(
                "matched_keyword".to_string(),
                entry.matched_keyword.clone(),
            );
            summary_row.insert(
                "secondary_key".to_string(),
                entry.secondary_key.clone().unwrap_or_default(),
            );
            for (column, value) in header.iter().zip(row) {
                summary_row.insert(column.clone(), value);
            }
            summary_rows.push(summary_row);
        }
    }

    SummaryTable {
        columns,
        rows: summary_rows,
    }
}

fn aggregate_in_memory(entries: &[MeasurementEntry]) -> SummaryTable {
    let mut data_columns: IndexSet<String> = IndexSet::new();
    for entry in entries {
        for key in entry.values.keys() {
            data_columns.insert(key.clone());
        }
    }

    let mut columns: Vec<String> = IN_MEMORY_METADATA_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .collect();
    columns.extend(data_columns.iter().cloned());

    let rows = entries
        .iter()
        .filter(|entry| !entry.values.is_empty())
        .map(|entry| {
            let mut row: IndexMap<String, String> = IndexMap::new();
            row.insert("filename".to_string(), entry.filename.clone());
            row.insert("matched_keyword".to_string(), entry.matched_keyword.clone());
            row.insert(
                "secondary_key".to_string(),
                entry.secondary_key.clone().unwrap_or_default(),
            );
            for (key, value) in &entry.values {
                row.insert(key.clone(), value.clone());
            }
            row
        })
        .collect();

    SummaryTable { columns, rows }
}

/// Writes the summary as CSV plus a JSON twin, both stamped with the run
/// time so repeated runs in the same directory never overwrite each other.
/// An empty table writes nothing and returns `None`.
pub fn persist(
    table: &SummaryTable,
    directory: &Path,
    prefix: &str,
) -> Result<Option<PathBuf>, StorageError> {
    if table.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(directory).map_err(|e| StorageError::CreateDirectory {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let prefix = if prefix.is_empty() {
        "measurements_summary"
    } else {
        prefix
    };
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    let csv_path = directory.join(format!("{}_{}.csv", prefix, timestamp));
    std::fs::write(&csv_path, table.to_csv()).map_err(|e| StorageError::WriteFile {
        path: csv_path.clone(),
        source: e,
    })?;

    let json_path = directory.join(format!("{}_{}.json", prefix, timestamp));
    let json = serde_json::to_string_pretty(&table.rows).unwrap_or_else(|_| "[]".to_string());
    std::fs::write(&json_path, json).map_err(|e| StorageError::WriteFile {
        path: json_path.clone(),
        source: e,
    })?;

    info!("Summary written to {}", csv_path.display());
    Ok(Some(csv_path))
}
