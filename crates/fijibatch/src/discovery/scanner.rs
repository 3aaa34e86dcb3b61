use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::config::{FileConfig, ProcessingOptions};
use crate::discovery::document::DocumentRecord;

/// Walks a directory tree and matches files against keyword, extension and
/// secondary-filter rules, associating a ROI file with each hit.
pub struct DocumentScanner {
    file_config: FileConfig,
}

impl DocumentScanner {
    pub fn new(file_config: FileConfig) -> Self {
        Self { file_config }
    }

    /// Finds documents whose filename contains any of the given keywords.
    ///
    /// Keywords must already be normalized (see
    /// [`normalize_keywords`](crate::discovery::normalize_keywords)). The
    /// first keyword that matches, in caller-supplied order, is recorded.
    /// When a secondary filter is configured the filename must also contain
    /// it; files failing that check are skipped entirely.
    pub fn find<P: AsRef<Path>>(
        &self,
        base_path: P,
        keywords: &[String],
        options: &ProcessingOptions,
    ) -> Vec<DocumentRecord> {
        let base_path = base_path.as_ref();
        let keyword_pairs: Vec<(String, String)> = keywords
            .iter()
            .map(|kw| (kw.clone(), kw.to_lowercase()))
            .collect();
        let secondary_filter = options
            .secondary_filter
            .as_deref()
            .map(|f| f.to_lowercase());
        let roi_templates: &[String] = options
            .roi_templates
            .as_deref()
            .unwrap_or(&self.file_config.roi_templates);

        let mut documents = Vec::new();

        for entry in WalkDir::new(base_path)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !self.file_config.is_supported_extension(ext) {
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let file_lower = file_name.to_lowercase();

            let Some(matched_keyword) = keyword_pairs
                .iter()
                .find(|(_, lowered)| file_lower.contains(lowered.as_str()))
                .map(|(original, _)| original.clone())
            else {
                continue;
            };

            // The secondary filter is a hard requirement, not advisory.
            if let Some(filter) = &secondary_filter {
                if !file_lower.contains(filter.as_str()) {
                    continue;
                }
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(file_name)
                .to_string();

            let roi_path = associate_roi(path, &stem, roi_templates);

            let secondary_key = options
                .secondary_filter
                .as_deref()
                .filter(|filter| stem.to_lowercase().contains(&filter.to_lowercase()))
                .map(String::from);

            debug!("Found document: {}", path.display());
            documents.push(DocumentRecord {
                file_path: path.to_path_buf(),
                stem,
                keywords: keywords.to_vec(),
                matched_keyword,
                secondary_key,
                roi_path,
                measurements: None,
            });
        }

        info!(
            "Matched {} documents under {}",
            documents.len(),
            base_path.display()
        );
        documents
    }
}

/// Probes ROI filename templates next to the matched file, in order; the
/// first candidate that exists wins. A template without a `{name}` token is
/// treated as a literal filename.
fn associate_roi(file_path: &Path, stem: &str, templates: &[String]) -> Option<PathBuf> {
    let dir = file_path.parent()?;

    for template in templates {
        let candidate = dir.join(template.replace("{name}", stem));
        if candidate.exists() {
            debug!(
                "Associated ROI {} with {}",
                candidate.display(),
                file_path.display()
            );
            return Some(candidate);
        }
    }

    None
}
