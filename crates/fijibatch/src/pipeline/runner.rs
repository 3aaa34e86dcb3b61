use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, info_span, warn};

use crate::cancel::CancellationToken;
use crate::config::{FileConfig, MacroDefaults, PlaceholderEngine, ProcessingOptions};
use crate::discovery::{format_keywords, normalize_keywords, DocumentRecord, DocumentScanner};
use crate::error::{Result, StorageError};
use crate::gateway::ToolGateway;
use crate::macros::{
    parse_command_sequence, to_tool_path, ImageContext, MacroBuilder, MacroCommand,
};
use crate::summary::{self, MeasurementEntry};

use super::error::PipelineError;
use super::result::{FailedDocument, ProcessedDocument, RunResult};

/// How the macro for each document is obtained.
#[derive(Debug, Clone)]
pub enum MacroSpec {
    /// open → measure → optional saves → quit, per the run options.
    Default,
    /// Fully specified command list.
    Commands(Vec<MacroCommand>),
    /// Whitespace-separated `name key=value` sequence.
    CommandString(String),
    /// Raw command names or macro statements, each passed through without
    /// parameters.
    Names(Vec<String>),
    /// Free-form macro template resolved against the full document context.
    Template(String),
    /// The canonical open, duplicate, filter, enhance, save pipeline.
    StandardProcessing,
    /// Invert each document's associated ROI and save it alongside the
    /// original.
    RoiInversion,
}

/// Sequentially processes every discovered document through the external
/// tool and consolidates the collected measurements.
pub struct BatchRunner {
    file_config: FileConfig,
    builder: MacroBuilder,
    gateway: ToolGateway,
}

struct DocumentOutcome {
    measurements: IndexMap<String, String>,
    export_path: Option<PathBuf>,
}

impl BatchRunner {
    pub fn new(gateway: ToolGateway, file_config: FileConfig, defaults: MacroDefaults) -> Self {
        Self {
            file_config,
            builder: MacroBuilder::new(defaults),
            gateway,
        }
    }

    /// Runs one batch. Only input validation fails the call itself; every
    /// per-document problem is recorded in the result instead.
    pub fn run<S: AsRef<str>>(
        &self,
        base_path: &Path,
        keyword_input: &[S],
        macro_spec: &MacroSpec,
        options: &ProcessingOptions,
        cancel: &CancellationToken,
    ) -> Result<RunResult> {
        let keywords = normalize_keywords(keyword_input)?;
        let mut result = RunResult::new(keywords.clone());

        let _run_span = info_span!("batch", run_id = %result.run_id).entered();

        let scanner = DocumentScanner::new(self.file_config.clone());
        let documents = scanner.find(base_path, &keywords, options);

        if documents.is_empty() {
            result.error = Some(format!(
                "No documents found with keyword(s): {}",
                format_keywords(&keywords)
            ));
            return Ok(result);
        }

        info!(
            "Processing {} documents matching keyword(s): {}",
            documents.len(),
            format_keywords(&keywords)
        );

        let placeholder_engine = PlaceholderEngine::new(&options.placeholders);

        for mut doc in documents {
            if cancel.is_cancelled() {
                info!("Cancellation requested; stopping before {}", doc.stem);
                break;
            }

            let _doc_span = info_span!("document", filename = %doc.stem).entered();

            match self.process_document(
                &doc,
                macro_spec,
                options,
                &placeholder_engine,
                base_path,
                cancel,
            ) {
                Ok(outcome) => {
                    doc.measurements = Some(outcome.measurements.clone());
                    result.processed_documents.push(ProcessedDocument {
                        filename: doc.stem.clone(),
                        matched_keyword: doc.matched_keyword.clone(),
                        secondary_key: doc.secondary_key.clone(),
                        source_path: doc.file_path.clone(),
                    });
                    if !outcome.measurements.is_empty() || outcome.export_path.is_some() {
                        result.measurements.push(MeasurementEntry {
                            filename: doc.stem.clone(),
                            source_path: doc.file_path.clone(),
                            matched_keyword: doc.matched_keyword.clone(),
                            secondary_key: doc.secondary_key.clone(),
                            export_path: outcome.export_path,
                            values: outcome.measurements,
                        });
                    }
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", doc.stem, e);
                    result.failed_documents.push(FailedDocument {
                        filename: doc.stem.clone(),
                        matched_keyword: doc.matched_keyword.clone(),
                        secondary_key: doc.secondary_key.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if options.generate_summary && !result.measurements.is_empty() {
            let table = summary::aggregate(&result.measurements, &result.searched_keywords);
            let measurements_dir = base_path.join(&options.measurements_folder);
            match summary::persist(&table, &measurements_dir, &options.summary_prefix) {
                Ok(path) => result.summary_path = path,
                Err(e) => warn!("Failed to write measurement summary: {}", e),
            }
        }

        result.finalize();
        Ok(result)
    }

    fn process_document(
        &self,
        doc: &DocumentRecord,
        macro_spec: &MacroSpec,
        options: &ProcessingOptions,
        placeholder_engine: &PlaceholderEngine,
        base_path: &Path,
        cancel: &CancellationToken,
    ) -> std::result::Result<DocumentOutcome, PipelineError> {
        let needs_importer = self.file_config.needs_importer(&doc.extension());

        let (macro_text, export_path) = match macro_spec {
            MacroSpec::Template(template) => {
                self.render_custom_template(doc, template, options, placeholder_engine, base_path)?
            }
            _ => {
                let mut commands = match macro_spec {
                    MacroSpec::Default => default_command_list(options, needs_importer),
                    MacroSpec::Commands(commands) => commands.clone(),
                    MacroSpec::CommandString(input) => parse_command_sequence(input),
                    MacroSpec::Names(names) => {
                        names.iter().map(|n| MacroCommand::new(n.clone())).collect()
                    }
                    MacroSpec::StandardProcessing => {
                        self.builder.standard_processing_commands(needs_importer)
                    }
                    MacroSpec::RoiInversion => {
                        let Some(roi_path) = &doc.roi_path else {
                            return Err(PipelineError::MissingRoi);
                        };
                        self.builder
                            .roi_inversion_commands(needs_importer, &[to_tool_path(roi_path)])
                    }
                    MacroSpec::Template(_) => unreachable!("handled above"),
                };
                ensure_batch_and_quit(&mut commands);

                // Output paths are derived lazily: a caller-supplied save
                // command forces them even when the corresponding option
                // flag is off.
                let needs_output = options.save_processed_files
                    || commands.iter().any(|c| c.name == "save_tiff");
                let needs_export = options.save_measurements_csv
                    || commands.iter().any(|c| c.name == "save_csv");

                let output_path = if needs_output {
                    Some(self.derive_output_path(doc, options, base_path, "tif")?)
                } else {
                    None
                };
                let export_path = if needs_export {
                    Some(self.derive_export_path(doc, options, base_path)?)
                } else {
                    None
                };

                let macro_text = self.builder.build_from_commands(&commands)?;
                let macro_text = substitute_paths(
                    &macro_text,
                    &doc.file_path,
                    output_path.as_deref(),
                    export_path.as_deref(),
                );
                (macro_text, export_path)
            }
        };

        debug!("Generated macro:\n{}", macro_text);

        let output = self.gateway.run_macro(&macro_text, cancel)?;
        if !output.success() {
            let detail = if output.stderr.trim().is_empty() {
                String::new()
            } else {
                format!(": {}", output.stderr.trim())
            };
            return Err(PipelineError::ToolFailure {
                code: output
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                detail,
            });
        }

        Ok(DocumentOutcome {
            measurements: output.measurements,
            export_path,
        })
    }

    /// Custom templates get the full substitution context: path pairs,
    /// directories, ROI lists and user-defined placeholders.
    fn render_custom_template(
        &self,
        doc: &DocumentRecord,
        template: &str,
        options: &ProcessingOptions,
        placeholder_engine: &PlaceholderEngine,
        base_path: &Path,
    ) -> std::result::Result<(String, Option<PathBuf>), PipelineError> {
        let mut ctx = ImageContext::new(&doc.file_path);

        if options.save_processed_files {
            let output_path = self.derive_output_path(doc, options, base_path, "tif")?;
            ctx = ctx.with_output_path(&output_path);
        }

        let export_path = if options.save_measurements_csv {
            let export_path = self.derive_export_path(doc, options, base_path)?;
            ctx = ctx.with_measurements_path(&export_path);
            Some(export_path)
        } else {
            None
        };

        if options.apply_roi {
            if let Some(roi_path) = &doc.roi_path {
                ctx = ctx.with_roi_paths(std::slice::from_ref(roi_path));
            }
        }

        if !placeholder_engine.is_empty() {
            ctx = ctx.with_custom(placeholder_engine.extract(&doc.stem));
        }

        let mut macro_text = self.builder.render_template(template, &ctx)?;
        ensure_batch_and_quit_text(&mut macro_text);
        Ok((macro_text, export_path))
    }

    fn derive_output_path(
        &self,
        doc: &DocumentRecord,
        options: &ProcessingOptions,
        base_dir: &Path,
        extension: &str,
    ) -> std::result::Result<PathBuf, StorageError> {
        let dir = base_dir.join(&options.processed_folder);
        ensure_directory(&dir)?;
        Ok(dir.join(format!(
            "{}_{}.{}",
            doc.stem, options.custom_suffix, extension
        )))
    }

    fn derive_export_path(
        &self,
        doc: &DocumentRecord,
        options: &ProcessingOptions,
        base_dir: &Path,
    ) -> std::result::Result<PathBuf, StorageError> {
        let dir = base_dir.join(&options.measurements_folder);
        ensure_directory(&dir)?;
        Ok(dir.join(format!("{}_{}.csv", doc.stem, options.custom_suffix)))
    }
}

/// The default pipeline: open, measure, save whatever the options ask for,
/// quit.
fn default_command_list(options: &ProcessingOptions, needs_importer: bool) -> Vec<MacroCommand> {
    let open = if needs_importer {
        "open_bioformats"
    } else {
        "open_standard"
    };

    let mut commands = vec![MacroCommand::new(open), MacroCommand::new("measure")];
    if options.save_processed_files {
        commands.push(MacroCommand::new("save_tiff"));
    }
    if options.save_measurements_csv {
        commands.push(MacroCommand::new("save_csv"));
    }
    commands.push(MacroCommand::new("quit"));
    commands
}

/// Directory creation is idempotent and safe to repeat per document.
fn ensure_directory(path: &Path) -> std::result::Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Guarantees the batch-mode prelude and the quit epilogue, without ever
/// duplicating either.
fn ensure_batch_and_quit(commands: &mut Vec<MacroCommand>) {
    if !commands.iter().any(|c| c.name == "quit") {
        commands.push(MacroCommand::new("quit"));
    }
    if !commands.iter().any(|c| c.name == "batch_mode") {
        commands.insert(0, MacroCommand::new("batch_mode"));
    }
}

/// Text-level variant for free-form templates.
fn ensure_batch_and_quit_text(macro_text: &mut String) {
    if !macro_text.contains("run(\"Quit\")") {
        if !macro_text.ends_with('\n') && !macro_text.is_empty() {
            macro_text.push('\n');
        }
        macro_text.push_str("run(\"Quit\");");
    }
    if !macro_text.contains("setBatchMode(") {
        *macro_text = format!("setBatchMode(true);\n{}", macro_text);
    }
}

/// The minimal backward-compatible substitution pass used for command-list
/// macros: only the three path placeholders, blank when a path was not
/// derived. Custom templates use the full context instead.
fn substitute_paths(
    macro_text: &str,
    input_path: &Path,
    output_path: Option<&Path>,
    export_path: Option<&Path>,
) -> String {
    let output = output_path.map(to_tool_path).unwrap_or_default();
    let export = export_path.map(to_tool_path).unwrap_or_default();

    macro_text
        .replace("{input_path}", &to_tool_path(input_path))
        .replace("{output_path}", &output)
        .replace("{measurements_path}", &export)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_list_with_measurements_only() {
        let options = ProcessingOptions {
            save_measurements_csv: true,
            ..Default::default()
        };

        let mut commands = default_command_list(&options, false);
        ensure_batch_and_quit(&mut commands);

        let names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["batch_mode", "open_standard", "measure", "save_csv", "quit"]
        );
    }

    #[test]
    fn test_default_command_list_uses_importer_for_bioformats() {
        let commands = default_command_list(&ProcessingOptions::default(), true);
        assert_eq!(commands[0].name, "open_bioformats");
    }

    #[test]
    fn test_default_command_list_with_all_saves() {
        let options = ProcessingOptions {
            save_processed_files: true,
            save_measurements_csv: true,
            ..Default::default()
        };

        let commands = default_command_list(&options, false);
        let names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["open_standard", "measure", "save_tiff", "save_csv", "quit"]
        );
    }

    #[test]
    fn test_ensure_batch_and_quit_appends_both() {
        let mut commands = vec![MacroCommand::new("open_standard")];
        ensure_batch_and_quit(&mut commands);

        assert_eq!(commands[0].name, "batch_mode");
        assert_eq!(commands.last().unwrap().name, "quit");
    }

    #[test]
    fn test_ensure_batch_and_quit_is_idempotent() {
        let mut commands = vec![
            MacroCommand::new("batch_mode"),
            MacroCommand::new("open_standard"),
            MacroCommand::new("quit"),
        ];
        ensure_batch_and_quit(&mut commands);

        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands.iter().filter(|c| c.name == "quit").count(),
            1
        );
        assert_eq!(
            commands.iter().filter(|c| c.name == "batch_mode").count(),
            1
        );
    }

    #[test]
    fn test_ensure_batch_and_quit_text() {
        let mut text = "open(\"/data/x.tif\");".to_string();
        ensure_batch_and_quit_text(&mut text);

        assert!(text.starts_with("setBatchMode(true);\n"));
        assert!(text.ends_with("run(\"Quit\");"));

        let before = text.clone();
        ensure_batch_and_quit_text(&mut text);
        assert_eq!(text, before);
    }

    #[test]
    fn test_substitute_paths_fills_all_three() {
        let macro_text = "open(\"{input_path}\");\nsaveAs(\"Tiff\", \"{output_path}\");\nsaveAs(\"Measurements\", \"{measurements_path}\");";

        let substituted = substitute_paths(
            macro_text,
            Path::new("/data/in.tif"),
            Some(Path::new("/data/out.tif")),
            Some(Path::new("/data/out.csv")),
        );

        assert!(substituted.contains("open(\"/data/in.tif\");"));
        assert!(substituted.contains("saveAs(\"Tiff\", \"/data/out.tif\");"));
        assert!(substituted.contains("saveAs(\"Measurements\", \"/data/out.csv\");"));
        assert!(!substituted.contains('{'));
    }

    #[test]
    fn test_substitute_paths_blanks_missing_paths() {
        let substituted = substitute_paths(
            "saveAs(\"Tiff\", \"{output_path}\");",
            Path::new("/data/in.tif"),
            None,
            None,
        );

        assert_eq!(substituted, "saveAs(\"Tiff\", \"\");");
    }

    #[test]
    fn test_substitute_paths_preserves_channel_loops() {
        let macro_text = "_channels_1 = newArray(1, 2);\nfor (_channel_index_1 = 0; _channel_index_1 < _channels_1.length; _channel_index_1++) {\n    open(\"{input_path}\");\n}";

        let substituted =
            substitute_paths(macro_text, Path::new("/data/in.tif"), None, None);

        assert!(substituted.contains("newArray(1, 2);"));
        assert!(substituted.contains("open(\"/data/in.tif\");"));
        assert!(substituted.contains("_channel_index_1++"));
    }
}
