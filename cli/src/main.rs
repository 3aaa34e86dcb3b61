use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use fijibatch::macros::library;
use fijibatch::{
    find_tool, load_config, validate_tool_path, BatchRunner, CancellationToken, Config, MacroSpec,
    ProcessingOptions, ToolGateway,
};

#[derive(Parser)]
#[command(
    name = "fijibatch",
    about = "Keyword-driven batch analysis of microscopy images through Fiji macros",
    version
)]
struct Cli {
    /// Base directory containing documents
    base_path: Option<PathBuf>,

    /// Keyword to search for in document names (repeatable, comma-separable)
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    /// Additional substring the filename must also contain
    #[arg(long)]
    secondary_filter: Option<String>,

    /// Whitespace-separated macro commands, e.g.
    /// "open_standard subtract_background radius=50 measure"
    #[arg(long)]
    commands: Option<String>,

    /// Raw command name or macro statement passed through verbatim
    /// (repeatable)
    #[arg(long = "command")]
    raw_commands: Vec<String>,

    /// Free-form macro template file, resolved per document
    #[arg(long)]
    template_file: Option<PathBuf>,

    /// Run the canonical processing pipeline (duplicate, subtract
    /// background, median filter, enhance contrast, save)
    #[arg(long)]
    standard_pipeline: bool,

    /// Invert each document's associated ROI and save it alongside the
    /// original
    #[arg(long)]
    invert_rois: bool,

    /// Path to the Fiji executable (auto-detected when omitted)
    #[arg(long)]
    tool_path: Option<PathBuf>,

    /// Extra argument appended to every tool invocation (repeatable)
    #[arg(long = "tool-arg")]
    tool_args: Vec<String>,

    /// Per-document timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Load ROI files found next to each document
    #[arg(long)]
    apply_roi: bool,

    /// Save processed images to a separate directory
    #[arg(long)]
    save_processed: bool,

    /// Save per-document measurement CSV files
    #[arg(long)]
    save_measurements: bool,

    /// Suffix for derived output files
    #[arg(long)]
    suffix: Option<String>,

    #[arg(long)]
    measurements_folder: Option<String>,

    #[arg(long)]
    processed_folder: Option<String>,

    #[arg(long)]
    summary_prefix: Option<String>,

    /// Skip the consolidated measurement summary
    #[arg(long)]
    no_summary: bool,

    /// ROI filename template, probed in order ({name} = document stem)
    #[arg(long = "roi-template")]
    roi_templates: Vec<String>,

    /// JSON config file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    /// Validate the setup and exit
    #[arg(long)]
    validate: bool,

    /// List available macro commands and exit
    #[arg(long)]
    list_commands: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if cli.list_commands {
        print_commands();
        return ExitCode::SUCCESS;
    }

    let config = match cli.config.as_ref().map(load_config) {
        Some(Ok(config)) => Some(config),
        Some(Err(e)) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
        None => None,
    };

    let tool_path = cli
        .tool_path
        .clone()
        .or_else(|| {
            config
                .as_ref()
                .and_then(|c| c.tool_path.as_ref().map(PathBuf::from))
        })
        .or_else(find_tool);

    if cli.validate {
        return validate_setup(tool_path.as_deref(), config.as_ref());
    }

    let Some(tool_path) = tool_path else {
        eprintln!("Error: Fiji not found. Install Fiji or pass --tool-path.");
        return ExitCode::FAILURE;
    };

    let (Some(base_path), false) = (cli.base_path.clone(), cli.keywords.is_empty()) else {
        eprintln!("Error: both a base directory and --keyword are required for processing");
        eprintln!("Use --help for usage information");
        return ExitCode::FAILURE;
    };

    let keywords: Vec<String> = cli
        .keywords
        .iter()
        .flat_map(|k| k.split(','))
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    let timeout = cli
        .timeout
        .or(config.as_ref().map(|c| c.timeout_seconds))
        .unwrap_or(300);

    let gateway = match ToolGateway::new(&tool_path, Duration::from_secs(timeout)) {
        Ok(gateway) => gateway.with_extra_args(cli.tool_args.clone()),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let file_config = config
        .as_ref()
        .map(|c| c.files.clone())
        .unwrap_or_default();
    let macro_defaults = config
        .as_ref()
        .map(|c| c.macro_defaults.clone())
        .unwrap_or_default();
    let options = build_options(&cli, config.as_ref());

    let macro_spec = match macro_spec_from_cli(&cli) {
        Ok(spec) => spec,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let runner = BatchRunner::new(gateway, file_config, macro_defaults);
    let result = match runner.run(
        &base_path,
        &keywords,
        &macro_spec,
        &options,
        &CancellationToken::new(),
    ) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if result.success {
        println!("Processing completed successfully.");
        println!("Processed documents: {}", result.processed_documents.len());
        println!("Measurement entries: {}", result.measurements.len());
        if let Some(summary_path) = &result.summary_path {
            println!("Summary: {}", summary_path.display());
        }
        ExitCode::SUCCESS
    } else {
        match &result.error {
            Some(error) => eprintln!("Processing failed: {}", error),
            None => {
                eprintln!(
                    "Processing finished with {} failed document(s):",
                    result.failed_documents.len()
                );
                for failed in &result.failed_documents {
                    eprintln!("  - {}: {}", failed.filename, failed.error);
                }
            }
        }
        ExitCode::FAILURE
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Route `log` macros from the library into the subscriber
    let _ = tracing_log::LogTracer::init();
}

fn print_commands() {
    println!("Available commands:");
    println!("{}", "=".repeat(50));
    for spec in library::COMMANDS {
        println!();
        println!("{}", spec.name);
        println!("  Description: {}", spec.description);
        if !spec.parameters.is_empty() {
            let params: Vec<String> = spec
                .parameters
                .iter()
                .map(|(name, doc)| format!("{} ({})", name, doc))
                .collect();
            println!("  Parameters: {}", params.join(", "));
        }
        println!("  Example: {}", spec.example);
    }
}

fn validate_setup(tool_path: Option<&std::path::Path>, config: Option<&Config>) -> ExitCode {
    let files = config.map(|c| c.files.clone()).unwrap_or_default();

    println!("Validating setup...");
    match tool_path {
        Some(path) => {
            let valid = validate_tool_path(path);
            println!("Tool path: {}", path.display());
            println!("Tool valid: {}", valid);
            println!("Available commands: {}", library::COMMANDS.len());
            println!(
                "Supported extensions: {}",
                files.supported_extensions.join(", ")
            );
            if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        None => {
            println!("Tool path: not found");
            ExitCode::FAILURE
        }
    }
}

fn build_options(cli: &Cli, config: Option<&Config>) -> ProcessingOptions {
    let mut options = config
        .map(|c| c.options.clone())
        .unwrap_or_default();

    options.apply_roi |= cli.apply_roi;
    options.save_processed_files |= cli.save_processed;
    options.save_measurements_csv |= cli.save_measurements;
    if cli.no_summary {
        options.generate_summary = false;
    }
    if let Some(suffix) = &cli.suffix {
        options.custom_suffix = suffix.clone();
    }
    if let Some(folder) = &cli.measurements_folder {
        options.measurements_folder = folder.clone();
    }
    if let Some(folder) = &cli.processed_folder {
        options.processed_folder = folder.clone();
    }
    if let Some(prefix) = &cli.summary_prefix {
        options.summary_prefix = prefix.clone();
    }
    if cli.secondary_filter.is_some() {
        options.secondary_filter = cli.secondary_filter.clone();
    }
    if !cli.roi_templates.is_empty() {
        options.roi_templates = Some(cli.roi_templates.clone());
    }

    options
}

fn macro_spec_from_cli(cli: &Cli) -> Result<MacroSpec, String> {
    if let Some(template_file) = &cli.template_file {
        let template = std::fs::read_to_string(template_file)
            .map_err(|e| format!("Failed to read {}: {}", template_file.display(), e))?;
        return Ok(MacroSpec::Template(template));
    }

    if let Some(commands) = &cli.commands {
        return Ok(MacroSpec::CommandString(commands.clone()));
    }

    if !cli.raw_commands.is_empty() {
        return Ok(MacroSpec::Names(cli.raw_commands.clone()));
    }

    if cli.invert_rois {
        return Ok(MacroSpec::RoiInversion);
    }

    if cli.standard_pipeline {
        return Ok(MacroSpec::StandardProcessing);
    }

    Ok(MacroSpec::Default)
}
