use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Explicit path to the Fiji executable. Auto-detected when absent.
    #[serde(default)]
    pub tool_path: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub files: FileConfig,
    #[serde(default)]
    pub macro_defaults: MacroDefaults,
    #[serde(default)]
    pub options: ProcessingOptions,
}

fn default_timeout_seconds() -> u64 {
    300
}

/// File patterns used during discovery: which extensions count as documents,
/// which need the Bio-Formats importer, and how ROI files are located.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_supported_extensions")]
    pub supported_extensions: Vec<String>,
    #[serde(default = "default_importer_extensions")]
    pub importer_extensions: Vec<String>,
    /// ROI filename templates, probed in order next to each matched image.
    /// `{name}` expands to the image filename stem; a template without the
    /// token is used as a literal filename.
    #[serde(default = "default_roi_templates")]
    pub roi_templates: Vec<String>,
}

fn default_supported_extensions() -> Vec<String> {
    ["tif", "tiff", "ims", "czi"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_importer_extensions() -> Vec<String> {
    ["ims", "czi", "nd2", "lsm", "oib", "oif"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_roi_templates() -> Vec<String> {
    [
        "{name}_RoiSet_{name}.zip",
        "RoiSet_{name}.zip",
        "{name}.roi",
        "{name}.zip",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            supported_extensions: default_supported_extensions(),
            importer_extensions: default_importer_extensions(),
            roi_templates: default_roi_templates(),
        }
    }
}

impl FileConfig {
    /// Case-insensitive membership test against `supported_extensions`.
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.supported_extensions
            .iter()
            .any(|e| e.to_lowercase() == ext)
    }

    /// True when the extension requires the Bio-Formats importer instead of
    /// a plain open.
    pub fn needs_importer(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.importer_extensions
            .iter()
            .any(|e| e.to_lowercase() == ext)
    }
}

/// Default parameter values consumed by the macro builder for operations
/// that would otherwise be ambiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroDefaults {
    #[serde(default = "default_rolling_radius")]
    pub rolling_radius: u32,
    #[serde(default = "default_median_radius")]
    pub median_radius: u32,
    #[serde(default = "default_saturated_pixels")]
    pub saturated_pixels: f64,
    #[serde(default = "default_true")]
    pub convert_to_8bit: bool,
    #[serde(default = "default_duplicate_title")]
    pub duplicate_title: String,
    #[serde(default = "default_duplicate_channels")]
    pub duplicate_channels: String,
    #[serde(default = "default_duplicate_range")]
    pub duplicate_slices: String,
    #[serde(default = "default_duplicate_range")]
    pub duplicate_frames: String,
}

fn default_rolling_radius() -> u32 {
    30
}

fn default_median_radius() -> u32 {
    2
}

fn default_saturated_pixels() -> f64 {
    0.35
}

fn default_true() -> bool {
    true
}

fn default_duplicate_title() -> String {
    "Copy".to_string()
}

fn default_duplicate_channels() -> String {
    "1".to_string()
}

fn default_duplicate_range() -> String {
    "1-end".to_string()
}

impl Default for MacroDefaults {
    fn default() -> Self {
        Self {
            rolling_radius: default_rolling_radius(),
            median_radius: default_median_radius(),
            saturated_pixels: default_saturated_pixels(),
            convert_to_8bit: true,
            duplicate_title: default_duplicate_title(),
            duplicate_channels: default_duplicate_channels(),
            duplicate_slices: default_duplicate_range(),
            duplicate_frames: default_duplicate_range(),
        }
    }
}

/// Runtime options for one batch run. Immutable once the run starts; every
/// document in the run is processed under the same options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOptions {
    #[serde(default)]
    pub apply_roi: bool,
    #[serde(default)]
    pub save_processed_files: bool,
    #[serde(default)]
    pub save_measurements_csv: bool,
    #[serde(default = "default_suffix")]
    pub custom_suffix: String,
    #[serde(default)]
    pub secondary_filter: Option<String>,
    #[serde(default = "default_measurements_folder")]
    pub measurements_folder: String,
    #[serde(default = "default_processed_folder")]
    pub processed_folder: String,
    #[serde(default = "default_summary_prefix")]
    pub summary_prefix: String,
    #[serde(default = "default_true")]
    pub generate_summary: bool,
    /// Overrides `FileConfig::roi_templates` for this run when set.
    #[serde(default)]
    pub roi_templates: Option<Vec<String>>,
    /// User-defined placeholders extracted from the filename stem.
    #[serde(default)]
    pub placeholders: Vec<PlaceholderRule>,
}

fn default_suffix() -> String {
    "processed".to_string()
}

fn default_measurements_folder() -> String {
    "Measurements".to_string()
}

fn default_processed_folder() -> String {
    "Processed_Files".to_string()
}

fn default_summary_prefix() -> String {
    "measurements_summary".to_string()
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            apply_roi: false,
            save_processed_files: false,
            save_measurements_csv: false,
            custom_suffix: default_suffix(),
            secondary_filter: None,
            measurements_folder: default_measurements_folder(),
            processed_folder: default_processed_folder(),
            summary_prefix: default_summary_prefix(),
            generate_summary: true,
            roi_templates: None,
            placeholders: Vec::new(),
        }
    }
}

/// One user-defined placeholder: the pattern must contain a named capture
/// group matching `name`, applied to the filename stem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderRule {
    pub name: String,
    pub pattern: String,
}
