//! Catalog of abstract operations and their ImageJ macro statement
//! templates.
//!
//! Lookup is by operation name; names not present in the catalog are passed
//! through verbatim by the builder, so callers can mix library operations
//! with raw macro statements.

/// One catalog entry: the statement template plus the documentation shown
/// by `--list-commands`.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub template: &'static str,
    pub description: &'static str,
    /// Parameter name and short description, in template order.
    pub parameters: &'static [(&'static str, &'static str)],
    pub example: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    // File operations
    CommandSpec {
        name: "open_standard",
        template: r#"open("{input_path}");"#,
        description: "Open image with the standard ImageJ method",
        parameters: &[("input_path", "Path to input file")],
        example: "open_standard",
    },
    CommandSpec {
        name: "open_bioformats",
        template: r#"run("Bio-Formats Importer", "open=[{input_path}] autoscale color_mode=Default rois_import=[ROI manager] view=Hyperstack stack_order=XYCZT series_1");"#,
        description: "Open image using the Bio-Formats importer",
        parameters: &[("input_path", "Path to input file")],
        example: "open_bioformats",
    },
    CommandSpec {
        name: "save_tiff",
        template: r#"saveAs("Tiff", "{output_path}");"#,
        description: "Save current image as TIFF",
        parameters: &[("output_path", "Path for output file")],
        example: "save_tiff",
    },
    CommandSpec {
        name: "save_csv",
        template: r#"saveAs("Measurements", "{measurements_path}");"#,
        description: "Save measurements as CSV",
        parameters: &[("measurements_path", "Path for CSV file")],
        example: "save_csv",
    },
    // Image processing
    CommandSpec {
        name: "convert_8bit",
        template: r#"run("8-bit");"#,
        description: "Convert image to 8-bit",
        parameters: &[],
        example: "convert_8bit",
    },
    CommandSpec {
        name: "convert_16bit",
        template: r#"run("16-bit");"#,
        description: "Convert image to 16-bit",
        parameters: &[],
        example: "convert_16bit",
    },
    CommandSpec {
        name: "subtract_background",
        template: r#"run("Subtract Background...", "rolling={radius}");"#,
        description: "Subtract background using the rolling ball algorithm",
        parameters: &[("radius", "Rolling ball radius")],
        example: "subtract_background radius=50",
    },
    CommandSpec {
        name: "median_filter",
        template: r#"run("Median...", "radius={radius}");"#,
        description: "Apply median filter",
        parameters: &[("radius", "Filter radius")],
        example: "median_filter radius=3",
    },
    CommandSpec {
        name: "gaussian_blur",
        template: r#"run("Gaussian Blur...", "sigma={sigma}");"#,
        description: "Apply Gaussian blur",
        parameters: &[("sigma", "Blur sigma")],
        example: "gaussian_blur sigma=1.5",
    },
    CommandSpec {
        name: "enhance_contrast",
        template: r#"run("Enhance Contrast...", "saturated={saturated} normalize");"#,
        description: "Enhance contrast with normalization",
        parameters: &[("saturated", "Saturated pixel percentage")],
        example: "enhance_contrast saturated=0.4",
    },
    CommandSpec {
        name: "threshold",
        template: r#"run("Threshold...", "method={method}");"#,
        description: "Apply threshold",
        parameters: &[("method", "Threshold method")],
        example: "threshold method=Otsu",
    },
    // Measurements
    CommandSpec {
        name: "measure",
        template: r#"run("Measure");"#,
        description: "Measure current selection or entire image",
        parameters: &[],
        example: "measure",
    },
    CommandSpec {
        name: "set_measurements",
        template: r#"run("Set Measurements...", "area mean std min max center perimeter bounding fit shape feret's integrated median skewness kurtosis area_fraction stack display redirect=None decimal=3");"#,
        description: "Set which measurements are recorded",
        parameters: &[],
        example: "set_measurements",
    },
    CommandSpec {
        name: "clear_measurements",
        template: r#"run("Clear Results");"#,
        description: "Clear all measurements",
        parameters: &[],
        example: "clear_measurements",
    },
    // ROI operations
    CommandSpec {
        name: "roi_manager_reset",
        template: r#"roiManager("Reset");"#,
        description: "Reset the ROI Manager",
        parameters: &[],
        example: "roi_manager_reset",
    },
    CommandSpec {
        name: "roi_manager_open",
        template: r#"roiManager("Open", "{roi_path}");"#,
        description: "Open a ROI file into the ROI Manager",
        parameters: &[("roi_path", "Path to ROI file")],
        example: "roi_manager_open roi_path=/path/to/roi.zip",
    },
    CommandSpec {
        name: "roi_manager_select",
        template: r#"roiManager("Select", {index});"#,
        description: "Select ROI by index",
        parameters: &[("index", "ROI index (0-based)")],
        example: "roi_manager_select index=0",
    },
    CommandSpec {
        name: "roi_manager_measure",
        template: r#"roiManager("Measure");"#,
        description: "Measure all ROIs in the manager",
        parameters: &[],
        example: "roi_manager_measure",
    },
    CommandSpec {
        name: "make_inverse",
        template: r#"run("Make Inverse");"#,
        description: "Create inverse of the current selection",
        parameters: &[],
        example: "make_inverse",
    },
    CommandSpec {
        name: "roi_manager_add",
        template: r#"roiManager("Add");"#,
        description: "Add current selection to the ROI Manager",
        parameters: &[],
        example: "roi_manager_add",
    },
    CommandSpec {
        name: "roi_manager_save",
        template: r#"roiManager("Save", "{roi_path}");"#,
        description: "Save ROIs to file",
        parameters: &[("roi_path", "Path to save ROIs")],
        example: "roi_manager_save roi_path=/path/to/save.zip",
    },
    CommandSpec {
        name: "roi_manager_show_none",
        template: r#"roiManager("Show None");"#,
        description: "Hide all ROIs",
        parameters: &[],
        example: "roi_manager_show_none",
    },
    CommandSpec {
        name: "roi_manager_deselect",
        template: r#"roiManager("Deselect");"#,
        description: "Deselect all ROIs",
        parameters: &[],
        example: "roi_manager_deselect",
    },
    // Utility operations
    CommandSpec {
        name: "duplicate",
        template: r#"run("Duplicate...", "title={title} duplicate channels={channels} slices={slices} frames={frames}");"#,
        description: "Duplicate current image",
        parameters: &[
            ("title", "Title for duplicate"),
            ("channels", "Channels to duplicate"),
            ("slices", "Slices to duplicate"),
            ("frames", "Frames to duplicate"),
        ],
        example: "duplicate title=Copy channels=1 slices=1-end frames=1-end",
    },
    CommandSpec {
        name: "close_all",
        template: r#"run("Close All");"#,
        description: "Close all open windows",
        parameters: &[],
        example: "close_all",
    },
    CommandSpec {
        name: "batch_mode",
        template: r#"setBatchMode(true);"#,
        description: "Run without showing image windows",
        parameters: &[],
        example: "batch_mode",
    },
    CommandSpec {
        name: "quit",
        template: r#"run("Quit");"#,
        description: "Quit ImageJ/Fiji",
        parameters: &[],
        example: "quit",
    },
    // Display operations
    CommandSpec {
        name: "set_option_show_all",
        template: r#"setOption("Show All", false);"#,
        description: "Turn the 'Show All' overlay option off",
        parameters: &[],
        example: "set_option_show_all",
    },
    CommandSpec {
        name: "remove_overlay",
        template: r#"run("Remove Overlay");"#,
        description: "Remove any overlays",
        parameters: &[],
        example: "remove_overlay",
    },
];

/// Looks an operation up by name.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}
