//! Macro generation through the public API: command lists, channel loops
//! and placeholder contexts working together.

use std::path::Path;

use fijibatch::macros::parse_command_sequence;
use fijibatch::{ImageContext, MacroBuilder, MacroCommand, MacroDefaults};

fn builder() -> MacroBuilder {
    MacroBuilder::new(MacroDefaults::default())
}

#[test]
fn test_channel_loops_survive_path_substitution() {
    let commands = vec![
        MacroCommand::new("open_standard"),
        MacroCommand::new("enhance_contrast")
            .param("saturated", "0.25")
            .param("channels", "1-2"),
    ];

    let macro_text = builder().build_from_commands(&commands).unwrap();

    // The path placeholder survives command-mode generation ...
    assert!(macro_text.contains("{input_path}"));

    // ... and a later substitution pass leaves the generated loop intact.
    let substituted = macro_text.replace("{input_path}", "/data/input.tif");
    assert!(substituted.contains("open(\"/data/input.tif\");"));
    assert!(substituted.contains("_channels_1 = newArray(1, 2);"));
    assert!(substituted.contains(
        "for (_channel_index_1 = 0; _channel_index_1 < _channels_1.length; _channel_index_1++) {"
    ));
    assert!(substituted.contains("Stack.setChannel(int(_channels_1[_channel_index_1]));"));
    assert!(!substituted.contains("{input_path}"));
}

#[test]
fn test_parsed_command_string_builds_same_macro_as_explicit_commands() {
    let parsed = parse_command_sequence("open_standard median_filter radius=3 quit");
    let explicit = vec![
        MacroCommand::new("open_standard"),
        MacroCommand::new("median_filter").param("radius", "3"),
        MacroCommand::new("quit"),
    ];

    let from_parsed = builder().build_from_commands(&parsed).unwrap();
    let from_explicit = builder().build_from_commands(&explicit).unwrap();

    assert_eq!(from_parsed, from_explicit);
}

#[test]
fn test_template_rendering_with_roi_block() {
    let ctx = ImageContext::new(Path::new("/data/scan_cut3.tif")).with_roi_paths(&[
        Path::new("/data/roi_3.roi").to_path_buf(),
        Path::new("/data/RoiSet_3.zip").to_path_buf(),
    ]);

    let rendered = builder()
        .render_template("{roi_manager_open_block}\nroiManager(\"Measure\");", &ctx)
        .unwrap();

    assert_eq!(
        rendered,
        "roiManager(\"Open\", \"/data/roi_3.roi\");\nroiManager(\"Open\", \"/data/RoiSet_3.zip\");\nroiManager(\"Measure\");"
    );
}

#[test]
fn test_standard_pipeline_end_to_end_generation() {
    let commands = builder().standard_processing_commands(false);
    let macro_text = builder().build_from_commands(&commands).unwrap();

    // Spot-check the ordering: open before duplicate before subtract
    let open_pos = macro_text.find("open(").unwrap();
    let duplicate_pos = macro_text.find("Duplicate...").unwrap();
    let subtract_pos = macro_text.find("Subtract Background...").unwrap();
    let quit_pos = macro_text.find("run(\"Quit\");").unwrap();

    assert!(open_pos < duplicate_pos);
    assert!(duplicate_pos < subtract_pos);
    assert!(subtract_pos < quit_pos);
}
