use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::config::MacroDefaults;
use crate::error::ValidationError;
use crate::macros::channels::{parse_channel_spec, CHANNEL_ALIASES};
use crate::macros::command::MacroCommand;
use crate::macros::context::ImageContext;
use crate::macros::library;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
    })
}

/// Compiles abstract command sequences or free-form templates into macro
/// program text. Pure function of its inputs; all failures are synchronous.
pub struct MacroBuilder {
    defaults: MacroDefaults,
}

impl MacroBuilder {
    pub fn new(defaults: MacroDefaults) -> Self {
        Self { defaults }
    }

    /// Builds a macro from an ordered command list.
    ///
    /// Commands carrying a channel selection (explicit `target_channels`, or
    /// a recognized parameter alias the template does not consume literally)
    /// have their statement wrapped in a generated loop that selects each
    /// channel in turn. Loop variable names carry a monotonically increasing
    /// suffix so sibling loops never collide.
    pub fn build_from_commands(
        &self,
        commands: &[MacroCommand],
    ) -> Result<String, ValidationError> {
        let mut lines: Vec<String> = Vec::new();
        let mut loop_counter = 0usize;

        for cmd in commands {
            if let Some(comment) = &cmd.comment {
                lines.push(format!("// {}", comment));
            }

            let template = library::lookup(&cmd.name)
                .map(|spec| spec.template.to_string())
                .unwrap_or_else(|| cmd.name.clone());

            let mut params = cmd.parameters.clone();
            self.fill_default_params(&cmd.name, &mut params);

            let channel_list = extract_channel_list(cmd, &template, &mut params)?;

            let statement = substitute_params(&template, &params);

            match channel_list {
                Some(channels) if !channels.is_empty() => {
                    loop_counter += 1;
                    emit_channel_loop(&mut lines, &statement, &channels, loop_counter);
                }
                _ => lines.extend(statement.lines().map(String::from)),
            }
        }

        Ok(lines.join("\n"))
    }

    /// Resolves every `{placeholder}` token of a free-form template against
    /// the document context. Unknown placeholders are an error naming the
    /// token and listing everything the context defines.
    pub fn render_template(
        &self,
        template: &str,
        ctx: &ImageContext,
    ) -> Result<String, ValidationError> {
        let re = placeholder_re();

        for caps in re.captures_iter(template) {
            let name = &caps[1];
            if ctx.get(name).is_none() {
                return Err(ValidationError::UnknownPlaceholder {
                    name: name.to_string(),
                    known: ctx.known_placeholders(),
                });
            }
        }

        let resolved = re.replace_all(template, |caps: &regex::Captures<'_>| {
            ctx.get(&caps[1]).unwrap_or_default().to_string()
        });

        Ok(resolved.into_owned())
    }

    /// The canonical processing sequence: open, strip overlays, duplicate,
    /// filter, enhance, save, clean up. Paths stay as placeholders for the
    /// final substitution pass.
    pub fn standard_processing_commands(&self, needs_importer: bool) -> Vec<MacroCommand> {
        let open = if needs_importer {
            MacroCommand::new("open_bioformats").comment("Open image using Bio-Formats")
        } else {
            MacroCommand::new("open_standard").comment("Open image")
        };

        let mut commands = vec![
            open,
            MacroCommand::new("set_option_show_all").comment("Hide all overlays"),
            MacroCommand::new("remove_overlay"),
            MacroCommand::new("roi_manager_show_none"),
            MacroCommand::new("roi_manager_deselect"),
            MacroCommand::new("orig = getTitle();").comment("Store original title"),
            MacroCommand::new("duplicate")
                .comment("Duplicate image for processing")
                .param("title", "C1")
                .param("channels", self.defaults.duplicate_channels.clone())
                .param("slices", self.defaults.duplicate_slices.clone())
                .param("frames", self.defaults.duplicate_frames.clone()),
            MacroCommand::new("keep = getTitle();"),
            MacroCommand::new("selectWindow(orig); close();").comment("Close original"),
            MacroCommand::new("selectWindow(keep);"),
        ];

        if self.defaults.convert_to_8bit {
            commands.push(MacroCommand::new("convert_8bit").comment("Convert to 8-bit"));
        }

        commands.extend([
            MacroCommand::new("subtract_background")
                .comment("Subtract background")
                .param("radius", self.defaults.rolling_radius.to_string()),
            MacroCommand::new("median_filter")
                .param("radius", self.defaults.median_radius.to_string()),
            MacroCommand::new("enhance_contrast")
                .param("saturated", self.defaults.saturated_pixels.to_string()),
            MacroCommand::new("save_tiff").comment("Save processed image"),
            MacroCommand::new("close_all"),
            MacroCommand::new("quit"),
        ]);

        commands
    }

    /// For each ROI file: open it, invert the first selection and save the
    /// inverse next to the original.
    pub fn roi_inversion_commands(
        &self,
        needs_importer: bool,
        roi_paths: &[String],
    ) -> Vec<MacroCommand> {
        let open = if needs_importer {
            MacroCommand::new("open_bioformats").comment("Open image using Bio-Formats")
        } else {
            MacroCommand::new("open_standard").comment("Open image")
        };

        let mut commands = vec![open, MacroCommand::new("roi_manager_reset")];

        for roi_path in roi_paths {
            let inverted = roi_path.replace(".roi", "_inverted.roi");
            commands.extend([
                MacroCommand::new("roi_manager_open").param("roi_path", roi_path.clone()),
                MacroCommand::new("roi_manager_select").param("index", "0"),
                MacroCommand::new("make_inverse").comment("Create inverse ROI"),
                MacroCommand::new("roi_manager_add"),
                MacroCommand::new("roi_manager_select").param("index", "1"),
                MacroCommand::new("roi_manager_save").param("roi_path", inverted),
                MacroCommand::new("roi_manager_reset").comment("Reset for next ROI"),
            ]);
        }

        commands.extend([MacroCommand::new("close_all"), MacroCommand::new("quit")]);
        commands
    }

    fn fill_default_params(&self, name: &str, params: &mut IndexMap<String, String>) {
        match name {
            "duplicate" => {
                let defaults = [
                    ("title", self.defaults.duplicate_title.clone()),
                    ("channels", self.defaults.duplicate_channels.clone()),
                    ("slices", self.defaults.duplicate_slices.clone()),
                    ("frames", self.defaults.duplicate_frames.clone()),
                ];
                for (key, value) in defaults {
                    if !params.contains_key(key) {
                        params.insert(key.to_string(), value);
                    }
                }
            }
            "save_csv" => {
                // measurements_path and output_path are interchangeable here
                if !params.contains_key("measurements_path") {
                    if let Some(path) = params.shift_remove("output_path") {
                        params.insert("measurements_path".to_string(), path);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Pulls a channel selection out of the command, either from the explicit
/// `target_channels` field or from a recognized parameter alias the template
/// does not consume by name.
fn extract_channel_list(
    cmd: &MacroCommand,
    template: &str,
    params: &mut IndexMap<String, String>,
) -> Result<Option<Vec<i64>>, ValidationError> {
    if let Some(channels) = &cmd.target_channels {
        return Ok(Some(channels.clone()));
    }

    for alias in CHANNEL_ALIASES {
        if template.contains(&format!("{{{}}}", alias)) {
            continue;
        }
        if let Some(spec) = params.shift_remove(*alias) {
            return parse_channel_spec(&spec).map(Some);
        }
    }

    Ok(None)
}

/// Substitutes `{key}` tokens for the supplied parameters, leaving unknown
/// tokens (the path placeholders of the final pass) untouched.
fn substitute_params(template: &str, params: &IndexMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in params {
        result = result.replace(&format!("{{{}}}", key), value);
    }
    result
}

fn emit_channel_loop(lines: &mut Vec<String>, statement: &str, channels: &[i64], index: usize) {
    let array: Vec<String> = channels.iter().map(|c| c.to_string()).collect();
    lines.push(format!("_channels_{} = newArray({});", index, array.join(", ")));
    lines.push(format!(
        "for (_channel_index_{i} = 0; _channel_index_{i} < _channels_{i}.length; _channel_index_{i}++) {{",
        i = index
    ));
    lines.push(format!(
        "    Stack.setChannel(int(_channels_{i}[_channel_index_{i}]));",
        i = index
    ));
    for line in statement.lines() {
        lines.push(format!("    {}", line));
    }
    lines.push("}".to_string());
}
