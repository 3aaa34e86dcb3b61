use indexmap::IndexMap;

/// One abstract macro operation: a catalog name (or raw statement text), an
/// optional parameter map, an optional comment emitted before the generated
/// statement, and an optional explicit channel list.
#[derive(Debug, Clone)]
pub struct MacroCommand {
    pub name: String,
    pub parameters: IndexMap<String, String>,
    pub comment: Option<String>,
    pub target_channels: Option<Vec<i64>>,
}

impl MacroCommand {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            parameters: IndexMap::new(),
            comment: None,
            target_channels: None,
        }
    }

    pub fn comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn target_channels(mut self, channels: Vec<i64>) -> Self {
        self.target_channels = Some(channels);
        self
    }
}

/// Parses a whitespace-separated command sequence such as
/// `"open_standard subtract_background radius=50 measure"`.
///
/// A `key=value` token attaches to the preceding command; a token without
/// `=` starts a new command. A leading `key=value` with no preceding command
/// falls back to a raw passthrough command, preserving permissive behavior.
pub fn parse_command_sequence(input: &str) -> Vec<MacroCommand> {
    let mut commands: Vec<MacroCommand> = Vec::new();

    for token in input.split_whitespace() {
        if let Some((key, value)) = token.split_once('=') {
            if let Some(last) = commands.last_mut() {
                last.parameters
                    .insert(key.trim().to_string(), value.trim().to_string());
                continue;
            }
        }
        commands.push(MacroCommand::new(token));
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_names() {
        let commands = parse_command_sequence("open_standard convert_8bit measure");
        let names: Vec<_> = commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["open_standard", "convert_8bit", "measure"]);
        assert!(commands.iter().all(|c| c.parameters.is_empty()));
    }

    #[test]
    fn test_parse_parameters_attach_to_preceding_command() {
        let commands = parse_command_sequence("subtract_background radius=50 measure");
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].name, "subtract_background");
        assert_eq!(
            commands[0].parameters.get("radius"),
            Some(&"50".to_string())
        );
        assert_eq!(commands[1].name, "measure");
    }

    #[test]
    fn test_parse_multiple_parameters() {
        let commands = parse_command_sequence("duplicate title=C2 channels=2");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].parameters.get("title"), Some(&"C2".to_string()));
        assert_eq!(
            commands[0].parameters.get("channels"),
            Some(&"2".to_string())
        );
    }

    #[test]
    fn test_leading_parameter_becomes_raw_command() {
        let commands = parse_command_sequence("radius=50");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].name, "radius=50");
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(parse_command_sequence("   ").is_empty());
    }
}
