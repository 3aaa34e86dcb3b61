use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.files.supported_extensions.is_empty() {
        return Err(ConfigError::Validation {
            message: "supported_extensions must not be empty".to_string(),
        });
    }

    if config.timeout_seconds == 0 {
        return Err(ConfigError::Validation {
            message: "timeout_seconds must be greater than zero".to_string(),
        });
    }

    // Validate placeholder extraction patterns
    for rule in &config.options.placeholders {
        if let Err(e) = regex::Regex::new(&rule.pattern) {
            return Err(ConfigError::InvalidPattern {
                name: rule.name.clone(),
                reason: e.to_string(),
            });
        }

        // Check that pattern contains named capture group matching the name
        if !rule.pattern.contains(&format!("?P<{}>", rule.name))
            && !rule.pattern.contains(&format!("?<{}>", rule.name))
        {
            return Err(ConfigError::InvalidPattern {
                name: rule.name.clone(),
                reason: format!(
                    "Pattern must contain named capture group '?P<{}>' or '?<{}>'",
                    rule.name, rule.name
                ),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config() {
        let config_json = r#"
        {
            "version": "1.0"
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.timeout_seconds, 300);
        assert!(config.tool_path.is_none());
        assert!(config.files.is_supported_extension("tif"));
        assert!(config.files.needs_importer("czi"));
    }

    #[test]
    fn test_load_config_with_options() {
        let config_json = r#"
        {
            "version": "1.0",
            "tool_path": "/opt/fiji/ImageJ-linux64",
            "timeout_seconds": 60,
            "options": {
                "apply_roi": true,
                "save_measurements_csv": true,
                "custom_suffix": "analyzed",
                "secondary_filter": "MIP"
            }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.timeout_seconds, 60);
        assert!(config.options.apply_roi);
        assert!(config.options.save_measurements_csv);
        assert_eq!(config.options.custom_suffix, "analyzed");
        assert_eq!(config.options.secondary_filter.as_deref(), Some("MIP"));
        // Unspecified fields keep their defaults
        assert_eq!(config.options.measurements_folder, "Measurements");
        assert!(config.options.generate_summary);
    }

    #[test]
    fn test_load_config_with_placeholders() {
        let config_json = r#"
        {
            "version": "1.0",
            "options": {
                "placeholders": [
                    { "name": "cut", "pattern": "cut(?P<cut>\\d+)" }
                ]
            }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.options.placeholders.len(), 1);
        assert_eq!(config.options.placeholders[0].name, "cut");
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = load_config_from_str(r#"{ "version": "1.0", "timeout_seconds": 0 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_placeholder_pattern() {
        let config_json = r#"
        {
            "version": "1.0",
            "options": {
                "placeholders": [
                    { "name": "cut", "pattern": "cut(?P<cut>[" }
                ]
            }
        }
        "#;

        let result = load_config_from_str(config_json);
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_missing_capture_group() {
        let config_json = r#"
        {
            "version": "1.0",
            "options": {
                "placeholders": [
                    { "name": "cut", "pattern": "cut(\\d+)" }
                ]
            }
        }
        "#;

        let result = load_config_from_str(config_json);
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }
}
