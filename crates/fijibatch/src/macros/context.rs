use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Converts a host path to the forward-slash form Fiji expects inside macro
/// statements. The single place path-convention pairs are derived from.
pub fn to_tool_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Replaces characters that are unsafe to embed in generated macro text.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// Substitution environment for one document.
///
/// Every path is exposed as a pair: the Fiji form (forward slashes) and the
/// native filesystem form, derived here and nowhere else. Free-form macro
/// templates resolve `{placeholder}` tokens against this context.
pub struct ImageContext {
    values: IndexMap<String, String>,
}

impl ImageContext {
    pub fn new(input_path: &Path) -> Self {
        let mut ctx = Self {
            values: IndexMap::new(),
        };

        let fiji = to_tool_path(input_path);
        let native = input_path.display().to_string();
        for key in ["input_path", "input_path_fiji", "img_path_fiji", "img_path", "IMG"] {
            ctx.values.insert(key.to_string(), fiji.clone());
        }
        ctx.values.insert("input_path_native".to_string(), native.clone());
        ctx.values.insert("img_path_native".to_string(), native);

        let stem = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        ctx.values
            .insert("document_name".to_string(), sanitize_name(stem));
        ctx.values.insert("file_stem".to_string(), stem.to_string());

        if let Some(dir) = input_path.parent() {
            ctx.insert_dir_group("img_dir", dir);
        }

        ctx
    }

    pub fn with_output_path(mut self, path: &Path) -> Self {
        let fiji = to_tool_path(path);
        for key in ["output_path", "output_path_fiji", "out_tiff", "out_image", "OUT"] {
            self.values.insert(key.to_string(), fiji.clone());
        }
        self.values
            .insert("output_path_native".to_string(), path.display().to_string());
        if let Some(dir) = path.parent() {
            self.insert_dir_group("output_dir", dir);
        }
        self
    }

    pub fn with_measurements_path(mut self, path: &Path) -> Self {
        let fiji = to_tool_path(path);
        for key in ["measurements_path", "measurements_path_fiji", "out_csv", "CSV"] {
            self.values.insert(key.to_string(), fiji.clone());
        }
        self.values.insert(
            "measurements_path_native".to_string(),
            path.display().to_string(),
        );
        if let Some(dir) = path.parent() {
            self.insert_dir_group("measurements_dir", dir);
        }
        self
    }

    pub fn with_roi_paths(mut self, paths: &[PathBuf]) -> Self {
        if paths.is_empty() {
            return self;
        }

        let fiji: Vec<String> = paths.iter().map(|p| to_tool_path(p)).collect();
        let native: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();

        self.values.insert("roi_path".to_string(), fiji[0].clone());
        self.values
            .insert("roi_path_native".to_string(), native[0].clone());
        self.values.insert("roi_paths".to_string(), fiji.join(","));
        self.values
            .insert("roi_paths_native".to_string(), native.join(","));
        self.values
            .insert("roi_paths_joined".to_string(), fiji.join("\n"));
        self.values
            .insert("roi_paths_native_joined".to_string(), native.join("\n"));

        let open_block = |paths: &[String]| -> String {
            paths
                .iter()
                .map(|p| format!(r#"roiManager("Open", "{}");"#, p))
                .collect::<Vec<_>>()
                .join("\n")
        };
        self.values
            .insert("roi_manager_open_block".to_string(), open_block(&fiji));
        self.values.insert(
            "roi_manager_open_native_block".to_string(),
            open_block(&native),
        );

        self
    }

    fn insert_dir_group(&mut self, prefix: &str, dir: &Path) {
        let fiji = to_tool_path(dir);
        let fiji_slash = if fiji.ends_with('/') {
            fiji.clone()
        } else {
            format!("{}/", fiji)
        };
        self.values.insert(format!("{}_fiji", prefix), fiji);
        self.values
            .insert(format!("{}_fiji_slash", prefix), fiji_slash);
        self.values
            .insert(format!("{}_native", prefix), dir.display().to_string());
    }

    /// Adds user-defined placeholders. Built-in names win on collision.
    pub fn with_custom(mut self, custom: IndexMap<String, String>) -> Self {
        for (name, value) in custom {
            self.values.entry(name).or_insert(value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// All placeholder names defined for this document, for error messages.
    pub fn known_placeholders(&self) -> String {
        self.values
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_placeholders() {
        let ctx = ImageContext::new(Path::new("/data/run/sample_Control.tif"));

        assert_eq!(ctx.get("input_path"), Some("/data/run/sample_Control.tif"));
        assert_eq!(ctx.get("IMG"), Some("/data/run/sample_Control.tif"));
        assert_eq!(ctx.get("file_stem"), Some("sample_Control"));
        assert_eq!(ctx.get("document_name"), Some("sample_Control"));
        assert_eq!(ctx.get("img_dir_fiji"), Some("/data/run"));
        assert_eq!(ctx.get("img_dir_fiji_slash"), Some("/data/run/"));
    }

    #[test]
    fn test_document_name_is_sanitized() {
        let ctx = ImageContext::new(Path::new("/data/sam ple (2).tif"));

        assert_eq!(ctx.get("file_stem"), Some("sam ple (2)"));
        assert_eq!(ctx.get("document_name"), Some("sam_ple__2"));
    }

    #[test]
    fn test_backslashes_normalized_in_tool_form() {
        let ctx = ImageContext::new(Path::new(r"C:\data\sample.tif"));

        assert_eq!(ctx.get("input_path"), Some("C:/data/sample.tif"));
        // Native form keeps whatever the host produced
        assert_eq!(ctx.get("input_path_native"), Some(r"C:\data\sample.tif"));
    }

    #[test]
    fn test_output_and_measurement_placeholders_absent_until_set() {
        let ctx = ImageContext::new(Path::new("/data/sample.tif"));
        assert!(ctx.get("output_path").is_none());
        assert!(ctx.get("measurements_path").is_none());

        let ctx = ctx
            .with_output_path(Path::new("/data/Processed_Files/sample_processed.tif"))
            .with_measurements_path(Path::new("/data/Measurements/sample_processed.csv"));

        assert_eq!(
            ctx.get("OUT"),
            Some("/data/Processed_Files/sample_processed.tif")
        );
        assert_eq!(
            ctx.get("CSV"),
            Some("/data/Measurements/sample_processed.csv")
        );
        assert_eq!(ctx.get("measurements_dir_fiji"), Some("/data/Measurements"));
    }

    #[test]
    fn test_roi_placeholders() {
        let ctx = ImageContext::new(Path::new("/data/sample.tif")).with_roi_paths(&[
            PathBuf::from("/data/a.roi"),
            PathBuf::from("/data/b.zip"),
        ]);

        assert_eq!(ctx.get("roi_path"), Some("/data/a.roi"));
        assert_eq!(ctx.get("roi_paths"), Some("/data/a.roi,/data/b.zip"));
        assert_eq!(
            ctx.get("roi_manager_open_block"),
            Some("roiManager(\"Open\", \"/data/a.roi\");\nroiManager(\"Open\", \"/data/b.zip\");")
        );
    }

    #[test]
    fn test_custom_placeholders_do_not_shadow_builtins() {
        let mut custom = IndexMap::new();
        custom.insert("cut".to_string(), "12".to_string());
        custom.insert("input_path".to_string(), "evil".to_string());

        let ctx = ImageContext::new(Path::new("/data/sample.tif")).with_custom(custom);

        assert_eq!(ctx.get("cut"), Some("12"));
        assert_eq!(ctx.get("input_path"), Some("/data/sample.tif"));
    }
}
