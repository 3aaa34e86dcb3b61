use indexmap::IndexMap;
use regex::Regex;

use crate::config::schema::PlaceholderRule;

/// Extracts user-defined placeholder values from filename stems.
///
/// Each configured rule carries a regex with a named capture group matching
/// the placeholder name; the first match against the stem wins. Patterns are
/// compiled once per run.
pub struct PlaceholderEngine {
    compiled: Vec<CompiledRule>,
}

struct CompiledRule {
    name: String,
    regex: Regex,
}

impl PlaceholderEngine {
    pub fn new(rules: &[PlaceholderRule]) -> Self {
        let compiled = rules
            .iter()
            .filter_map(|rule| {
                Regex::new(&rule.pattern).ok().map(|regex| CompiledRule {
                    name: rule.name.clone(),
                    regex,
                })
            })
            .collect();

        Self { compiled }
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    pub fn extract(&self, stem: &str) -> IndexMap<String, String> {
        let mut values = IndexMap::new();

        for rule in &self.compiled {
            if let Some(caps) = rule.regex.captures(stem) {
                if let Some(matched) = caps.name(&rule.name) {
                    values.insert(rule.name.clone(), matched.as_str().to_string());
                }
            }
        }

        values
    }
}
