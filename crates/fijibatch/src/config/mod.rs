pub mod loader;
pub mod schema;
pub mod variables;

pub use loader::{load_config, load_config_from_str};
pub use schema::{Config, FileConfig, MacroDefaults, PlaceholderRule, ProcessingOptions};
pub use variables::PlaceholderEngine;
