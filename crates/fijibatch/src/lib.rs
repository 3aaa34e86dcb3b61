pub mod cancel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod gateway;
pub mod macros;
pub mod pipeline;
pub mod summary;

pub use cancel::CancellationToken;
pub use config::{
    load_config, Config, FileConfig, MacroDefaults, PlaceholderRule, ProcessingOptions,
};
pub use discovery::{normalize_keywords, DocumentRecord, DocumentScanner};
pub use error::{ConfigError, FijibatchError, GatewayError, Result, StorageError, ValidationError};
pub use gateway::{find_tool, validate_tool_path, ToolGateway, ToolOutput};
pub use macros::{ImageContext, MacroBuilder, MacroCommand};
pub use pipeline::{BatchRunner, MacroSpec, PipelineError, RunResult};
pub use summary::{MeasurementEntry, SummaryTable};
