// In crates/api-client/src/lib.rs

pub mod error;
pub mod llm;
pub mod market_data;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use llm::{CompletionClient, OpenAiClient, ScriptedCompletionClient};
pub use market_data::{MarketDataClient, load_csv, parse_chart_response};
pub use types::{DataRange, LlmSettings};
