pub mod claude_client;
pub mod config;
pub mod fixer;
pub mod llm_fixer;

pub use claude_client::{ClaudeClient, ClaudeClientConfig, FixError};
pub use config::AppConfig;
pub use fixer::{fix_patterns, FixEngine, FixResult};
pub use llm_fixer::LlmFixer;
