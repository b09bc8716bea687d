//! Tool-augmented agent core
//!
//! A single agent runs a bounded reason/act loop against a completion
//! gateway, dispatching tool calls through its own registry view. The
//! structured layer coerces a free-text answer into a validated value.

use thiserror::Error;

pub mod context;
pub mod loop_agent;
pub mod structured;
pub mod tools;

pub use context::ContextBuilder;
pub use loop_agent::{Agent, AgentConfig, GatewayPolicy, RunOutcome};
pub use structured::{extract_json_object, structured_query, StructuredOutput};
pub use tools::{
    CompositeProvider, KeywordFilter, ToolProvider, ToolRegistry, ToolSource, ToolTrait,
};

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool '{name}' failed: {message}")]
    ToolExecution { name: String, message: String },

    #[error("tool discovery failed: {0}")]
    Discovery(String),

    #[error("completion service error: {0}")]
    Provider(String),

    #[error("no answer within {iterations} iterations")]
    IterationBudgetExceeded { iterations: u32 },

    #[error("schema coercion failed: {reason}")]
    SchemaCoercion { reason: String, raw: String },
}

impl AgentError {
    /// Raw model output attached to a coercion failure
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            AgentError::SchemaCoercion { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
