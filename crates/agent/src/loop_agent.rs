//! Agent loop - core processing engine
//!
//! One run moves through
//! `INIT -> AWAITING_COMPLETION -> {EXECUTING_TOOLS -> AWAITING_COMPLETION}* -> DONE | EXHAUSTED`.
//! The iteration counter counts completion calls and never passes the
//! configured maximum.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use tripsmith_provider::{ChatParams, ChatResponse, Message, Provider, ToolCall, ToolChoice};

use crate::context::ContextBuilder;
use crate::tools::ToolRegistry;
use crate::{AgentError, Result};

/// Default bound on completion calls per run
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Text substituted for a failed completion call under [`GatewayPolicy::Degrade`]
pub const GATEWAY_APOLOGY: &str = "Sorry, I ran into an error reaching the model service.";

/// What a failed completion call does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewayPolicy {
    /// Continue as if the model had answered with an apology
    #[default]
    Degrade,
    /// Abort the run with [`AgentError::Provider`]
    Propagate,
}

/// Generation settings for one agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_iterations: u32,
    pub gateway_policy: GatewayPolicy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.7,
            max_tokens: 4096,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            gateway_policy: GatewayPolicy::Degrade,
        }
    }
}

impl AgentConfig {
    pub fn from_config(config: &tripsmith_config::Config) -> Self {
        Self {
            model: config.model().unwrap_or_default(),
            temperature: config.agent.temperature,
            max_tokens: config.agent.max_tokens,
            max_iterations: config.agent.max_iterations,
            gateway_policy: GatewayPolicy::Degrade,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model answered without requesting tools
    Answer(String),
    /// Every iteration requested tools; no answer within budget
    Exhausted { iterations: u32 },
}

impl RunOutcome {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RunOutcome::Exhausted { .. })
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            RunOutcome::Answer(text) => Some(text),
            RunOutcome::Exhausted { .. } => None,
        }
    }

    /// The answer, or [`AgentError::IterationBudgetExceeded`]
    pub fn into_answer(self) -> Result<String> {
        match self {
            RunOutcome::Answer(text) => Ok(text),
            RunOutcome::Exhausted { iterations } => {
                Err(AgentError::IterationBudgetExceeded { iterations })
            }
        }
    }
}

/// A role-configured agent: system prompt, tool view and message log
pub struct Agent<P: Provider> {
    name: String,
    provider: Arc<P>,
    context: ContextBuilder,
    tools: ToolRegistry,
    config: AgentConfig,
    history: Vec<Message>,
}

impl<P: Provider> Agent<P> {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<P>,
        system_prompt: Option<String>,
        config: AgentConfig,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            context: ContextBuilder::new(system_prompt),
            tools: ToolRegistry::new(),
            config,
            history: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Message log of the most recent run
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Run with the configured iteration bound
    pub async fn run(&mut self, input: &str) -> Result<RunOutcome> {
        let max_iterations = self.config.max_iterations;
        self.run_with_limit(input, max_iterations).await
    }

    /// Run the loop with tool calling, allowing at most `max_iterations`
    /// completion calls
    pub async fn run_with_limit(&mut self, input: &str, max_iterations: u32) -> Result<RunOutcome> {
        info!(agent = %self.name, "run started");
        self.clear_history();
        self.history = self.context.build_messages(input);

        let descriptors = self.tools.definitions();
        let mut iteration = 0;

        while iteration < max_iterations {
            iteration += 1;
            debug!(agent = %self.name, iteration, "awaiting completion");

            let params = ChatParams {
                model: self.config.model.clone(),
                messages: self.history.clone(),
                tools: descriptors.clone(),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                tool_choice: ToolChoice::Auto,
            };

            let response = match self.provider.chat(params).await {
                Ok(response) => response,
                Err(e) => match self.config.gateway_policy {
                    GatewayPolicy::Degrade => {
                        warn!(agent = %self.name, "completion failed, degrading: {}", e);
                        ChatResponse::error(GATEWAY_APOLOGY)
                    }
                    GatewayPolicy::Propagate => return Err(AgentError::Provider(e.to_string())),
                },
            };

            if !response.has_tool_calls() {
                let content = response.content.unwrap_or_default();
                ContextBuilder::add_assistant_message(
                    &mut self.history,
                    Some(&content),
                    Vec::new(),
                );
                info!(agent = %self.name, iteration, "run finished with answer");
                return Ok(RunOutcome::Answer(content));
            }

            let tool_calls = response.tool_calls;
            ContextBuilder::add_assistant_message(
                &mut self.history,
                response.content.as_deref(),
                tool_calls.clone(),
            );

            // One at a time, in the order the model issued them
            for tool_call in &tool_calls {
                let result = self.dispatch(tool_call).await;
                ContextBuilder::add_tool_result(
                    &mut self.history,
                    &tool_call.id,
                    &tool_call.name,
                    &result,
                );
            }
        }

        warn!(agent = %self.name, iterations = iteration, "iteration budget exhausted");
        Ok(RunOutcome::Exhausted {
            iterations: iteration,
        })
    }

    /// Execute one tool call; failures become an error payload for the model
    async fn dispatch(&self, tool_call: &ToolCall) -> String {
        debug!(agent = %self.name, "executing tool: {}", tool_call.name);

        match self
            .tools
            .execute(&tool_call.name, tool_call.arguments.clone())
            .await
        {
            Ok(result) => result,
            Err(AgentError::ToolNotFound(name)) => {
                warn!(agent = %self.name, "model requested unknown tool '{}'", name);
                json!({ "error": format!("tool '{}' not found", name) }).to_string()
            }
            Err(e) => {
                warn!(agent = %self.name, "{}", e);
                json!({ "error": e.to_string() }).to_string()
            }
        }
    }
}
