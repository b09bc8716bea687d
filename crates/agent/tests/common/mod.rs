//! Shared fixtures for agent tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use tripsmith_agent::tools::{BoxError, ToolTrait};
use tripsmith_provider::{
    ChatParams, ChatResponse, Provider, ProviderError, Result as ProviderResult, ToolCall,
};

/// Gateway that replays a fixed script and records every request
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ProviderResult<ChatResponse>>>,
    requests: Mutex<Vec<ChatParams>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<ProviderResult<ChatResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatParams> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat(&self, params: ChatParams) -> ProviderResult<ChatResponse> {
        self.requests.lock().unwrap().push(params);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Api("script exhausted".to_string())))
    }

    fn default_model(&self) -> String {
        "scripted".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// A response requesting one call of `name`
pub fn tool_round(id: &str, name: &str, args: Value) -> ProviderResult<ChatResponse> {
    Ok(ChatResponse::tools(None, vec![ToolCall::new(id, name, args)]))
}

pub fn text(content: &str) -> ProviderResult<ChatResponse> {
    Ok(ChatResponse::text(content))
}

/// Returns a fixed reply
pub struct FixedTool {
    pub name: String,
    pub description: String,
    pub reply: String,
}

impl FixedTool {
    pub fn new(name: &str, reply: &str) -> Self {
        Self {
            name: name.to_string(),
            description: "returns a fixed reply".to_string(),
            reply: reply.to_string(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

#[async_trait]
impl ToolTrait for FixedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<String, BoxError> {
        Ok(self.reply.clone())
    }
}

/// Always fails
pub struct BrokenTool;

#[async_trait]
impl ToolTrait for BrokenTool {
    fn name(&self) -> &str {
        "broken"
    }

    fn description(&self) -> &str {
        "always fails"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<String, BoxError> {
        Err("upstream timed out".into())
    }
}
