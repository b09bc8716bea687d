//! Context builder for assembling agent prompts

use tripsmith_provider::{Message, ToolCall};

/// Builds the seed conversation (system prompt + user turn) for one run
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    system_prompt: Option<String>,
}

impl ContextBuilder {
    pub fn new(system_prompt: Option<String>) -> Self {
        Self {
            system_prompt: system_prompt.filter(|p| !p.trim().is_empty()),
        }
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Fresh message list: optional system prompt followed by the user input
    pub fn build_messages(&self, current_message: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.push(Message::user(current_message));
        messages
    }

    /// Add a tool result to messages
    pub fn add_tool_result(
        messages: &mut Vec<Message>,
        tool_call_id: &str,
        name: &str,
        result: &str,
    ) {
        messages.push(Message::tool(tool_call_id, name, result));
    }

    /// Add an assistant message, carrying its tool calls when there are any
    pub fn add_assistant_message(
        messages: &mut Vec<Message>,
        content: Option<&str>,
        tool_calls: Vec<ToolCall>,
    ) {
        let content = content.unwrap_or("");
        if tool_calls.is_empty() {
            messages.push(Message::assistant(content));
        } else {
            messages.push(Message::assistant_with_tools(content, tool_calls));
        }
    }
}
