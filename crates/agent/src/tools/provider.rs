//! Capability-discovery providers and the tool wrapper they expand into

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use tripsmith_provider::ToolDescriptor;

use super::{BoxError, ToolTrait};

/// An external source of tools, e.g. a map service or an MCP server session
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Advertised tools, in provider order
    async fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>, BoxError>;

    /// Invoke one advertised tool by name
    async fn invoke(&self, name: &str, args: Value) -> Result<String, BoxError>;
}

/// One discovered tool, dispatching back to its provider
pub struct ProviderTool {
    descriptor: ToolDescriptor,
    provider: Arc<dyn ToolProvider>,
}

impl ProviderTool {
    pub fn new(descriptor: ToolDescriptor, provider: Arc<dyn ToolProvider>) -> Self {
        Self {
            descriptor,
            provider,
        }
    }
}

#[async_trait]
impl ToolTrait for ProviderTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn parameters(&self) -> Value {
        self.descriptor.parameters.clone()
    }

    async fn execute(&self, args: Value) -> Result<String, BoxError> {
        debug!("forwarding '{}' to provider", self.descriptor.name);
        self.provider.invoke(&self.descriptor.name, args).await
    }
}

/// Several providers advertised as one; each call goes to the provider
/// that lists the tool. Earlier providers win on duplicate names.
#[derive(Default)]
pub struct CompositeProvider {
    providers: Vec<Arc<dyn ToolProvider>>,
}

impl CompositeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl ToolProvider for CompositeProvider {
    async fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>, BoxError> {
        let mut all: Vec<ToolDescriptor> = Vec::new();
        for provider in &self.providers {
            for descriptor in provider.list_descriptors().await? {
                if !all.iter().any(|d| d.name == descriptor.name) {
                    all.push(descriptor);
                }
            }
        }
        Ok(all)
    }

    async fn invoke(&self, name: &str, args: Value) -> Result<String, BoxError> {
        for provider in &self.providers {
            let descriptors = provider.list_descriptors().await?;
            if descriptors.iter().any(|d| d.name == name) {
                return provider.invoke(name, args).await;
            }
        }
        Err(format!("no provider offers '{}'", name).into())
    }
}
