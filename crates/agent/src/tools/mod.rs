//! Tool registry

pub mod amap;
pub mod provider;
pub mod unsplash;

pub use amap::AmapProvider;
pub use provider::{CompositeProvider, ProviderTool, ToolProvider};
pub use unsplash::UnsplashProvider;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use tripsmith_provider::ToolDescriptor;

use crate::{AgentError, Result};

/// Error type returned by tool bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type BoxedTool = Box<dyn ToolTrait + Send + Sync>;

/// A single invocable capability
#[async_trait]
pub trait ToolTrait: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    async fn execute(&self, args: Value) -> std::result::Result<String, BoxError>;
}

pub fn to_descriptor(tool: &dyn ToolTrait) -> ToolDescriptor {
    ToolDescriptor::new(tool.name(), tool.description(), tool.parameters())
}

/// Substring filter over tool names; empty matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn matches(&self, name: &str) -> bool {
        self.keywords.is_empty() || self.keywords.iter().any(|kw| name.contains(kw.as_str()))
    }
}

/// What can be added to a registry
pub enum ToolSource {
    /// One capability registered as-is
    Single(BoxedTool),
    /// Every capability a provider advertises, narrowed by a name filter
    Batch {
        provider: Arc<dyn ToolProvider>,
        filter: KeywordFilter,
    },
}

impl ToolSource {
    pub fn single<T: ToolTrait + 'static>(tool: T) -> Self {
        ToolSource::Single(Box::new(tool))
    }

    pub fn batch(provider: Arc<dyn ToolProvider>, filter: KeywordFilter) -> Self {
        ToolSource::Batch { provider, filter }
    }
}

/// Tools keyed by name; registering a name again replaces the earlier entry
pub struct ToolRegistry {
    tools: BTreeMap<String, BoxedTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    pub fn register<T: ToolTrait + 'static>(&mut self, tool: T) {
        self.insert(Box::new(tool));
    }

    fn insert(&mut self, tool: BoxedTool) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            debug!("tool '{}' replaced", name);
        } else {
            debug!("tool '{}' registered", name);
        }
    }

    /// Discover a provider's tools and register those passing `filter`.
    /// Returns the number registered.
    pub async fn register_batch(
        &mut self,
        provider: Arc<dyn ToolProvider>,
        filter: &KeywordFilter,
    ) -> Result<usize> {
        let descriptors = provider
            .list_descriptors()
            .await
            .map_err(|e| AgentError::Discovery(e.to_string()))?;

        let mut count = 0;
        for descriptor in descriptors {
            if !filter.matches(&descriptor.name) {
                continue;
            }
            self.insert(Box::new(ProviderTool::new(descriptor, provider.clone())));
            count += 1;
        }

        info!(
            "registered {} provider tools (filter: {:?})",
            count,
            filter.keywords()
        );
        Ok(count)
    }

    /// Register from a tagged source
    pub async fn add(&mut self, source: ToolSource) -> Result<usize> {
        match source {
            ToolSource::Single(tool) => {
                self.insert(tool);
                Ok(1)
            }
            ToolSource::Batch { provider, filter } => self.register_batch(provider, &filter).await,
        }
    }

    pub fn get(&self, name: &str) -> Option<&(dyn ToolTrait + Send + Sync)> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors for every registered tool, ordered by name
    pub fn definitions(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| to_descriptor(t.as_ref())).collect()
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        tool.execute(args)
            .await
            .map_err(|e| AgentError::ToolExecution {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
