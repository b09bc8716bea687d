//! Declarative multi-agent pipeline
//!
//! A pipeline is an ordered list of stages, each backed by its own agent
//! with a distinct system prompt and a keyword-filtered view of the tool
//! provider, followed by one synthesis stage whose answer is coerced into
//! a structured value. Each stage's query is built from the request and
//! every earlier stage's output.

use std::sync::Arc;
use tracing::info;

use tripsmith_agent::{
    Agent, AgentConfig, AgentError, KeywordFilter, StructuredOutput, ToolProvider, ToolRegistry,
};
use tripsmith_provider::Provider;

use crate::{PipelineError, Result};

/// Builds a stage query from the request and earlier stage outputs
pub type QueryBuilder<R> = Box<dyn Fn(&R, &StageOutputs) -> String + Send + Sync>;

/// One tool-using stage
pub struct StageSpec<R> {
    pub name: String,
    pub system_prompt: String,
    /// Tool name keywords; `None` means the stage gets no tools
    pub tools: Option<KeywordFilter>,
    pub build_query: QueryBuilder<R>,
}

impl<R> StageSpec<R> {
    pub fn new<F>(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        keywords: &[&str],
        build_query: F,
    ) -> Self
    where
        F: Fn(&R, &StageOutputs) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            tools: Some(KeywordFilter::new(keywords.iter().copied())),
            build_query: Box::new(build_query),
        }
    }

    /// Stage without tools
    pub fn without_tools(mut self) -> Self {
        self.tools = None;
        self
    }
}

/// Text produced by each completed stage, in order
#[derive(Debug, Clone, Default)]
pub struct StageOutputs {
    entries: Vec<(String, String)>,
}

impl StageOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: impl Into<String>, output: impl Into<String>) {
        self.entries.push((stage.into(), output.into()));
    }

    pub fn get(&self, stage: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, output)| output.as_str())
    }

    /// Output of `stage`, or empty when it has not run
    pub fn text(&self, stage: &str) -> &str {
        self.get(stage).unwrap_or("")
    }
}

struct Stage<P: Provider, R> {
    agent: Agent<P>,
    build_query: QueryBuilder<R>,
}

/// A built pipeline: one agent per stage, each with its own registry
pub struct Pipeline<P: Provider, R> {
    stages: Vec<Stage<P, R>>,
    synthesis: Stage<P, R>,
}

impl<P: Provider, R> Pipeline<P, R> {
    /// Create the stage agents, discovering tools for each from `tools`
    pub async fn build(
        provider: Arc<P>,
        tools: Option<Arc<dyn ToolProvider>>,
        config: AgentConfig,
        stages: Vec<StageSpec<R>>,
        synthesis: StageSpec<R>,
    ) -> Result<Self> {
        let mut built = Vec::with_capacity(stages.len());
        for spec in stages {
            built.push(Self::build_stage(&provider, tools.as_ref(), &config, spec).await?);
        }
        let synthesis = Self::build_stage(&provider, tools.as_ref(), &config, synthesis).await?;

        info!("pipeline ready with {} stages", built.len() + 1);
        Ok(Self {
            stages: built,
            synthesis,
        })
    }

    async fn build_stage(
        provider: &Arc<P>,
        tools: Option<&Arc<dyn ToolProvider>>,
        config: &AgentConfig,
        spec: StageSpec<R>,
    ) -> Result<Stage<P, R>> {
        let mut registry = ToolRegistry::new();
        if let (Some(filter), Some(tools)) = (&spec.tools, tools) {
            registry
                .register_batch(tools.clone(), filter)
                .await
                .map_err(|source| PipelineError::Stage {
                    stage: spec.name.clone(),
                    source,
                })?;
        }
        info!(
            "stage '{}' created with tools {:?}",
            spec.name,
            registry.names()
        );

        let agent = Agent::new(
            spec.name,
            provider.clone(),
            Some(spec.system_prompt),
            config.clone(),
        )
        .with_tools(registry);

        Ok(Stage {
            agent,
            build_query: spec.build_query,
        })
    }

    /// Stage names in execution order, synthesis last
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages
            .iter()
            .chain(std::iter::once(&self.synthesis))
            .map(|s| s.agent.name())
            .collect()
    }

    /// Tool names visible to `stage`
    pub fn stage_tools(&self, stage: &str) -> Option<Vec<String>> {
        self.stages
            .iter()
            .chain(std::iter::once(&self.synthesis))
            .find(|s| s.agent.name() == stage)
            .map(|s| s.agent.tools().names())
    }

    /// Run the tool stages in order; the first failure aborts
    pub async fn run_stages(&mut self, request: &R) -> Result<StageOutputs> {
        let mut outputs = StageOutputs::new();

        for (index, stage) in self.stages.iter_mut().enumerate() {
            let name = stage.agent.name().to_string();
            info!("step {}: {}", index + 1, name);

            let query = (stage.build_query)(request, &outputs);
            let answer = stage
                .agent
                .run(&query)
                .await
                .and_then(|outcome| outcome.into_answer())
                .map_err(|source| stage_error(&name, source))?;
            outputs.push(name, answer);
        }

        Ok(outputs)
    }

    /// Run every stage, then coerce the synthesis answer into `T`
    pub async fn run<T: StructuredOutput>(&mut self, request: &R) -> Result<T> {
        let outputs = self.run_stages(request).await?;

        let name = self.synthesis.agent.name().to_string();
        info!("step {}: {}", self.stages.len() + 1, name);
        let query = (self.synthesis.build_query)(request, &outputs);
        self.synthesis
            .agent
            .run_structured::<T>(&query)
            .await
            .map_err(|source| stage_error(&name, source))
    }
}

fn stage_error(stage: &str, source: AgentError) -> PipelineError {
    tracing::error!("stage '{}' failed: {}", stage, source);
    PipelineError::Stage {
        stage: stage.to_string(),
        source,
    }
}
