//! Tests for tool registry

mod common;

use async_trait::async_trait;
use common::FixedTool;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tripsmith_agent::tools::{BoxError, KeywordFilter, ToolProvider, ToolRegistry, ToolSource};
use tripsmith_agent::AgentError;
use tripsmith_provider::ToolDescriptor;

/// Provider advertising a fixed set of names and echoing invocations
struct FakeProvider {
    names: Vec<&'static str>,
    invocations: AtomicUsize,
}

impl FakeProvider {
    fn new(names: Vec<&'static str>) -> Self {
        Self {
            names,
            invocations: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ToolProvider for FakeProvider {
    async fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>, BoxError> {
        Ok(self
            .names
            .iter()
            .map(|n| ToolDescriptor::new(*n, format!("{} tool", n), json!({"type": "object"})))
            .collect())
    }

    async fn invoke(&self, name: &str, args: Value) -> Result<String, BoxError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{} <- {}", name, args))
    }
}

struct OfflineProvider;

#[async_trait]
impl ToolProvider for OfflineProvider {
    async fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>, BoxError> {
        Err("connection refused".into())
    }

    async fn invoke(&self, _name: &str, _args: Value) -> Result<String, BoxError> {
        Err("connection refused".into())
    }
}

#[test]
fn test_registry_new() {
    let registry = ToolRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.names().is_empty());
}

#[test]
fn test_registry_register_and_get() {
    let mut registry = ToolRegistry::new();
    registry.register(FixedTool::new("amap_maps_weather", "晴"));

    assert_eq!(registry.len(), 1);
    assert!(registry.has("amap_maps_weather"));
    assert_eq!(registry.get("amap_maps_weather").unwrap().name(), "amap_maps_weather");
    assert!(registry.get("nonexistent").is_none());
}

#[tokio::test]
async fn test_registry_same_name_last_wins() {
    let mut registry = ToolRegistry::new();
    registry.register(FixedTool::new("lookup", "first").with_description("old lookup"));
    registry.register(FixedTool::new("lookup", "second").with_description("new lookup"));

    assert_eq!(registry.len(), 1);
    let definitions = registry.definitions();
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].description, "new lookup");
    assert_eq!(registry.get("lookup").unwrap().description(), "new lookup");
    assert_eq!(registry.execute("lookup", json!({})).await.unwrap(), "second");
}

#[test]
fn test_registry_definitions_sorted_by_name() {
    let mut registry = ToolRegistry::new();
    registry.register(FixedTool::new("search_nearby", ""));
    registry.register(FixedTool::new("amap_hotel_search", ""));
    registry.register(FixedTool::new("amap_maps_poi_detail", ""));

    let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
    assert_eq!(
        names,
        vec!["amap_hotel_search", "amap_maps_poi_detail", "search_nearby"]
    );
}

#[tokio::test]
async fn test_registry_execute_missing() {
    let registry = ToolRegistry::new();
    match registry.execute("nope", json!({})).await {
        Err(AgentError::ToolNotFound(name)) => assert_eq!(name, "nope"),
        other => panic!("expected ToolNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_registry_execute_failure() {
    let mut registry = ToolRegistry::new();
    registry.register(common::BrokenTool);
    match registry.execute("broken", json!({})).await {
        Err(AgentError::ToolExecution { name, message }) => {
            assert_eq!(name, "broken");
            assert_eq!(message, "upstream timed out");
        }
        other => panic!("expected ToolExecution, got {:?}", other),
    }
}

#[tokio::test]
async fn test_register_batch_with_filter() {
    let provider = Arc::new(FakeProvider::new(vec![
        "amap_maps_weather",
        "amap_hotel_search",
        "amap_maps_poi_detail",
        "search_nearby",
        "amap_maps_text_search",
    ]));
    let mut registry = ToolRegistry::new();
    let filter = KeywordFilter::new(["hotel", "poi", "nearby"]);

    let count = registry.register_batch(provider.clone(), &filter).await.unwrap();
    assert_eq!(count, 3);
    assert_eq!(
        registry.names(),
        vec!["amap_hotel_search", "amap_maps_poi_detail", "search_nearby"]
    );

    let out = registry
        .execute("search_nearby", json!({"keyword": "酒店"}))
        .await
        .unwrap();
    assert!(out.starts_with("search_nearby <- "));
    assert_eq!(provider.invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_register_batch_empty_filter_takes_all() {
    let provider = Arc::new(FakeProvider::new(vec!["a", "b", "c"]));
    let mut registry = ToolRegistry::new();
    let count = registry.register_batch(provider, &KeywordFilter::all()).await.unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_register_batch_discovery_failure() {
    let mut registry = ToolRegistry::new();
    match registry
        .register_batch(Arc::new(OfflineProvider), &KeywordFilter::all())
        .await
    {
        Err(AgentError::Discovery(msg)) => assert!(msg.contains("connection refused")),
        other => panic!("expected Discovery error, got {:?}", other),
    }
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_add_tool_sources() {
    let mut registry = ToolRegistry::new();
    let single = registry
        .add(ToolSource::single(FixedTool::new("amap_maps_weather", "阴")))
        .await
        .unwrap();
    let batch = registry
        .add(ToolSource::batch(
            Arc::new(FakeProvider::new(vec!["amap_maps_weather", "amap_maps_direction"])),
            KeywordFilter::new(["maps"]),
        ))
        .await
        .unwrap();

    assert_eq!(single, 1);
    assert_eq!(batch, 2);
    assert_eq!(registry.len(), 2);

    // The batch registration replaced the single tool of the same name
    let out = registry.execute("amap_maps_weather", json!({})).await.unwrap();
    assert!(out.starts_with("amap_maps_weather <- "));
}

#[test]
fn test_registries_are_independent() {
    let mut weather = ToolRegistry::new();
    weather.register(FixedTool::new("amap_maps_weather", ""));
    let mut hotels = ToolRegistry::new();
    hotels.register(FixedTool::new("amap_hotel_search", ""));

    assert!(!weather.has("amap_hotel_search"));
    assert!(!hotels.has("amap_maps_weather"));
}
