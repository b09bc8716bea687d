//! Tests for Config serialization, defaults and file round trips

use tripsmith_config::{AgentDefaults, AmapConfig, Config, ProviderConfig};
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.agent.max_tokens, 4096);
    assert_eq!(config.agent.temperature, 0.7);
    assert_eq!(config.agent.max_iterations, 5);
    assert_eq!(config.agent.request_timeout_secs, 60);

    assert!(config.provider.api_key.is_empty());
    assert!(config.provider.api_base.is_none());
    assert!(config.provider.model.is_empty());

    assert!(config.toolkit.amap.api_key.is_empty());
    assert_eq!(config.toolkit.amap.api_base, "https://restapi.amap.com");
    assert_eq!(config.toolkit.amap.request_timeout_secs, 10);

    assert!(config.toolkit.unsplash.access_key.is_empty());
    assert_eq!(config.toolkit.unsplash.api_base, "https://api.unsplash.com");
}

#[test]
fn test_partial_json_fills_defaults() {
    let json = r#"{ "agent": { "max_iterations": 8 }, "provider": { "model": "qwen-plus" } }"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.agent.max_iterations, 8);
    assert_eq!(config.agent.max_tokens, 4096);
    assert_eq!(config.provider.model, "qwen-plus");
    assert_eq!(config.toolkit.amap.api_base, "https://restapi.amap.com");
}

#[test]
fn test_empty_json_is_default() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config.agent.max_iterations, AgentDefaults::default().max_iterations);
    assert_eq!(config.toolkit.amap.api_base, AmapConfig::default().api_base);
}

#[test]
fn test_api_base_omitted_when_none() {
    let config = Config::default();
    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("api_base\":null"));
}

#[test]
fn test_timeouts() {
    let mut config = Config::default();
    config.agent.request_timeout_secs = 5;
    config.toolkit.amap.request_timeout_secs = 2;
    config.toolkit.unsplash.request_timeout_secs = 3;
    assert_eq!(config.request_timeout().as_secs(), 5);
    assert_eq!(config.amap_timeout().as_secs(), 2);
    assert_eq!(config.unsplash_timeout().as_secs(), 3);
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = temp_dir();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.provider = ProviderConfig {
        api_key: "sk-test".to_string(),
        api_base: Some("https://llm.example.com/v1".to_string()),
        model: "qwen-plus".to_string(),
    };
    config.agent.temperature = 0.2;
    config.toolkit.amap.api_key = "amap-key".to_string();

    config.save_to(&path).await.unwrap();
    assert!(path.exists());

    let loaded = Config::load_from(&path).await.unwrap();
    assert_eq!(loaded.provider.api_key, "sk-test");
    assert_eq!(loaded.provider.api_base.as_deref(), Some("https://llm.example.com/v1"));
    assert_eq!(loaded.agent.temperature, 0.2);
    assert_eq!(loaded.toolkit.amap.api_key, "amap-key");
}

#[tokio::test]
async fn test_load_missing_file_returns_defaults() {
    let dir = temp_dir();
    let config = Config::load_from(&dir.path().join("absent.json")).await.unwrap();
    assert_eq!(config.agent.max_iterations, 5);
}

#[tokio::test]
async fn test_load_invalid_json_errors() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = Config::load_from(&path).await;
    assert!(matches!(result, Err(tripsmith_config::ConfigError::Json(_))));
}
