//! End-to-end tests for the trip planning pipeline with a scripted gateway

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tripsmith_agent::tools::BoxError;
use tripsmith_agent::{AgentConfig, AgentError, ToolProvider};
use tripsmith_planner::trip::{ATTRACTION_STAGE, HOTEL_STAGE, PLANNER_STAGE, WEATHER_STAGE};
use tripsmith_planner::{PipelineError, TripPlan, TripPlanner, TripRequest};
use tripsmith_provider::{
    ChatParams, ChatResponse, Provider, ProviderError, Result as ProviderResult, Role, ToolCall,
    ToolDescriptor,
};

struct ScriptedProvider {
    script: Mutex<VecDeque<ProviderResult<ChatResponse>>>,
    requests: Mutex<Vec<ChatParams>>,
}

impl ScriptedProvider {
    fn new(script: Vec<ProviderResult<ChatResponse>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatParams> {
        self.requests.lock().unwrap().clone()
    }

    /// User turn of the n-th gateway call
    fn user_query(&self, n: usize) -> String {
        self.requests()[n]
            .messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap()
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

/// Advertises the map tool names and answers every call with canned text
struct MapTools {
    fail_discovery: bool,
}

#[async_trait]
impl ToolProvider for MapTools {
    async fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>, BoxError> {
        if self.fail_discovery {
            return Err("server not running".into());
        }
        Ok([
            "amap_maps_text_search",
            "amap_maps_weather",
            "amap_hotel_search",
            "amap_maps_poi_detail",
            "search_nearby",
            "amap_maps_direction",
            "get_poi_photo",
        ]
        .iter()
        .map(|n| ToolDescriptor::new(*n, "map tool", json!({"type": "object"})))
        .collect())
    }

    async fn invoke(&self, name: &str, _args: Value) -> Result<String, BoxError> {
        Ok(format!("{} result", name))
    }
}

fn tools() -> Option<Arc<dyn ToolProvider>> {
    Some(Arc::new(MapTools {
        fail_discovery: false,
    }))
}

fn request() -> TripRequest {
    TripRequest {
        city: "北京".to_string(),
        start_date: "2025-06-01".to_string(),
        end_date: "2025-06-01".to_string(),
        travel_days: 1,
        transportation: "metro".to_string(),
        accommodation: "budget hotel".to_string(),
        preferences: vec!["history".to_string()],
        free_text_input: String::new(),
    }
}

fn plan_json() -> String {
    json!({
        "city": "北京",
        "start_date": "2025-06-01",
        "end_date": "2025-06-01",
        "travel_days": 1,
        "days": [{
            "date": "2025-06-01",
            "day_index": 1,
            "description": "Forbidden City and Jingshan",
            "weather": "晴",
            "transportation": "metro",
            "accommodation": "budget hotel",
            "hotel": {
                "name": "如家酒店",
                "location": {"longitude": 116.401, "latitude": 39.902},
                "estimated_cost": 300
            },
            "attractions": [{
                "name": "故宫",
                "address": "景山前街4号",
                "location": {"longitude": 116.397029, "latitude": 39.917839},
                "visit_duration": 180,
                "description": "imperial palace",
                "ticket_price": 60
            }],
            "meals": [
                {"type": "breakfast", "name": "包子铺", "estimated_cost": 15},
                {"type": "lunch", "name": "炸酱面", "estimated_cost": 40},
                {"type": "dinner", "name": "烤鸭", "estimated_cost": 150}
            ]
        }],
        "weather_info": [{
            "date": "2025-06-01",
            "day_weather": "晴",
            "night_weather": "晴",
            "day_temp": "25°C",
            "night_temp": 15
        }],
        "overall_suggestions": "Bring sunscreen.",
        "budget": {"total": 99999}
    })
    .to_string()
}

fn text(content: &str) -> ProviderResult<ChatResponse> {
    Ok(ChatResponse::text(content))
}

#[tokio::test]
async fn test_pipeline_threads_stage_outputs() {
    let provider = ScriptedProvider::new(vec![
        text("晴,25°C"),
        text("故宫 address: 景山前街4号, location: 116.397029,39.917839"),
        text("如家酒店 rating 4.5"),
        text(&format!("Here is the plan:\n```json\n{}\n```", plan_json())),
    ]);
    let mut planner = TripPlanner::new(provider.clone(), tools(), AgentConfig::default())
        .await
        .unwrap();

    let plan: TripPlan = planner.plan(&request()).await.unwrap();
    assert_eq!(provider.requests().len(), 4);

    // Stage 2 sees stage 1's output
    assert!(provider.user_query(1).contains("晴,25°C"));
    // Stage 3 is parameterized by the coordinate found in stage 2
    assert!(provider.user_query(2).contains("116.397029,39.917839"));
    // Synthesis aggregates everything
    let synthesis = provider.user_query(3);
    assert!(synthesis.contains("晴,25°C"));
    assert!(synthesis.contains("如家酒店 rating 4.5"));
    assert!(synthesis.contains("\"overall_suggestions\""));

    assert_eq!(plan.days.len(), 1);
    assert_eq!(plan.weather_info[0].day_temp, 25);
    let budget = plan.budget.unwrap();
    assert_eq!(budget.total_attractions, 60);
    assert_eq!(budget.total_hotels, 300);
    assert_eq!(budget.total_meals, 205);
    assert_eq!(budget.total_transportation, 50);
    assert_eq!(budget.total, 615);
}

#[tokio::test]
async fn test_stage_tool_views_are_filtered() {
    let provider = ScriptedProvider::new(vec![]);
    let planner = TripPlanner::new(provider.clone(), tools(), AgentConfig::default())
        .await
        .unwrap();
    let pipeline = planner.pipeline();

    assert_eq!(
        pipeline.stage_names(),
        vec![WEATHER_STAGE, ATTRACTION_STAGE, HOTEL_STAGE, PLANNER_STAGE]
    );
    assert_eq!(
        pipeline.stage_tools(WEATHER_STAGE).unwrap(),
        vec!["amap_maps_weather"]
    );
    assert_eq!(
        pipeline.stage_tools(ATTRACTION_STAGE).unwrap(),
        vec!["amap_maps_text_search", "get_poi_photo"]
    );
    assert_eq!(
        pipeline.stage_tools(HOTEL_STAGE).unwrap(),
        vec!["amap_hotel_search", "amap_maps_poi_detail", "search_nearby"]
    );
    assert!(pipeline.stage_tools(PLANNER_STAGE).unwrap().is_empty());
}

#[tokio::test]
async fn test_stage_tools_are_called() {
    let provider = ScriptedProvider::new(vec![
        Ok(ChatResponse::tools(
            None,
            vec![ToolCall::new("w1", "amap_maps_weather", json!({"city": "北京"}))],
        )),
        text("晴,25°C"),
        text("故宫 116.397029,39.917839"),
        text("如家"),
        text(&plan_json()),
    ]);
    let mut planner = TripPlanner::new(provider.clone(), tools(), AgentConfig::default())
        .await
        .unwrap();

    planner.plan(&request()).await.unwrap();

    let second = &provider.requests()[1];
    let tool_msg = second.messages.last().unwrap();
    assert_eq!(tool_msg.role, Role::Tool);
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some("w1"));
    assert_eq!(tool_msg.content, "amap_maps_weather result");
}

#[tokio::test]
async fn test_exhausted_stage_aborts_pipeline() {
    let looping = || {
        Ok(ChatResponse::tools(
            None,
            vec![ToolCall::new("w", "amap_maps_weather", json!({}))],
        ))
    };
    let provider = ScriptedProvider::new(vec![looping(), looping(), looping()]);
    let config = AgentConfig {
        max_iterations: 2,
        ..AgentConfig::default()
    };
    let mut planner = TripPlanner::new(provider.clone(), tools(), config)
        .await
        .unwrap();

    let err = planner.plan(&request()).await.unwrap_err();
    assert_eq!(err.stage(), Some(WEATHER_STAGE));
    assert!(matches!(
        err,
        PipelineError::Stage {
            source: AgentError::IterationBudgetExceeded { iterations: 2 },
            ..
        }
    ));
    // No later stage ran
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn test_unparseable_plan_aborts_with_raw_text() {
    let provider = ScriptedProvider::new(vec![
        text("晴"),
        text("故宫"),
        text("如家"),
        text("Sorry, I cannot produce a plan."),
    ]);
    let mut planner = TripPlanner::new(provider, tools(), AgentConfig::default())
        .await
        .unwrap();

    match planner.plan(&request()).await {
        Err(PipelineError::Stage { stage, source }) => {
            assert_eq!(stage, PLANNER_STAGE);
            assert_eq!(source.raw_text(), Some("Sorry, I cannot produce a plan."));
        }
        other => panic!("expected synthesis failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_request_rejected_before_any_call() {
    let provider = ScriptedProvider::new(vec![]);
    let mut planner = TripPlanner::new(provider.clone(), tools(), AgentConfig::default())
        .await
        .unwrap();

    let mut req = request();
    req.travel_days = 0;
    let err = planner.plan(&req).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidRequest(_)));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_discovery_failure_fails_build() {
    let provider = ScriptedProvider::new(vec![]);
    let broken: Option<Arc<dyn ToolProvider>> = Some(Arc::new(MapTools {
        fail_discovery: true,
    }));

    match TripPlanner::new(provider, broken, AgentConfig::default()).await {
        Err(PipelineError::Stage { stage, source }) => {
            assert_eq!(stage, WEATHER_STAGE);
            assert!(matches!(source, AgentError::Discovery(_)));
        }
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("build should fail"),
    }
}

#[tokio::test]
async fn test_runs_without_tool_provider() {
    let provider = ScriptedProvider::new(vec![
        text("晴"),
        text("故宫"),
        text("如家"),
        text(&plan_json()),
    ]);
    let mut planner = TripPlanner::new(provider.clone(), None, AgentConfig::default())
        .await
        .unwrap();

    let plan = planner.plan(&request()).await.unwrap();
    assert_eq!(plan.city, "北京");
    assert!(provider.requests().iter().all(|r| r.tools.is_empty()));
    // Without a coordinate the hotel stage searches by city
    assert!(provider.user_query(2).contains("in 北京"));
}
