//! The trip planning pipeline: weather, attractions, hotels, synthesis

use std::sync::Arc;
use tracing::info;

use tripsmith_agent::{AgentConfig, ToolProvider};
use tripsmith_provider::Provider;

use crate::coords::last_coordinate;
use crate::model::{TripPlan, TripRequest};
use crate::pipeline::{Pipeline, StageOutputs, StageSpec};
use crate::prompts;
use crate::{PipelineError, Result};

pub const WEATHER_STAGE: &str = "weather";
pub const ATTRACTION_STAGE: &str = "attractions";
pub const HOTEL_STAGE: &str = "hotels";
pub const PLANNER_STAGE: &str = "planner";

fn weather_query(req: &TripRequest, _: &StageOutputs) -> String {
    format!(
        "What is the weather forecast for {} from {} to {}?",
        req.city, req.start_date, req.end_date
    )
}

fn attraction_query(req: &TripRequest, outputs: &StageOutputs) -> String {
    let interests = if req.preferences.is_empty() {
        "popular sights".to_string()
    } else {
        req.preference_list()
    };
    format!(
        "Given this weather outlook:\n{}\n\nFind attractions in {} matching: {}.",
        outputs.text(WEATHER_STAGE),
        req.city,
        interests
    )
}

fn hotel_query(req: &TripRequest, outputs: &StageOutputs) -> String {
    match last_coordinate(outputs.text(ATTRACTION_STAGE)) {
        Some(coord) => format!(
            "Find hotels near coordinate {} that fit '{}' or have good transit access.",
            coord, req.accommodation
        ),
        None => format!(
            "Find hotels in {} that fit '{}' or have good transit access.",
            req.city, req.accommodation
        ),
    }
}

fn planner_query(req: &TripRequest, outputs: &StageOutputs) -> String {
    let notes = if req.free_text_input.trim().is_empty() {
        "none"
    } else {
        req.free_text_input.as_str()
    };
    format!(
        "Plan this trip.\n\n\
         ## Request\n\
         - destination: {city}\n\
         - dates: {start} to {end} ({days} days)\n\
         - transportation / accommodation: {transport} / {lodging}\n\
         - interests: {interests}\n\
         - notes: {notes}\n\n\
         ## Attractions\n{attractions}\n\n\
         ## Weather\n{weather}\n\n\
         ## Hotels\n{hotels}\n\n\
         ## Requirements\n\
         1. Two or three attractions per day.\n\
         2. Every day lists `attractions` and at least three `meals`.\n\
         3. Every day recommends one hotel from the hotel research.\n\
         4. Account for distances and the chosen transportation.\n\
         5. `overall_suggestions` gives clothing and travel advice for the weather.",
        city = req.city,
        start = req.start_date,
        end = req.end_date,
        days = req.travel_days,
        transport = req.transportation,
        lodging = req.accommodation,
        interests = req.preference_list(),
        notes = notes,
        attractions = outputs.text(ATTRACTION_STAGE),
        weather = outputs.text(WEATHER_STAGE),
        hotels = outputs.text(HOTEL_STAGE),
    )
}

/// Tool stages in execution order
pub fn trip_stages() -> Vec<StageSpec<TripRequest>> {
    vec![
        StageSpec::new(WEATHER_STAGE, prompts::WEATHER, &["weather"], weather_query),
        StageSpec::new(
            ATTRACTION_STAGE,
            prompts::ATTRACTIONS,
            &["text_search", "photo"],
            attraction_query,
        ),
        StageSpec::new(
            HOTEL_STAGE,
            prompts::HOTELS,
            &["hotel", "poi_detail", "search_nearby"],
            hotel_query,
        ),
    ]
}

pub fn synthesis_stage() -> StageSpec<TripRequest> {
    StageSpec::new(PLANNER_STAGE, prompts::PLANNER, &[], planner_query).without_tools()
}

/// Multi-agent trip planner
pub struct TripPlanner<P: Provider> {
    pipeline: Pipeline<P, TripRequest>,
}

impl<P: Provider> TripPlanner<P> {
    pub async fn new(
        provider: Arc<P>,
        tools: Option<Arc<dyn ToolProvider>>,
        config: AgentConfig,
    ) -> Result<Self> {
        let pipeline =
            Pipeline::build(provider, tools, config, trip_stages(), synthesis_stage()).await?;
        Ok(Self { pipeline })
    }

    pub fn pipeline(&self) -> &Pipeline<P, TripRequest> {
        &self.pipeline
    }

    /// Validate the request, run all stages and attach the computed budget
    pub async fn plan(&mut self, request: &TripRequest) -> Result<TripPlan> {
        request.validate().map_err(PipelineError::InvalidRequest)?;
        info!(
            "planning {} days in {} ({} - {})",
            request.travel_days, request.city, request.start_date, request.end_date
        );

        let mut plan: TripPlan = self.pipeline.run(request).await?;
        plan.apply_budget().map_err(PipelineError::Budget)?;
        info!("plan ready: {} days", plan.days.len());
        Ok(plan)
    }
}
