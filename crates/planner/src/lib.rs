//! Trip planning pipeline
//!
//! Chains specialized agents (weather, attractions, hotels) and a final
//! synthesis agent into one structured [`TripPlan`].

use thiserror::Error;

pub mod coords;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod trip;

pub use coords::last_coordinate;
pub use model::{
    Attraction, Budget, DayPlan, Hotel, Location, Meal, TripPlan, TripRequest, WeatherInfo,
};
pub use pipeline::{Pipeline, QueryBuilder, StageOutputs, StageSpec};
pub use trip::TripPlanner;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: tripsmith_agent::AgentError,
    },

    #[error("budget calculation failed: {0}")]
    Budget(String),
}

impl PipelineError {
    /// Name of the stage that aborted the run
    pub fn stage(&self) -> Option<&str> {
        match self {
            PipelineError::Stage { stage, .. } => Some(stage),
            PipelineError::InvalidRequest(_) | PipelineError::Budget(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
