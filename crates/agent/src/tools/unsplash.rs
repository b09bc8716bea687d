//! Unsplash photo lookup for points of interest

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use tripsmith_provider::{object_schema, ToolDescriptor};

use super::{BoxError, ToolProvider};

pub const POI_PHOTO: &str = "get_poi_photo";

/// Generic travel picture returned when no photo matches
pub const FALLBACK_PHOTO_URL: &str =
    "https://images.unsplash.com/photo-1488646953014-85cb44e25828?q=80&w=1000";

/// REST-backed provider for the Unsplash search API
pub struct UnsplashProvider {
    client: Client,
    access_key: String,
    api_base: String,
    timeout: Duration,
}

impl UnsplashProvider {
    pub fn new(access_key: Option<String>, api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            access_key: access_key.unwrap_or_default(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &tripsmith_config::Config) -> Self {
        Self::new(
            config.unsplash_access_key(),
            config.toolkit.unsplash.api_base.clone(),
            config.unsplash_timeout(),
        )
    }

    pub fn is_configured(&self) -> bool {
        !self.access_key.is_empty()
    }

    pub fn descriptors() -> Vec<ToolDescriptor> {
        vec![ToolDescriptor::new(
            POI_PHOTO,
            "Find a landscape photo of a place by name. Returns an image URL.",
            object_schema(vec![(
                "name",
                "string",
                "Place or sight name, e.g. 'Forbidden City' or '故宫'",
                true,
            )]),
        )]
    }

    /// URL of the best matching photo, or the fallback picture.
    ///
    /// Lookup failures never surface as errors; the fallback is returned.
    pub async fn poi_photo(&self, name: &str) -> String {
        match self.search(name).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!("no photo for '{}'", name);
                FALLBACK_PHOTO_URL.to_string()
            }
            Err(e) => {
                warn!("photo lookup for '{}' failed: {}", name, e);
                FALLBACK_PHOTO_URL.to_string()
            }
        }
    }

    async fn search(&self, name: &str) -> Result<Option<String>, BoxError> {
        if self.access_key.is_empty() {
            return Err("UNSPLASH_ACCESS_KEY not configured".into());
        }

        let response = self
            .client
            .get(format!("{}/search/photos", self.api_base))
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .query(&[("query", name), ("per_page", "1"), ("orientation", "landscape")])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("unsplash returned http {}", status).into());
        }
        let data: Value = response.json().await?;

        Ok(data
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .and_then(|first| first.pointer("/urls/regular"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[derive(Deserialize)]
struct PhotoArgs {
    name: String,
}

#[async_trait]
impl ToolProvider for UnsplashProvider {
    async fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>, BoxError> {
        Ok(Self::descriptors())
    }

    async fn invoke(&self, name: &str, args: Value) -> Result<String, BoxError> {
        match name {
            POI_PHOTO => {
                let args: PhotoArgs = serde_json::from_value(args)?;
                Ok(self.poi_photo(&args.name).await)
            }
            other => Err(format!("unknown unsplash tool '{}'", other).into()),
        }
    }
}
