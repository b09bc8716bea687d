//! Amap map service tools: place search, weather, hotels, POI detail,
//! nearby search and route planning

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use tripsmith_provider::{object_schema, ToolDescriptor};

use super::{BoxError, ToolProvider};

pub const TEXT_SEARCH: &str = "amap_maps_text_search";
pub const WEATHER: &str = "amap_maps_weather";
pub const HOTEL_SEARCH: &str = "amap_hotel_search";
pub const POI_DETAIL: &str = "amap_maps_poi_detail";
pub const SEARCH_NEARBY: &str = "search_nearby";
pub const DIRECTION: &str = "amap_maps_direction";

/// Hotel & lodging POI type code
const HOTEL_POI_TYPE: &str = "100000";

static EMPTY: Value = Value::Null;

/// REST-backed provider for the Amap web service
pub struct AmapProvider {
    client: Client,
    api_key: String,
    api_base: String,
    timeout: Duration,
}

impl AmapProvider {
    pub fn new(api_key: Option<String>, api_base: impl Into<String>, timeout: Duration) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("AMAP_API_KEY").ok())
            .unwrap_or_default();
        Self {
            client: Client::new(),
            api_key,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &tripsmith_config::Config) -> Self {
        Self::new(
            config.amap_api_key(),
            config.toolkit.amap.api_base.clone(),
            config.amap_timeout(),
        )
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn descriptors() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(
                TEXT_SEARCH,
                "Search places, sights, hotels or restaurants by keyword. Returns name, address, id and coordinates.",
                object_schema(vec![
                    ("keywords", "string", "Search keywords, e.g. '故宫'", true),
                    ("city", "string", "City name or adcode", false),
                ]),
            ),
            ToolDescriptor::new(
                WEATHER,
                "Weather for a city. Set forecast=true for the next days instead of live conditions.",
                object_schema(vec![
                    ("city", "string", "City name or adcode", true),
                    ("forecast", "boolean", "Return the multi-day forecast", false),
                ]),
            ),
            ToolDescriptor::new(
                HOTEL_SEARCH,
                "Search hotels in a city with rating and average price.",
                object_schema(vec![
                    ("city", "string", "City name or adcode", true),
                    ("keywords", "string", "Search keywords, defaults to '酒店'", false),
                ]),
            ),
            ToolDescriptor::new(
                POI_DETAIL,
                "Details of a place by POI id: rating, cost, address, phone.",
                object_schema(vec![("poi_id", "string", "POI id from a search", true)]),
            ),
            ToolDescriptor::new(
                SEARCH_NEARBY,
                "Search places of a kind around a coordinate.",
                object_schema(vec![
                    ("location", "string", "Center as 'longitude,latitude'", true),
                    ("keyword", "string", "What to look for, e.g. '酒店'", true),
                    ("radius", "integer", "Radius in meters, default 3000", false),
                ]),
            ),
            ToolDescriptor::new(
                DIRECTION,
                "Route distance and duration between two coordinates.",
                object_schema(vec![
                    ("origin", "string", "Start as 'longitude,latitude'", true),
                    ("destination", "string", "End as 'longitude,latitude'", true),
                    ("mode", "string", "driving, walking or bicycling", false),
                ]),
            ),
        ]
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, BoxError> {
        let url = format!("{}{}", self.api_base, path);
        debug!("amap request {}", path);

        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("key", self.api_key.clone()));
        query.push(("output", "json".to_string()));

        let response = self
            .client
            .get(&url)
            .query(&query)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("amap returned http {}", status).into());
        }
        Ok(response.json().await?)
    }

    async fn text_search(&self, args: TextSearchArgs) -> Result<String, BoxError> {
        let mut params = vec![
            ("keywords", args.keywords.clone()),
            ("offset", "3".to_string()),
            ("page", "1".to_string()),
        ];
        if let Some(city) = args.city {
            params.push(("city", city));
        }
        let data = self.get("/v3/place/text", &params).await?;
        if !succeeded(&data) {
            return Ok(format!("Search failed: {}", info(&data)));
        }

        let pois = list(&data, "pois");
        if pois.is_empty() {
            return Ok(format!("No places found for '{}'.", args.keywords));
        }
        Ok(pois
            .iter()
            .map(|p| {
                format!(
                    "name: {}, address: {}, id: {}, location: {}",
                    field(p, "name"),
                    field(p, "address"),
                    field(p, "id"),
                    field(p, "location")
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn weather(&self, args: WeatherArgs) -> Result<String, BoxError> {
        let extensions = if args.forecast { "all" } else { "base" };
        let params = vec![
            ("city", args.city.clone()),
            ("extensions", extensions.to_string()),
        ];
        let data = self.get("/v3/weather/weatherInfo", &params).await?;
        if !succeeded(&data) {
            return Ok(format!("Weather query failed: {}", info(&data)));
        }

        if args.forecast {
            let forecast = list(&data, "forecasts");
            let Some(first) = forecast.first() else {
                return Ok(format!("No forecast for {}.", args.city));
            };
            let mut lines = vec![format!("forecast for {}:", field(first, "city"))];
            for cast in list(first, "casts") {
                lines.push(format!(
                    "{}: day {} {}°C, night {} {}°C, wind {} {}",
                    field(cast, "date"),
                    field(cast, "dayweather"),
                    field(cast, "daytemp"),
                    field(cast, "nightweather"),
                    field(cast, "nighttemp"),
                    field(cast, "daywind"),
                    field(cast, "daypower")
                ));
            }
            return Ok(lines.join("\n"));
        }

        let lives = list(&data, "lives");
        let Some(w) = lives.first() else {
            return Ok(format!("No weather for {}.", args.city));
        };
        Ok(format!(
            "city: {}, weather: {}, temperature: {}°C, wind: {}, humidity: {}%",
            field(w, "city"),
            field(w, "weather"),
            field(w, "temperature"),
            field(w, "winddirection"),
            field(w, "humidity")
        ))
    }

    async fn hotel_search(&self, args: HotelSearchArgs) -> Result<String, BoxError> {
        let keywords = args.keywords.unwrap_or_else(|| "酒店".to_string());
        let params = vec![
            ("keywords", keywords),
            ("city", args.city.clone()),
            ("types", HOTEL_POI_TYPE.to_string()),
            ("offset", "5".to_string()),
            ("page", "1".to_string()),
            ("extensions", "all".to_string()),
        ];
        let data = self.get("/v3/place/text", &params).await?;
        if !succeeded(&data) {
            return Ok(format!("Hotel search failed: {}", info(&data)));
        }

        let pois = list(&data, "pois");
        if pois.is_empty() {
            return Ok(format!("No hotels found in {}.", args.city));
        }
        let mut lines = vec![format!("hotels in {}:", args.city)];
        for (i, p) in pois.iter().take(3).enumerate() {
            let biz = p.get("biz_ext").unwrap_or(&EMPTY);
            lines.push(format!(
                "{}. {} - rating: {}, average price: {}, address: {}, location: {}",
                i + 1,
                field(p, "name"),
                field_or(biz, "rating", "n/a"),
                field_or(biz, "cost", "n/a"),
                field(p, "address"),
                field(p, "location")
            ));
        }
        Ok(lines.join("\n"))
    }

    async fn poi_detail(&self, args: PoiDetailArgs) -> Result<String, BoxError> {
        let data = self
            .get("/v3/place/detail", &[("id", args.poi_id.clone())])
            .await?;
        if !succeeded(&data) {
            return Ok(format!("Detail query failed: {}", info(&data)));
        }

        let pois = list(&data, "pois");
        let Some(p) = pois.first() else {
            return Ok(format!("No details for {}.", args.poi_id));
        };
        let biz = p.get("biz_ext").unwrap_or(&EMPTY);
        Ok(format!(
            "[{}] rating: {}, cost: {}, address: {}, tel: {}, location: {}",
            field(p, "name"),
            field_or(biz, "rating", "n/a"),
            field_or(biz, "cost", "n/a"),
            field(p, "address"),
            field_or(p, "tel", "n/a"),
            field(p, "location")
        ))
    }

    async fn search_nearby(&self, args: NearbyArgs) -> Result<String, BoxError> {
        let radius = args.radius.unwrap_or(3000);
        let params = vec![
            ("location", args.location.clone()),
            ("keywords", args.keyword.clone()),
            ("radius", radius.to_string()),
            ("offset", "5".to_string()),
            ("page", "1".to_string()),
            ("extensions", "all".to_string()),
        ];
        let data = self.get("/v3/place/around", &params).await?;
        let pois = list(&data, "pois");
        if !succeeded(&data) || pois.is_empty() {
            return Ok(format!(
                "No {} found within {}m of {}.",
                args.keyword, radius, args.location
            ));
        }
        Ok(pois
            .iter()
            .map(|p| {
                format!(
                    "{} (distance: {}m, address: {}, location: {})",
                    field(p, "name"),
                    field(p, "distance"),
                    field(p, "address"),
                    field(p, "location")
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn direction(&self, args: DirectionArgs) -> Result<String, BoxError> {
        let mode = args.mode.as_deref().unwrap_or("driving");
        let path = match mode {
            "walking" => "/v3/direction/walking",
            "bicycling" => "/v4/direction/bicycling",
            _ => "/v3/direction/driving",
        };
        let params = vec![
            ("origin", args.origin.clone()),
            ("destination", args.destination.clone()),
        ];
        let data = self.get(path, &params).await?;

        // v3 nests paths under `route`, v4 under `data`
        let ok = succeeded(&data) || data.get("errcode").and_then(Value::as_i64) == Some(0);
        let route = data.get("route").or_else(|| data.get("data"));
        let first_path = route.and_then(|r| list(r, "paths").first().copied());
        match (ok, first_path) {
            (true, Some(p)) => {
                let distance_km = number(p, "distance") / 1000.0;
                let minutes = (number(p, "duration") / 60.0).floor();
                Ok(format!(
                    "route ({}): about {:.2} km, about {} minutes.",
                    mode, distance_km, minutes
                ))
            }
            _ => Ok(format!(
                "Route planning failed: {}",
                data.get("errmsg")
                    .and_then(Value::as_str)
                    .unwrap_or_else(|| info(&data))
            )),
        }
    }
}

#[async_trait]
impl ToolProvider for AmapProvider {
    async fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>, BoxError> {
        Ok(Self::descriptors())
    }

    async fn invoke(&self, name: &str, args: Value) -> Result<String, BoxError> {
        if self.api_key.is_empty() {
            return Ok("Error: AMAP_API_KEY not configured".to_string());
        }
        match name {
            TEXT_SEARCH => self.text_search(serde_json::from_value(args)?).await,
            WEATHER => self.weather(serde_json::from_value(args)?).await,
            HOTEL_SEARCH => self.hotel_search(serde_json::from_value(args)?).await,
            POI_DETAIL => self.poi_detail(serde_json::from_value(args)?).await,
            SEARCH_NEARBY => self.search_nearby(serde_json::from_value(args)?).await,
            DIRECTION => self.direction(serde_json::from_value(args)?).await,
            other => Err(format!("unknown amap tool '{}'", other).into()),
        }
    }
}

#[derive(Deserialize)]
struct TextSearchArgs {
    keywords: String,
    city: Option<String>,
}

#[derive(Deserialize)]
struct WeatherArgs {
    city: String,
    #[serde(default)]
    forecast: bool,
}

#[derive(Deserialize)]
struct HotelSearchArgs {
    city: String,
    keywords: Option<String>,
}

#[derive(Deserialize)]
struct PoiDetailArgs {
    poi_id: String,
}

#[derive(Deserialize)]
struct NearbyArgs {
    location: String,
    keyword: String,
    radius: Option<u32>,
}

#[derive(Deserialize)]
struct DirectionArgs {
    origin: String,
    destination: String,
    mode: Option<String>,
}

fn succeeded(data: &Value) -> bool {
    data.get("status").and_then(Value::as_str) == Some("1")
}

fn info(data: &Value) -> &str {
    data.get("info")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
}

fn list<'a>(data: &'a Value, key: &str) -> Vec<&'a Value> {
    data.get(key)
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default()
}

// Amap sends `[]` instead of a string for empty fields
fn field<'a>(v: &'a Value, key: &str) -> &'a str {
    field_or(v, key, "")
}

fn field_or<'a>(v: &'a Value, key: &str, fallback: &'a str) -> &'a str {
    v.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
}

fn number(v: &Value, key: &str) -> f64 {
    match v.get(key) {
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}
