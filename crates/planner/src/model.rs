//! Trip request and plan types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tripsmith_agent::StructuredOutput;

/// Flat transportation estimate per travel day, in yuan
pub const TRANSPORT_PER_DAY: i64 = 50;

pub const MAX_TRAVEL_DAYS: u32 = 30;

/// Largest magnitude accepted for any model-supplied amount
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A travel planning request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripRequest {
    pub city: String,
    pub start_date: String,
    pub end_date: String,
    pub travel_days: u32,
    pub transportation: String,
    pub accommodation: String,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub free_text_input: String,
}

impl TripRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.city.trim().is_empty() {
            return Err("city must not be empty".to_string());
        }
        if !(1..=MAX_TRAVEL_DAYS).contains(&self.travel_days) {
            return Err(format!(
                "travel_days must be between 1 and {}, got {}",
                MAX_TRAVEL_DAYS, self.travel_days
            ));
        }
        let start = parse_date("start_date", &self.start_date)?;
        let end = parse_date("end_date", &self.end_date)?;
        if end < start {
            return Err(format!(
                "end_date {} is before start_date {}",
                self.end_date, self.start_date
            ));
        }
        let span = (end - start).num_days() + 1;
        if span != i64::from(self.travel_days) {
            return Err(format!(
                "travel_days {} does not match the {} days from {} to {}",
                self.travel_days, span, self.start_date, self.end_date
            ));
        }
        Ok(())
    }

    /// Preference tags joined for prompts
    pub fn preference_list(&self) -> String {
        self.preferences.join(", ")
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| format!("{} must be YYYY-MM-DD, got '{}'", field, value))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

impl Location {
    pub fn validate(&self) -> Result<(), String> {
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} out of range", self.longitude));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range", self.latitude));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attraction {
    pub name: String,
    pub address: String,
    pub location: Location,
    /// Suggested visit time in minutes
    #[serde(deserialize_with = "lenient::int")]
    pub visit_duration: i64,
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub ticket_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn default_category() -> String {
    "sight".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meal {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Models sometimes describe the spot in words instead; that is dropped
    #[serde(default, deserialize_with = "lenient::location")]
    pub location: Option<Location>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub estimated_cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hotel {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::location")]
    pub location: Option<Location>,
    #[serde(default)]
    pub price_range: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rating: String,
    #[serde(default)]
    pub distance: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Per night
    #[serde(default, deserialize_with = "lenient::int")]
    pub estimated_cost: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Budget {
    #[serde(default)]
    pub total_attractions: i64,
    #[serde(default)]
    pub total_hotels: i64,
    #[serde(default)]
    pub total_meals: i64,
    #[serde(default)]
    pub total_transportation: i64,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayPlan {
    pub date: String,
    pub day_index: u32,
    pub description: String,
    #[serde(default)]
    pub weather: String,
    pub transportation: String,
    pub accommodation: String,
    #[serde(default)]
    pub hotel: Option<Hotel>,
    #[serde(default)]
    pub attractions: Vec<Attraction>,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherInfo {
    pub date: String,
    pub day_weather: String,
    pub night_weather: String,
    #[serde(deserialize_with = "lenient::temperature")]
    pub day_temp: i64,
    #[serde(deserialize_with = "lenient::temperature")]
    pub night_temp: i64,
    #[serde(default = "unknown")]
    pub wind_direction: String,
    #[serde(default = "unknown")]
    pub wind_power: String,
}

fn unknown() -> String {
    "unknown".to_string()
}

/// The pipeline's final product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripPlan {
    pub city: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default = "one_day")]
    pub travel_days: u32,
    #[serde(default)]
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub weather_info: Vec<WeatherInfo>,
    pub overall_suggestions: String,
    #[serde(default)]
    pub budget: Option<Budget>,
}

fn one_day() -> u32 {
    1
}

fn checked_sum(values: impl IntoIterator<Item = i64>) -> Option<i64> {
    values
        .into_iter()
        .try_fold(0i64, |acc, v| acc.checked_add(v))
}

impl TripPlan {
    /// Sum item costs across all days. Transportation is a flat daily rate.
    ///
    /// `None` when a total does not fit in an `i64`.
    pub fn compute_budget(&self) -> Option<Budget> {
        let days = &self.days;
        let total_attractions = checked_sum(
            days.iter()
                .flat_map(|d| d.attractions.iter().map(|a| a.ticket_price)),
        )?;
        let total_meals =
            checked_sum(days.iter().flat_map(|d| d.meals.iter().map(|m| m.estimated_cost)))?;
        let total_hotels = checked_sum(
            days.iter()
                .filter_map(|d| d.hotel.as_ref().map(|h| h.estimated_cost)),
        )?;
        let total_transportation = TRANSPORT_PER_DAY.checked_mul(i64::from(self.travel_days))?;
        let total = checked_sum([
            total_attractions,
            total_hotels,
            total_meals,
            total_transportation,
        ])?;

        Some(Budget {
            total_attractions,
            total_hotels,
            total_meals,
            total_transportation,
            total,
        })
    }

    /// Replace whatever budget the model produced with the computed one
    pub fn apply_budget(&mut self) -> Result<(), String> {
        let budget = self
            .compute_budget()
            .ok_or_else(|| "budget total out of range".to_string())?;
        self.budget = Some(budget);
        Ok(())
    }
}

impl StructuredOutput for TripPlan {
    fn schema() -> Value {
        json!({
            "city": "city name",
            "start_date": "YYYY-MM-DD",
            "end_date": "YYYY-MM-DD",
            "travel_days": 1,
            "days": [{
                "date": "YYYY-MM-DD",
                "day_index": 1,
                "description": "overview of the day",
                "weather": "sunny",
                "transportation": "metro",
                "accommodation": "budget hotel",
                "hotel": {
                    "name": "hotel name",
                    "address": "address",
                    "location": {"longitude": 116.39, "latitude": 39.91},
                    "price_range": "200-300",
                    "rating": "4.5",
                    "distance": "500m to the metro",
                    "type": "budget hotel",
                    "estimated_cost": 250
                },
                "attractions": [{
                    "name": "sight name",
                    "address": "address",
                    "location": {"longitude": 116.39, "latitude": 39.91},
                    "visit_duration": 120,
                    "description": "why it is worth visiting",
                    "category": "history",
                    "ticket_price": 60,
                    "image_url": "https://images.unsplash.com/photo-id"
                }],
                "meals": [
                    {"type": "breakfast", "name": "place", "description": "dish", "estimated_cost": 20},
                    {"type": "lunch", "name": "place", "description": "dish", "estimated_cost": 50},
                    {"type": "dinner", "name": "place", "description": "dish", "estimated_cost": 80}
                ]
            }],
            "weather_info": [{
                "date": "YYYY-MM-DD",
                "day_weather": "sunny",
                "night_weather": "cloudy",
                "day_temp": 25,
                "night_temp": 15,
                "wind_direction": "southeast",
                "wind_power": "3"
            }],
            "overall_suggestions": "clothing and travel advice based on the weather",
            "budget": {
                "total_attractions": 60,
                "total_hotels": 250,
                "total_meals": 150,
                "total_transportation": 50,
                "total": 510
            }
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.city.trim().is_empty() {
            return Err("city is empty".to_string());
        }
        if self.travel_days == 0 {
            return Err("travel_days must be at least 1".to_string());
        }
        for day in &self.days {
            for attraction in &day.attractions {
                attraction
                    .location
                    .validate()
                    .map_err(|e| format!("attraction '{}': {}", attraction.name, e))?;
                if attraction.visit_duration <= 0 {
                    return Err(format!(
                        "attraction '{}': visit_duration must be positive",
                        attraction.name
                    ));
                }
                if attraction.ticket_price < 0 {
                    return Err(format!(
                        "attraction '{}': ticket_price must not be negative",
                        attraction.name
                    ));
                }
            }
            let hotel_location = day.hotel.as_ref().and_then(|h| h.location);
            let meal_locations = day.meals.iter().filter_map(|m| m.location);
            for location in hotel_location.into_iter().chain(meal_locations) {
                location
                    .validate()
                    .map_err(|e| format!("day {}: {}", day.day_index, e))?;
            }
            let hotel_cost = day.hotel.as_ref().map(|h| h.estimated_cost);
            let meal_costs = day.meals.iter().map(|m| m.estimated_cost);
            if hotel_cost.into_iter().chain(meal_costs).any(|c| c < 0) {
                return Err(format!("day {}: costs must not be negative", day.day_index));
            }
        }
        if self.compute_budget().is_none() {
            return Err("budget total out of range".to_string());
        }
        Ok(())
    }
}

/// Deserializers for the loose typing models produce
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{Location, MAX_AMOUNT};

    fn bounded(f: f64) -> Option<i64> {
        let rounded = f.round();
        (rounded.is_finite() && rounded.abs() <= MAX_AMOUNT as f64).then_some(rounded as i64)
    }

    /// Integer from a number (rounded) or a numeric string, within `MAX_AMOUNT`
    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let parsed = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(bounded)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(bounded))
            }
            Value::Null => Some(0),
            other => return Err(D::Error::custom(format!("expected integer, got {}", other))),
        };
        match parsed {
            Some(v) if (-MAX_AMOUNT..=MAX_AMOUNT).contains(&v) => Ok(v),
            Some(v) => Err(D::Error::custom(format!("amount {} out of range", v))),
            None => Err(D::Error::custom("not an integer in range")),
        }
    }

    /// `25`, `"16°C"`, `"16℃"`; unparseable strings become 0
    pub fn temperature<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => {
                let cleaned = s.replace("°C", "").replace('℃', "").replace('°', "");
                Ok(cleaned.trim().parse::<i64>().unwrap_or(0))
            }
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .ok_or_else(|| D::Error::custom("invalid temperature")),
            other => Err(D::Error::custom(format!(
                "expected temperature, got {}",
                other
            ))),
        }
    }

    /// A coordinate object; anything else is treated as absent
    pub fn location<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Location>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Ok(None);
        }
        Location::deserialize(value)
            .map(Some)
            .map_err(D::Error::custom)
    }

    /// String, or a number rendered as text
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }
}
