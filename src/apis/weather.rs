//! OpenWeatherMap current conditions.

use serde::Deserialize;

use super::{HttpApis, check_response};
use crate::error::ExternalApiError;

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<Condition>,
    main: Main,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Main {
    temp: f64,
}

impl WeatherResponse {
    fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(self.weather.len() + 1);
        parts.push(format!("{:.0}°", self.main.temp));
        parts.extend(self.weather.iter().map(|c| c.description.clone()));
        parts.join(", ")
    }
}

impl HttpApis {
    /// Metric weather summary for `location`, e.g. `"12°, light rain"`.
    pub async fn weather(&self, api_key: &str, location: &str) -> Result<String, ExternalApiError> {
        let response = self
            .client
            .get(&self.weather_url)
            .query(&[("units", "metric"), ("APPID", api_key), ("q", location)])
            .send()
            .await?;
        check_response(&response, "application/json")?;

        let body = response.bytes().await?;
        let weather: WeatherResponse = serde_json::from_slice(&body)?;
        Ok(weather.summary())
    }
}
