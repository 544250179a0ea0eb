//! Thin HTTP integrations exposed to scripts.
//!
//! Every call returns a typed error; the script library turns any failure into
//! `nil` after logging it.

mod intent;
mod title;
mod weather;

pub use intent::{Entity, Prediction};
pub use title::extract_title;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::config::HttpConfig;
use crate::error::ExternalApiError;

/// Shared HTTP client plus the configured endpoints.
#[derive(Clone)]
pub struct HttpApis {
    client: Client,
    weather_url: String,
    intent_url: String,
}

impl HttpApis {
    pub fn new(config: &HttpConfig) -> Result<Self, ExternalApiError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("bananaboatbot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            weather_url: config.weather_url.clone(),
            intent_url: config.intent_url.clone(),
        })
    }
}

/// Fail unless the response is 2xx and its content type starts with `expected`.
fn check_response(response: &reqwest::Response, expected: &str) -> Result<(), ExternalApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ExternalApiError::Status(status.as_u16()));
    }
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .ok_or(ExternalApiError::MissingContentType)?
        .to_str()
        .map_err(|_| ExternalApiError::ContentType("<non-ascii>".to_string()))?;
    if !content_type
        .to_ascii_lowercase()
        .starts_with(expected)
    {
        return Err(ExternalApiError::ContentType(content_type.to_string()));
    }
    Ok(())
}
