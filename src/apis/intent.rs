//! LUIS intent prediction.

use serde::{Deserialize, Serialize};

use super::{HttpApis, check_response};
use crate::error::ExternalApiError;

/// Utterances are cut to this many bytes before sending.
const MAX_UTTERANCE_BYTES: usize = 500;

/// Top-scoring intent plus recognised entities.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub intent: String,
    pub score: f64,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LuisResponse {
    top_scoring_intent: Option<TopIntent>,
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct TopIntent {
    #[serde(default)]
    intent: String,
    #[serde(default)]
    score: f64,
}

/// Cut `s` to at most `max` bytes without splitting a character.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl HttpApis {
    pub async fn predict_intent(
        &self,
        region: &str,
        app_id: &str,
        endpoint_key: &str,
        utterance: &str,
    ) -> Result<Prediction, ExternalApiError> {
        let url = self
            .intent_url
            .replace("{region}", region)
            .replace("{app_id}", app_id);
        let response = self
            .client
            .get(url)
            .query(&[
                ("subscription-key", endpoint_key),
                ("verbose", "false"),
                ("q", truncate_bytes(utterance, MAX_UTTERANCE_BYTES)),
            ])
            .send()
            .await?;
        check_response(&response, "application/json")?;

        let body = response.bytes().await?;
        let luis: LuisResponse = serde_json::from_slice(&body)?;
        let top = luis
            .top_scoring_intent
            .filter(|top| !top.intent.is_empty())
            .ok_or(ExternalApiError::NotFound("no intent predicted"))?;

        Ok(Prediction {
            intent: top.intent,
            score: top.score,
            entities: luis.entities,
        })
    }
}
