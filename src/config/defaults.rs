//! Default value functions for configuration.

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_port() -> u16 {
    6667
}

pub fn default_max_reconnect() -> u64 {
    3600
}

pub fn default_outbound_queue() -> usize {
    100
}

// =============================================================================
// HTTP Defaults
// =============================================================================

pub fn default_http_timeout() -> u64 {
    60
}

pub fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

pub fn default_intent_url() -> String {
    "https://{region}.api.cognitive.microsoft.com/luis/v2.0/apps/{app_id}".to_string()
}
