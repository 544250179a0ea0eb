//! Page title lookup.

use regex::Regex;
use std::sync::LazyLock;

use super::{HttpApis, check_response};
use crate::error::ExternalApiError;

/// Bytes of the body inspected before giving up.
const READ_LIMIT: usize = 12288;

/// Longest title returned, in characters.
const MAX_TITLE_CHARS: usize = 400;

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(title|body)(?:\s[^>]*)?>").expect("valid regex")
});

static CLOSE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</title\s*>").expect("valid regex"));

impl HttpApis {
    /// Title of the HTML page at `url`.
    pub async fn fetch_title(&self, url: &str) -> Result<String, ExternalApiError> {
        let url = reqwest::Url::parse(url).map_err(|e| ExternalApiError::Url(e.to_string()))?;
        let mut response = self.client.get(url).send().await?;
        check_response(&response, "text/html")?;

        let mut body = Vec::with_capacity(READ_LIMIT);
        while body.len() < READ_LIMIT {
            let Some(chunk) = response.chunk().await? else {
                break;
            };
            let take = chunk.len().min(READ_LIMIT - body.len());
            body.extend_from_slice(&chunk[..take]);
        }

        extract_title(&String::from_utf8_lossy(&body))
            .ok_or(ExternalApiError::NotFound("no title found"))
    }
}

/// Find the document title, giving up at `<body>`.
///
/// Entities are decoded, tabs and newlines removed and the result trimmed and
/// cut to 400 characters. Returns `None` if there's no non-empty title.
pub fn extract_title(html: &str) -> Option<String> {
    let open = OPEN_TAG.captures(html)?;
    if !open[1].eq_ignore_ascii_case("title") {
        return None;
    }

    let start = open.get(0)?.end();
    let rest = &html[start..];
    let raw = match CLOSE_TITLE.find(rest) {
        Some(close) => &rest[..close.start()],
        None => rest,
    };

    let decoded = html_escape::decode_html_entities(raw);
    let cleaned: String = decoded.chars().filter(|c| !matches!(c, '\n' | '\t')).collect();
    let title: String = cleaned.trim().chars().take(MAX_TITLE_CHARS).collect();

    (!title.is_empty()).then_some(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extract_title() {
        let html = "<html><head><TITLE lang=en>\n\tFish &amp; Chips\t\n</TITLE></head><body></body>";
        assert_eq!(extract_title(html).as_deref(), Some("Fish & Chips"));
    }

    #[test]
    fn test_body_before_title() {
        assert_eq!(extract_title("<body><title>late</title></body>"), None);
    }

    #[test]
    fn test_empty_or_missing_title() {
        assert_eq!(extract_title("<title>  </title>"), None);
        assert_eq!(extract_title("<p>nothing</p>"), None);
        assert_eq!(extract_title("<titlex>nope</titlex>"), None);
    }

    #[test]
    fn test_truncated() {
        let html = format!("<title>{}</title>", "é".repeat(500));
        assert_eq!(extract_title(&html).unwrap().chars().count(), 400);
    }

    #[test]
    fn test_unterminated_title() {
        assert_eq!(extract_title("<title>cut off").as_deref(), Some("cut off"));
    }

    #[tokio::test]
    async fn test_fetch_title() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><head><title>Hello</title></head></html>", "text/html; charset=utf-8"),
            )
            .mount(&mock_server)
            .await;

        let apis = HttpApis::new(&HttpConfig::default()).unwrap();
        let title = apis
            .fetch_title(&format!("{}/page", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(title, "Hello");
    }

    #[tokio::test]
    async fn test_fetch_title_rejects_non_html() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{}", "application/json"),
            )
            .mount(&mock_server)
            .await;

        let apis = HttpApis::new(&HttpConfig::default()).unwrap();
        let err = apis.fetch_title(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, ExternalApiError::ContentType(_)));
    }

    #[tokio::test]
    async fn test_fetch_title_rejects_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_raw("<title>Not Found</title>", "text/html"),
            )
            .mount(&mock_server)
            .await;

        let apis = HttpApis::new(&HttpConfig::default()).unwrap();
        let err = apis.fetch_title(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, ExternalApiError::Status(404)));
    }

    #[tokio::test]
    async fn test_title_after_read_limit_is_ignored() {
        let mock_server = MockServer::start().await;
        let body = format!("<html>{}<title>too far</title>", " ".repeat(READ_LIMIT));
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "text/html"),
            )
            .mount(&mock_server)
            .await;

        let apis = HttpApis::new(&HttpConfig::default()).unwrap();
        assert!(apis.fetch_title(&mock_server.uri()).await.is_err());
    }
}
