use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::warn;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 12;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;
const RATE_LIMIT_WARN_THRESHOLD: u64 = 50;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("access-drift/0.1")
        .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .build()
        .expect("failed to build HTTP client")
});

pub fn client() -> &'static Client {
    &HTTP_CLIENT
}

pub async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let url = response.url().to_string();
    let body = response
        .text()
        .await
        .with_context(|| format!("failed reading response body: {url}"))?;
    if !status.is_success() {
        let preview: String = body.chars().take(180).collect();
        return Err(anyhow!("{url} returned {status}: {preview}"));
    }
    serde_json::from_str(&body).with_context(|| format!("invalid JSON response: {url}"))
}

// RFC 5988 pagination as used by the GitHub API.
pub fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(reqwest::header::LINK)?.to_str().ok()?;
    for part in link.split(',') {
        let mut pieces = part.trim().split(';');
        let Some(target) = pieces.next() else {
            continue;
        };
        let Some(url) = target
            .trim()
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
        else {
            continue;
        };
        if pieces.any(|piece| piece.trim() == r#"rel="next""#) {
            return Some(url.to_string());
        }
    }
    None
}

pub fn warn_on_rate_limit(headers: &HeaderMap) {
    let Some(remaining) = headers
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
    else {
        return;
    };
    if remaining < RATE_LIMIT_WARN_THRESHOLD {
        warn!("only {remaining} API requests remaining before rate limiting");
    }
}

pub fn string_field(value: &Value, key: &str) -> Result<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("missing string field {key:?} in {}", preview(value)))
}

// Like string_field, but a missing or null value becomes the empty string.
pub fn string_field_or_default(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn u64_field(value: &Value, key: &str) -> Result<u64> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("missing integer field {key:?} in {}", preview(value)))
}

pub fn bool_field(value: &Value, key: &str) -> Result<bool> {
    value
        .get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| anyhow!("missing boolean field {key:?} in {}", preview(value)))
}

pub fn array_field<'a>(value: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("missing array field {key:?} in {}", preview(value)))
}

fn preview(value: &Value) -> String {
    value.to_string().chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, LINK};
    use serde_json::json;

    use crate::remote::http::{
        bool_field, next_page_url, string_field, string_field_or_default, u64_field,
    };

    #[test]
    fn follows_the_next_link_and_stops_on_the_last_page() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://api.github.com/orgs/acme/members?page=2>; rel=\"next\", \
                 <https://api.github.com/orgs/acme/members?page=5>; rel=\"last\"",
            ),
        );
        assert_eq!(
            next_page_url(&headers).as_deref(),
            Some("https://api.github.com/orgs/acme/members?page=2")
        );

        let mut last_page = HeaderMap::new();
        last_page.insert(
            LINK,
            HeaderValue::from_static(
                "<https://api.github.com/orgs/acme/members?page=4>; rel=\"prev\"",
            ),
        );
        assert_eq!(next_page_url(&last_page), None);
        assert_eq!(next_page_url(&HeaderMap::new()), None);
    }

    #[test]
    fn field_helpers_extract_and_reject() {
        let value = json!({"id": 42, "login": "octocat", "siteAdmin": false, "bio": null});
        assert_eq!(u64_field(&value, "id").unwrap(), 42);
        assert_eq!(string_field(&value, "login").unwrap(), "octocat");
        assert!(!bool_field(&value, "siteAdmin").unwrap());
        assert!(string_field(&value, "bio").is_err());
        assert_eq!(string_field_or_default(&value, "bio"), "");
        assert!(u64_field(&value, "missing").is_err());
    }
}
