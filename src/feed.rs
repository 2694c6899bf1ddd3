use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::cache;

// ---------------------------------------------------------------------------
// Domain models
// ---------------------------------------------------------------------------

/// A single post from the aggregate feed.
///
/// Articles are immutable once decoded; the whole set is replaced on every
/// successful load.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub author: String,
    /// Author avatar URL. Absent or non-http values fall back to the
    /// configured substitute image.
    #[serde(default)]
    pub avatar: Option<String>,
    /// ISO-like publication date string, e.g. "2024-05-01T08:30:00".
    pub created: String,
}

impl Article {
    /// The display date: the `YYYY-MM-DD` prefix of `created`.
    pub fn date(&self) -> String {
        self.created.chars().take(10).collect()
    }
}

/// Aggregate statistics shipped alongside the articles. Display-only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedStats {
    pub friends_num: u64,
    pub active_num: u64,
    pub article_num: u64,
    pub last_updated_time: String,
}

/// The wire shape of `GET {private_api_url}all.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedPayload {
    pub article_data: Vec<Article>,
    pub statistical_data: FeedStats,
}

/// The result of one load attempt, sent back to the main loop.
///
/// Errors are captured into the result rather than propagated so that a
/// failed load surfaces as a status-bar diagnostic instead of tearing the
/// application down.
pub struct LoadResult {
    /// The load generation this result belongs to. The application discards
    /// results from superseded generations (e.g. after a reinitialization).
    pub generation: u64,
    /// Whether the payload was served from the local cache.
    pub from_cache: bool,
    pub payload: Option<FeedPayload>,
    pub error: Option<String>,
}

impl LoadResult {
    fn failed(generation: u64, error: impl Into<String>) -> Self {
        Self {
            generation,
            from_cache: false,
            payload: None,
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Decode a raw feed body into its payload. Shared by the cache and network
/// paths.
pub fn decode_payload(body: &str) -> serde_json::Result<FeedPayload> {
    serde_json::from_str(body)
}

/// Resolve an avatar URL against the configured fallback image.
///
/// Absent and non-http values count as unloadable and substitute the
/// fallback, mirroring an image-load failure.
pub fn resolve_avatar<'a>(avatar: Option<&'a str>, fallback: &'a str) -> &'a str {
    match avatar {
        Some(a) if a.starts_with("http://") || a.starts_with("https://") => a,
        _ => fallback,
    }
}

/// Build a shared HTTP client with a reasonable timeout and user-agent.
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("circlet/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
}

/// Spawn a background task that loads the feed, consulting the cache first.
///
/// At most one load is logically outstanding: each call carries the caller's
/// current generation, and stale results are ignored on arrival. A late
/// network response still refreshes the cache before being discarded.
pub fn start_load(
    tx: &UnboundedSender<LoadResult>,
    client: reqwest::Client,
    store: cache::Store,
    api_url: String,
    generation: u64,
) {
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = load(client, store, api_url, generation).await;
        let _ = tx.send(result);
    });
}

async fn load(
    client: reqwest::Client,
    store: cache::Store,
    api_url: String,
    generation: u64,
) -> LoadResult {
    // Cache first. A fresh entry that decodes cleanly avoids the network
    // entirely; a malformed entry is discarded silently.
    let cached = {
        let store = store.clone();
        let now = Utc::now().timestamp_millis();
        tokio::task::spawn_blocking(move || store.get(now))
            .await
            .unwrap_or(None)
    };

    if let Some(entry) = cached {
        if let Ok(payload) = decode_payload(&entry.payload) {
            return LoadResult {
                generation,
                from_cache: true,
                payload: Some(payload),
                error: None,
            };
        }
    }

    if api_url.is_empty() {
        return LoadResult::failed(generation, "no private_api_url configured");
    }

    let url = format!("{api_url}all.json");
    let body = match fetch_body(&client, &url).await {
        Ok(body) => body,
        Err(e) => return LoadResult::failed(generation, e.to_string()),
    };

    match decode_payload(&body) {
        Ok(payload) => {
            // Persist the raw body before use so the next initialization can
            // skip the network within the cache TTL.
            let store = store.clone();
            let raw = body.clone();
            let _ = tokio::task::spawn_blocking(move || {
                store.put(&raw, Utc::now().timestamp_millis())
            })
            .await;

            LoadResult {
                generation,
                from_cache: false,
                payload: Some(payload),
                error: None,
            }
        }
        Err(e) => LoadResult::failed(generation, format!("bad feed payload: {e}")),
    }
}

/// Perform the single HTTP GET and return the response body.
async fn fetch_body(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status.as_u16()).into());
    }

    let body = response.text().await?;
    if body.is_empty() {
        return Err("empty response from feed".into());
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_wire_shape() {
        let body = r#"{
            "article_data": [
                {
                    "title": "Hello",
                    "link": "https://example.com/hello",
                    "author": "Ann",
                    "avatar": "https://example.com/ann.png",
                    "created": "2024-05-01T08:30:00"
                },
                {
                    "title": "No avatar",
                    "link": "https://example.com/na",
                    "author": "Bob",
                    "created": "2024-05-02"
                }
            ],
            "statistical_data": {
                "friends_num": 12,
                "active_num": 9,
                "article_num": 2,
                "last_updated_time": "2024-05-02 10:00:00"
            }
        }"#;

        let payload = decode_payload(body).unwrap();
        assert_eq!(payload.article_data.len(), 2);
        assert_eq!(payload.article_data[0].author, "Ann");
        assert_eq!(payload.article_data[1].avatar, None);
        assert_eq!(payload.statistical_data.friends_num, 12);
        assert_eq!(payload.statistical_data.article_num, 2);
    }

    #[test]
    fn decode_rejects_malformed_body() {
        assert!(decode_payload("not json").is_err());
        assert!(decode_payload(r#"{"article_data": []}"#).is_err());
    }

    #[test]
    fn date_is_first_ten_characters() {
        let article = Article {
            title: "t".into(),
            link: "https://example.com/t".into(),
            author: "Ann".into(),
            avatar: None,
            created: "2024-05-01T08:30:00".into(),
        };
        assert_eq!(article.date(), "2024-05-01");
    }

    #[test]
    fn date_handles_short_created_string() {
        let article = Article {
            title: "t".into(),
            link: "https://example.com/t".into(),
            author: "Ann".into(),
            avatar: None,
            created: "2024".into(),
        };
        assert_eq!(article.date(), "2024");
    }

    #[test]
    fn avatar_falls_back_when_absent_or_not_http() {
        let fallback = "https://cdn.example.com/fallback.ico";
        assert_eq!(resolve_avatar(None, fallback), fallback);
        assert_eq!(resolve_avatar(Some(""), fallback), fallback);
        assert_eq!(
            resolve_avatar(Some("data:image/png;base64,xx"), fallback),
            fallback
        );
        assert_eq!(
            resolve_avatar(Some("https://example.com/a.png"), fallback),
            "https://example.com/a.png"
        );
    }
}
