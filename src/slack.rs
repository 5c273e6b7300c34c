/// Slack Web API client used to fetch channel history, list users and post reports.
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::directory::User;
use crate::history::RawHistory;
use crate::secrets::ApiToken;

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Largest page the history and user endpoints accept.
const MAX_PAGE_SIZE: usize = 200;

/// Transport settings for [`SlackClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_base: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_ms: 15_000,
            retry_max_attempts: 4,
            retry_base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    response_metadata: Option<ResponseMetadata>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MemberProfile {
    real_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Member {
    id: String,
    name: String,
    #[serde(default)]
    deleted: bool,
    real_name: Option<String>,
    profile: Option<MemberProfile>,
}

#[derive(Debug, Deserialize)]
struct UsersListResponse {
    ok: bool,
    #[serde(default)]
    members: Vec<Member>,
    response_metadata: Option<ResponseMetadata>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    ts: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    api_base: String,
    token: ApiToken,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl SlackClient {
    pub fn new(token: ApiToken, settings: ClientSettings) -> Result<Self> {
        let api_base = settings.api_base.trim_end_matches('/').to_string();
        Url::parse(&api_base).with_context(|| format!("Invalid Slack API base URL: {}", api_base))?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("snitch"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(settings.request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base,
            token,
            retry_max_attempts: settings.retry_max_attempts.max(1),
            retry_base_delay_ms: settings.retry_base_delay_ms,
        })
    }

    /// Fetch up to `max_count` history records newer than `oldest`.
    ///
    /// Follows pagination cursors until the channel is exhausted or the cap is
    /// reached. `has_more` is set on the result when the channel still had
    /// records left behind the last page kept. A cap of 0 is an error.
    pub async fn fetch_history(
        &self,
        channel_id: &str,
        oldest: f64,
        max_count: usize,
    ) -> Result<RawHistory> {
        if max_count == 0 {
            bail!("history record cap must be at least 1");
        }

        let mut messages: Vec<Value> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut has_more = false;

        while messages.len() < max_count {
            let limit = (max_count - messages.len()).min(MAX_PAGE_SIZE);
            let mut query: Vec<(&str, String)> = vec![
                ("channel", channel_id.to_string()),
                ("oldest", format!("{:.6}", oldest)),
                ("limit", limit.to_string()),
            ];
            if let Some(ref next) = cursor {
                query.push(("cursor", next.clone()));
            }

            let response: HistoryResponse = self
                .request_json("conversations.history", || {
                    self.http
                        .get(format!("{}/conversations.history", self.api_base))
                        .bearer_auth(self.token.expose())
                        .query(&query)
                })
                .await?;

            if !response.ok {
                bail!(
                    "slack conversations.history failed: {}",
                    response
                        .error
                        .unwrap_or_else(|| "unknown error".to_string())
                );
            }

            tracing::debug!(
                "Fetched {} records from {} (has_more: {})",
                response.messages.len(),
                channel_id,
                response.has_more
            );
            messages.extend(response.messages);
            has_more = response.has_more;

            cursor = response
                .response_metadata
                .and_then(|meta| meta.next_cursor)
                .filter(|next| !next.is_empty());
            if !has_more || cursor.is_none() {
                break;
            }
        }

        if messages.len() > max_count {
            messages.truncate(max_count);
            has_more = true;
        }

        tracing::info!(
            "Fetched {} history records from {}",
            messages.len(),
            channel_id
        );
        Ok(RawHistory::new(messages, has_more))
    }

    /// List workspace members, skipping deleted accounts.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let mut users = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![("limit", MAX_PAGE_SIZE.to_string())];
            if let Some(ref next) = cursor {
                query.push(("cursor", next.clone()));
            }

            let response: UsersListResponse = self
                .request_json("users.list", || {
                    self.http
                        .get(format!("{}/users.list", self.api_base))
                        .bearer_auth(self.token.expose())
                        .query(&query)
                })
                .await?;

            if !response.ok {
                bail!(
                    "slack users.list failed: {}",
                    response
                        .error
                        .unwrap_or_else(|| "unknown error".to_string())
                );
            }

            users.extend(
                response
                    .members
                    .into_iter()
                    .filter(|member| !member.deleted)
                    .map(member_to_user),
            );

            cursor = response
                .response_metadata
                .and_then(|meta| meta.next_cursor)
                .filter(|next| !next.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        Ok(users)
    }

    /// Post `text` to a channel, returning the message timestamp.
    pub async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        username: Option<&str>,
    ) -> Result<String> {
        let mut payload = json!({
            "channel": channel_id,
            "text": text,
            "unfurl_links": false,
            "unfurl_media": false,
        });
        if let Some(name) = username {
            payload["username"] = Value::String(name.to_string());
        }

        let response: PostMessageResponse = self
            .request_json("chat.postMessage", || {
                self.http
                    .post(format!("{}/chat.postMessage", self.api_base))
                    .bearer_auth(self.token.expose())
                    .json(&payload)
            })
            .await?;

        if !response.ok {
            bail!(
                "slack chat.postMessage failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        response
            .ts
            .ok_or_else(|| anyhow!("slack chat.postMessage response missing ts"))
    }

    async fn request_json<T, F>(&self, operation: &str, mut builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = builder()
                .header("x-snitch-retry-attempt", (attempt - 1).to_string())
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<T>()
                            .await
                            .with_context(|| format!("failed to decode slack {operation}"));
                    }

                    let retry_after = parse_retry_after_ms(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.retry_max_attempts && is_retryable_status(status.as_u16()) {
                        tracing::warn!(
                            "slack {} returned {}, retrying (attempt {})",
                            operation,
                            status.as_u16(),
                            attempt
                        );
                        tokio::time::sleep(retry_delay(
                            self.retry_base_delay_ms,
                            attempt,
                            retry_after,
                        ))
                        .await;
                        continue;
                    }

                    bail!(
                        "slack api {operation} failed with status {}: {}",
                        status.as_u16(),
                        truncate_for_error(&body, 800)
                    );
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts
                        && (error.is_timeout() || error.is_connect())
                    {
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("slack api {operation} request failed"));
                }
            }
        }
    }
}

fn member_to_user(member: Member) -> User {
    let real_name = member
        .real_name
        .filter(|name| !name.is_empty())
        .or_else(|| member.profile.and_then(|profile| profile.real_name))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| member.name.clone());
    User {
        user_id: member.id,
        user_name: member.name,
        real_name,
    }
}

fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let raw = headers.get("retry-after")?.to_str().ok()?.trim();
    raw.parse::<u64>().ok().map(|seconds| seconds.saturating_mul(1000))
}

/// Exponential backoff with jitter; a server-provided `Retry-After` wins.
fn retry_delay(base_delay_ms: u64, attempt: usize, retry_after_ms: Option<u64>) -> Duration {
    if let Some(ms) = retry_after_ms {
        return Duration::from_millis(ms);
    }
    if base_delay_ms == 0 {
        return Duration::ZERO;
    }
    let exponent = attempt.saturating_sub(1).min(10) as u32;
    let backoff = base_delay_ms.saturating_mul(1_u64 << exponent);
    let jitter = rand::thread_rng().gen_range(0..=base_delay_ms);
    Duration::from_millis(backoff.saturating_add(jitter))
}

fn truncate_for_error(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let truncated: String = body.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
    }

    #[test]
    fn test_retry_delay_prefers_retry_after() {
        assert_eq!(retry_delay(100, 3, Some(2000)), Duration::from_millis(2000));
        assert_eq!(retry_delay(0, 3, None), Duration::ZERO);
    }

    #[test]
    fn test_retry_delay_backoff_grows() {
        let first = retry_delay(100, 1, None);
        let third = retry_delay(100, 3, None);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(200));
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(500));
    }

    #[test]
    fn test_member_real_name_fallbacks() {
        let member = Member {
            id: "U1".to_string(),
            name: "alice".to_string(),
            deleted: false,
            real_name: None,
            profile: Some(MemberProfile {
                real_name: Some("Alice Adams".to_string()),
            }),
        };
        assert_eq!(member_to_user(member).real_name, "Alice Adams");

        let bare = Member {
            id: "U2".to_string(),
            name: "bob".to_string(),
            deleted: false,
            real_name: Some(String::new()),
            profile: None,
        };
        assert_eq!(member_to_user(bare).real_name, "bob");
    }

    #[test]
    fn test_truncate_for_error() {
        assert_eq!(truncate_for_error("short", 10), "short");
        assert_eq!(truncate_for_error("abcdef", 3), "abc...");
    }

    #[test]
    fn test_invalid_api_base() {
        let token = ApiToken::new("xoxb-test").unwrap();
        let settings = ClientSettings {
            api_base: "not a url".to_string(),
            ..ClientSettings::default()
        };
        assert!(SlackClient::new(token, settings).is_err());
    }
}
