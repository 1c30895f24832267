use crate::config::DirectoryConfig;
use crate::directory::{Cursor, Directory, FriendsPage, UserId, UserRecord};
use crate::error::{Result, SixDegreesError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request structure for the username-resolution endpoint
#[derive(Serialize)]
struct ResolveRequest {
    usernames: Vec<String>,
    #[serde(rename = "excludeBannedUsers")]
    exclude_banned_users: bool,
}

/// Response structure from the username-resolution endpoint
#[derive(Deserialize)]
struct ResolveResponse {
    #[serde(default)]
    data: Vec<ResolvedUser>,
}

#[derive(Deserialize)]
struct ResolvedUser {
    id: u64,
    name: String,
}

/// Response structure from the paginated friends endpoint
#[derive(Deserialize)]
struct FriendsResponse {
    #[serde(default)]
    data: Vec<FriendEntry>,
    #[serde(rename = "nextPageCursor", default)]
    next_page_cursor: Option<String>,
}

#[derive(Deserialize)]
struct FriendEntry {
    id: u64,
    name: String,
}

/// HTTP client for the remote social directory
///
/// Wraps the two directory operations (resolve a username, list one page of
/// friends) with per-request timeouts and bounded retries with exponential
/// backoff on rate-limit and server errors.
pub struct HttpDirectory {
    client: Client,
    users_api: String,
    friends_api: String,
    page_size: usize,
    max_retries: usize,
}

impl HttpDirectory {
    /// Create a new directory client
    ///
    /// `page_size` is the friends-listing page size; the service caps it at
    /// 100, so larger configured values are clamped.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// normal operation)
    pub fn new(config: &DirectoryConfig, page_size: usize) -> Self {
        let page_size = page_size.clamp(1, 100);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            users_api: config.users_api.trim_end_matches('/').to_string(),
            friends_api: config.friends_api.trim_end_matches('/').to_string(),
            page_size,
            max_retries: config.max_retries,
        }
    }

    /// Execute a request, retrying rate-limit (429) and server (5xx) errors
    /// with exponential backoff. Other failures return immediately.
    async fn execute_with_retry<T>(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            let response = build()
                .send()
                .await
                .map_err(|e| SixDegreesError::Transient(format!("{}: network error: {}", what, e)))?;

            let status = response.status();

            if status.is_success() {
                return response.json::<T>().await.map_err(|e| {
                    SixDegreesError::Transient(format!("{}: failed to parse response: {}", what, e))
                });
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < self.max_retries {
                log::warn!(
                    "{}: retry {}/{} after HTTP {}",
                    what,
                    attempt + 1,
                    self.max_retries,
                    status
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
                continue;
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(SixDegreesError::Transient(format!(
                "{}: directory API error {}: {}",
                what, status, body
            )));
        }
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn resolve_name(&self, name: &str) -> Result<Option<UserRecord>> {
        let url = format!("{}/v1/usernames/users", self.users_api);
        let request = ResolveRequest {
            usernames: vec![name.to_string()],
            exclude_banned_users: false,
        };

        let response: ResolveResponse = self
            .execute_with_retry(|| self.client.post(&url).json(&request), "resolve_name")
            .await?;

        Ok(response.data.into_iter().next().map(|u| UserRecord {
            id: UserId(u.id),
            name: u.name,
        }))
    }

    async fn list_friends(&self, id: UserId, cursor: Option<&Cursor>) -> Result<FriendsPage> {
        let url = format!("{}/v1/users/{}/friends", self.friends_api, id);
        let limit = self.page_size.to_string();

        let response: FriendsResponse = self
            .execute_with_retry(
                || {
                    let mut req = self.client.get(&url).query(&[("limit", limit.as_str())]);
                    if let Some(cursor) = cursor {
                        req = req.query(&[("cursor", cursor.0.as_str())]);
                    }
                    req
                },
                "list_friends",
            )
            .await?;

        Ok(FriendsPage {
            entries: response
                .data
                .into_iter()
                .map(|f| UserRecord {
                    id: UserId(f.id),
                    name: f.name,
                })
                .collect(),
            next_cursor: response.next_page_cursor.map(Cursor),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_clamped() {
        let directory = HttpDirectory::new(&DirectoryConfig::default(), 500);
        assert_eq!(directory.page_size, 100);

        let directory = HttpDirectory::new(&DirectoryConfig::default(), 0);
        assert_eq!(directory.page_size, 1);

        let directory = HttpDirectory::new(&DirectoryConfig::default(), 42);
        assert_eq!(directory.page_size, 42);
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let config = DirectoryConfig {
            users_api: "https://users.example.com/".to_string(),
            ..DirectoryConfig::default()
        };
        let directory = HttpDirectory::new(&config, 100);
        assert_eq!(directory.users_api, "https://users.example.com");
    }

    #[test]
    fn test_resolve_response_shape() {
        let response: ResolveResponse =
            serde_json::from_str(r#"{"data": [{"id": 42, "name": "Alice", "displayName": "Alice"}]}"#)
                .unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].id, 42);
        assert_eq!(response.data[0].name, "Alice");
    }

    #[test]
    fn test_resolve_response_empty_data() {
        // "no such user" comes back as an empty data array, not an error
        let response: ResolveResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(response.data.is_empty());
        let response: ResolveResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_friends_response_shape() {
        let response: FriendsResponse = serde_json::from_str(
            r#"{"data": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}], "nextPageCursor": "abc"}"#,
        )
        .unwrap();
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.next_page_cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn test_friends_response_last_page() {
        let response: FriendsResponse =
            serde_json::from_str(r#"{"data": [{"id": 1, "name": "a"}], "nextPageCursor": null}"#)
                .unwrap();
        assert!(response.next_page_cursor.is_none());
    }
}
