//! Provider gateway: editorial search against the Getty Images API.
//!
//! [`MediaGateway`] is the seam between the search pipeline and the
//! provider. [`GettyGateway`] is the HTTP implementation: it exchanges the
//! client credentials for a bearer token once per session, then attaches
//! `Authorization: Bearer <token>` and `Api-Key` headers to every search.
//!
//! ```text
//! search_all ──▶ MediaGateway::search ──▶ GET {base}/search/{videos|images}/editorial
//!                        │
//!                        └── token (OnceCell) ◀── POST {token_url} (client_credentials)
//! ```
//!
//! Non-success responses are surfaced with the provider's status and body
//! verbatim.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::GettyConfig;
use crate::error::{Error, Result};
use crate::models::MediaKind;

/// Fields requested from the provider for every search.
pub const SEARCH_FIELDS: &str = "id,title,date_created,display_set";
/// Provider-defined popularity ordering.
pub const SORT_ORDER: &str = "most_popular";

/// A named rendition of a media item (e.g. `thumb`, `preview`, `comp`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplaySize {
    pub name: String,
    pub uri: String,
}

/// One record in a provider search response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub display_sizes: Vec<DisplaySize>,
}

/// Search response body; exactly one of the lists is populated per kind.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub videos: Vec<ProviderRecord>,
    #[serde(default)]
    pub images: Vec<ProviderRecord>,
}

impl SearchResponse {
    pub fn into_records(self, kind: MediaKind) -> Vec<ProviderRecord> {
        match kind {
            MediaKind::Video => self.videos,
            MediaKind::Photo => self.images,
        }
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// Query parameters for one editorial search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub phrase: String,
    pub page: u32,
    pub page_size: u32,
    pub fields: String,
    pub sort_order: String,
    /// Comma-joined collection codes; `None` searches every collection.
    pub collection_codes: Option<String>,
}

impl SearchQuery {
    pub fn new(phrase: impl Into<String>, page_size: u32, collection_codes: Option<String>) -> Self {
        Self {
            phrase: phrase.into(),
            page: 1,
            page_size,
            fields: SEARCH_FIELDS.to_string(),
            sort_order: SORT_ORDER.to_string(),
            collection_codes,
        }
    }

    /// Query string pairs; `collection_codes` is omitted when unset.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("phrase", self.phrase.clone()),
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
            ("fields", self.fields.clone()),
            ("sort_order", self.sort_order.clone()),
        ];
        if let Some(codes) = &self.collection_codes {
            params.push(("collection_codes", codes.clone()));
        }
        params
    }
}

/// Path of the editorial search endpoint for `kind`, relative to the API base.
pub fn search_path(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Video => "search/videos/editorial",
        MediaKind::Photo => "search/images/editorial",
    }
}

/// Anything that can answer editorial searches.
#[async_trait]
pub trait MediaGateway: Send + Sync {
    /// Runs one search and returns the provider's records in provider order.
    async fn search(&self, kind: MediaKind, query: &SearchQuery) -> Result<Vec<ProviderRecord>>;
}

/// Stand-in used when no provider credentials are available.
///
/// Every search fails with [`Error::Auth`], so the operator sees the reason
/// at search time and the workflow does not advance.
pub struct UnavailableGateway {
    reason: String,
}

impl UnavailableGateway {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MediaGateway for UnavailableGateway {
    async fn search(&self, _kind: MediaKind, _query: &SearchQuery) -> Result<Vec<ProviderRecord>> {
        Err(Error::Auth(self.reason.clone()))
    }
}

/// HTTP gateway to the Getty Images API.
pub struct GettyGateway {
    client: reqwest::Client,
    base_url: String,
    token_url: String,
    api_key: String,
    api_secret: String,
    token: OnceCell<AccessToken>,
}

impl GettyGateway {
    /// Builds a gateway, reading credentials from the environment variables
    /// named in `config`.
    pub fn from_config(config: &GettyConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            Error::Auth(format!("{} environment variable not set", config.api_key_env))
        })?;
        let api_secret = std::env::var(&config.api_secret_env).map_err(|_| {
            Error::Auth(format!(
                "{} environment variable not set",
                config.api_secret_env
            ))
        })?;
        Self::new(config, api_key, api_secret)
    }

    pub fn new(config: &GettyConfig, api_key: String, api_secret: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
            api_key,
            api_secret,
            token: OnceCell::new(),
        })
    }

    /// Returns the session token, exchanging credentials on first use.
    pub async fn token(&self) -> Result<&AccessToken> {
        self.token.get_or_try_init(|| self.fetch_token()).await
    }

    async fn fetch_token(&self) -> Result<AccessToken> {
        info!(url = %self.token_url, "requesting provider access token");

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.api_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token endpoint returned {}: {}",
                status, body_text
            )));
        }

        let token: AccessToken = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("invalid token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(Error::Auth("token endpoint returned an empty access_token".into()));
        }

        debug!(
            token_type = %token.token_type,
            expires_in = token.expires_in,
            "access token acquired"
        );
        Ok(token)
    }
}

#[async_trait]
impl MediaGateway for GettyGateway {
    async fn search(&self, kind: MediaKind, query: &SearchQuery) -> Result<Vec<ProviderRecord>> {
        let token = self.token().await?;
        let url = format!("{}/{}", self.base_url, search_path(kind));

        debug!(%url, phrase = %query.phrase, codes = ?query.collection_codes, "provider search");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token.access_token))
            .header("Api-Key", &self.api_key)
            .query(&query.params())
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!("provider rejected bearer token: {}", body_text)));
        }
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::Search {
                status: status.as_u16(),
                detail: body_text,
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.into_records(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_omit_collection_codes_when_unrestricted() {
        let query = SearchQuery::new("Jane Doe", 30, None);
        let params = query.params();
        assert!(params.iter().all(|(k, _)| *k != "collection_codes"));
        assert!(params.contains(&("page_size", "30".to_string())));
        assert!(params.contains(&("sort_order", "most_popular".to_string())));
    }

    #[test]
    fn params_include_collection_codes_when_set() {
        let query = SearchQuery::new("Jane Doe", 30, Some("WWD,VAR".into()));
        assert!(query
            .params()
            .contains(&("collection_codes", "WWD,VAR".to_string())));
    }

    #[test]
    fn search_paths_per_kind() {
        assert_eq!(search_path(MediaKind::Video), "search/videos/editorial");
        assert_eq!(search_path(MediaKind::Photo), "search/images/editorial");
    }

    #[test]
    fn response_picks_list_by_kind() {
        let json = r#"{
            "result_count": 1,
            "images": [{
                "id": "123",
                "title": "Jane Doe at the premiere",
                "date_created": "2019-05-01T12:00:00-07:00",
                "display_sizes": [{"name": "thumb", "uri": "https://t/1"}]
            }]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let records = response.into_records(MediaKind::Photo);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_sizes[0].name, "thumb");
    }

    #[test]
    fn missing_list_is_empty() {
        let response: SearchResponse = serde_json::from_str(r#"{"result_count": 0}"#).unwrap();
        assert!(response.into_records(MediaKind::Video).is_empty());
    }

    #[test]
    fn from_config_requires_credentials() {
        let config = GettyConfig {
            api_key_env: "SHOTLIST_TEST_UNSET_KEY".into(),
            api_secret_env: "SHOTLIST_TEST_UNSET_SECRET".into(),
            ..GettyConfig::default()
        };
        assert!(matches!(
            GettyGateway::from_config(&config),
            Err(Error::Auth(_))
        ));
    }
}
