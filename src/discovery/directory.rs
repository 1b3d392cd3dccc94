use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::api::ApiError;
use crate::models::ServerRecord;

const CONNECT_URL: &str = "https://connect.emby.media/service";

/// Remote directory of servers linked to an account. Kept behind a trait so
/// the discovery flow can run against a fake in tests.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Exchange a username/password for an access token.
    async fn sign_in(&self, username: &str, password: &str) -> Result<String, ApiError>;

    /// Check that a stored token is still accepted.
    async fn validate(&self, token: &str) -> Result<(), ApiError>;

    /// List the servers linked to the account behind the token.
    async fn servers(&self, token: &str) -> Result<Vec<ServerRecord>, ApiError>;
}

/// HTTPS implementation against the Emby Connect service.
pub struct ConnectDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl ConnectDirectory {
    pub fn new() -> Self {
        Self::with_base_url(CONNECT_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for ConnectDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryService for ConnectDirectory {
    async fn sign_in(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let url = format!("{}/user/authenticate", self.base_url);
        info!("Signing in to directory service at {}", url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "nameOrEmail": username,
                "rawpw": password,
            }))
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Directory sign-in failed with status {}: {}", status, body);
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        let auth: ConnectAuthResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        info!("Directory sign-in succeeded for {}", username);
        Ok(auth.access_token)
    }

    async fn validate(&self, token: &str) -> Result<(), ApiError> {
        let url = format!("{}/user?api_key={}", self.base_url, token);
        debug!("Validating directory token");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), body));
        }
        Ok(())
    }

    async fn servers(&self, token: &str) -> Result<Vec<ServerRecord>, ApiError> {
        let url = format!("{}/servers?api_key={}", self.base_url, token);
        debug!("Fetching directory server list");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        let entries: Vec<ConnectServer> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        let servers: Vec<ServerRecord> = entries
            .into_iter()
            .filter_map(|entry| match entry.into_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("Skipping unusable directory entry: {}", e);
                    None
                }
            })
            .collect();

        info!("Directory returned {} servers", servers.len());
        Ok(servers)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConnectAuthResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConnectServer {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    url: String,
    /// Per-server token granted through the account link.
    access_key: Option<String>,
}

impl ConnectServer {
    fn into_record(self) -> Result<ServerRecord, url::ParseError> {
        let address = url::Url::parse(&self.url)?;
        let host = address
            .host_str()
            .ok_or(url::ParseError::EmptyHost)?
            .to_string();

        Ok(ServerRecord {
            id: self.id,
            name: if self.name.is_empty() {
                host.clone()
            } else {
                self.name
            },
            scheme: address.scheme().to_string(),
            host,
            port: address.port().unwrap_or(8096),
            access_token: self.access_key,
        })
    }
}
