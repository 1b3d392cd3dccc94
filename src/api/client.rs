use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::errors::ApiError;
use crate::constants::{CLIENT_NAME, CLIENT_VERSION};
use crate::models::{
    Artwork, ConnectionStatus, ItemKind, MediaItem, MediaSourceInfo, ServerRecord, UserRecord,
};

/// HTTP client for the Emby endpoints this crate exercises: item lookup,
/// intros, additional parts, the PlaybackInfo play decision, public users
/// and authentication.
#[derive(Clone)]
pub struct EmbyApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    user_id: String,
    device_id: String,
}

impl EmbyApi {
    pub fn new(base_url: String, api_key: String, user_id: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            user_id,
            device_id: Uuid::new_v4().to_string(),
        }
    }

    /// Build a client for an already-discovered server. The record must
    /// carry an access token.
    pub fn for_server(server: &ServerRecord, user_id: &str) -> Result<Self, ApiError> {
        let token = server
            .access_token
            .clone()
            .ok_or_else(|| ApiError::Other("server record has no access token".to_string()))?;
        Ok(Self::new(server.base_url(), token, user_id.to_string()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn auth_header(&self) -> String {
        format!(
            r#"MediaBrowser Client="{}", Device="Linux", DeviceId="{}", Version="{}", Token="{}""#,
            CLIENT_NAME, self.device_id, CLIENT_VERSION, self.api_key
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header("X-Emby-Authorization", self.auth_header())
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Request failed with status {}: {}", status, body);
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Authenticate with username/password and receive an access token.
    pub async fn authenticate(
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ApiError::from_reqwest)?;

        let device_id = Uuid::new_v4().to_string();
        let auth_header = format!(
            r#"MediaBrowser Client="{}", Device="Linux", DeviceId="{}", Version="{}""#,
            CLIENT_NAME, device_id, CLIENT_VERSION
        );

        let url = format!(
            "{}/Users/AuthenticateByName",
            base_url.trim_end_matches('/')
        );
        info!("Authenticating with Emby at: {}", url);

        let response = client
            .post(&url)
            .header("X-Emby-Authorization", auth_header)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "Username": username,
                "Pw": password,
            }))
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Authentication failed with status {}: {}", status, body);
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        info!("Authenticated as user: {}", auth.user.name);
        Ok(auth)
    }

    /// Fetch a single item with the user's playback state.
    pub async fn get_item(&self, item_id: &str) -> Result<MediaItem, ApiError> {
        let url = format!(
            "{}/Users/{}/Items/{}?format=json",
            self.base_url, self.user_id, item_id
        );
        let item: EmbyItem = self.get_json(&url).await?;
        Ok(item.into_media_item(&self.base_url))
    }

    /// Fetch the cinema-mode intro clips for an item, in server order.
    pub async fn get_intros(&self, item_id: &str) -> Result<Vec<MediaItem>, ApiError> {
        let url = format!(
            "{}/Users/{}/Items/{}/Intros?format=json&ImageTypeLimit=1&Fields=Etag",
            self.base_url, self.user_id, item_id
        );
        let response: ItemsResponse = self.get_json(&url).await?;

        if response.total_record_count == 0 {
            return Ok(Vec::new());
        }

        Ok(response
            .items
            .into_iter()
            .map(|item| item.into_media_item(&self.base_url))
            .collect())
    }

    /// Fetch the remaining parts of a multi-part video, in order.
    pub async fn get_additional_parts(&self, item_id: &str) -> Result<Vec<MediaItem>, ApiError> {
        let url = format!("{}/Videos/{}/AdditionalParts", self.base_url, item_id);
        let response: ItemsResponse = self.get_json(&url).await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| item.into_media_item(&self.base_url))
            .collect())
    }

    /// Ask the server for a play decision: which media sources exist and
    /// whether each supports direct play or direct stream for our profile.
    pub async fn get_playback_info(&self, item_id: &str) -> Result<Vec<MediaSourceInfo>, ApiError> {
        let url = format!(
            "{}/Items/{}/PlaybackInfo?UserId={}&StartTimeTicks=0&IsPlayback=true&AutoOpenLiveStream=true",
            self.base_url, item_id, self.user_id
        );

        let response = self
            .client
            .post(&url)
            .header("X-Emby-Authorization", self.auth_header())
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "DeviceProfile": {
                    "MaxStreamingBitrate": 120000000,
                    "DirectPlayProfiles": [
                        {
                            "Container": "mp4,m4v,mkv,webm",
                            "Type": "Video",
                            "VideoCodec": "h264,hevc,vp8,vp9,av1",
                            "AudioCodec": "aac,mp3,opus,flac,vorbis"
                        }
                    ],
                    "TranscodingProfiles": [
                        {
                            "Container": "mp4",
                            "Type": "Video",
                            "AudioCodec": "aac",
                            "VideoCodec": "h264",
                            "Context": "Streaming",
                            "Protocol": "hls",
                            "MaxAudioChannels": "6"
                        }
                    ]
                }
            }))
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("PlaybackInfo failed with status {}: {}", status, body);
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        let info: PlaybackInfoResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(info.media_sources)
    }

    /// Fetch the server's public user list. Unauthenticated.
    pub async fn get_public_users(base_url: &str) -> Result<Vec<UserRecord>, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(ApiError::from_reqwest)?;

        let url = format!(
            "{}/Users/Public?format=json",
            base_url.trim_end_matches('/')
        );
        debug!("GET {}", url);

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Probe a candidate server for reachability and token validity.
    pub async fn check_connection(server: &ServerRecord) -> ConnectionStatus {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build HTTP client for connection check: {}", e);
                return ConnectionStatus::Unreachable;
            }
        };

        let url = format!("{}/System/Info", server.base_url());
        let mut request = client.get(&url);
        if let Some(token) = &server.access_token {
            request = request.header("X-Emby-Token", token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => ConnectionStatus::Ok,
            Ok(response)
                if response.status() == reqwest::StatusCode::UNAUTHORIZED
                    || response.status() == reqwest::StatusCode::FORBIDDEN =>
            {
                info!("Server {} rejected our token", server.name);
                ConnectionStatus::Unauthorized
            }
            Ok(response) => {
                warn!(
                    "Server {} answered with status {}",
                    server.name,
                    response.status()
                );
                ConnectionStatus::Unreachable
            }
            Err(e) => {
                warn!("Server {} unreachable: {}", server.name, e);
                ConnectionStatus::Unreachable
            }
        }
    }

    // === Stream URL builders ===

    pub fn direct_play_url(&self, item_id: &str, media_source_id: &str) -> String {
        format!(
            "{}/Videos/{}/stream?Static=true&MediaSourceId={}&api_key={}",
            self.base_url, item_id, media_source_id, self.api_key
        )
    }

    pub fn direct_stream_url(&self, item_id: &str, media_source_id: &str) -> String {
        format!(
            "{}/Videos/{}/stream?MediaSourceId={}&api_key={}",
            self.base_url, item_id, media_source_id, self.api_key
        )
    }

    pub fn transcode_url(&self, item_id: &str, media_source_id: &str) -> String {
        format!(
            "{}/Videos/{}/main.m3u8?MediaSourceId={}&api_key={}",
            self.base_url, item_id, media_source_id, self.api_key
        )
    }

    /// Download URL for an external text subtitle stream.
    pub fn subtitle_url(&self, item_id: &str, stream_index: u32) -> String {
        format!(
            "{}/Videos/{}/{}/Subtitles/{}/Stream.srt",
            self.base_url, item_id, item_id, stream_index
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthResponse {
    pub user: EmbyUser,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmbyUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<EmbyItem>,
    #[serde(default = "items_fallback_count")]
    total_record_count: u64,
}

// Endpoints that return a bare Items array omit the count; treat that as
// "present" so the items are not discarded.
fn items_fallback_count() -> u64 {
    u64::MAX
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EmbyItem {
    id: String,
    name: String,
    #[serde(rename = "Type")]
    item_type: Option<String>,
    series_id: Option<String>,
    series_name: Option<String>,
    parent_index_number: Option<u32>,
    index_number: Option<u32>,
    run_time_ticks: Option<u64>,
    part_count: Option<u32>,
    production_year: Option<u32>,
    community_rating: Option<f32>,
    overview: Option<String>,
    premiere_date: Option<String>,
    user_data: Option<EmbyUserData>,
    #[serde(default)]
    media_sources: Vec<MediaSourceInfo>,
    #[serde(default)]
    image_tags: ImageTags,
    #[serde(default)]
    backdrop_image_tags: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct ImageTags {
    primary: Option<String>,
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EmbyUserData {
    playback_position_ticks: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PlaybackInfoResponse {
    #[serde(default)]
    media_sources: Vec<MediaSourceInfo>,
}

impl EmbyItem {
    fn into_media_item(self, base_url: &str) -> MediaItem {
        let kind = match self.item_type.as_deref() {
            Some("Movie") => ItemKind::Movie,
            Some("Episode") => ItemKind::Episode {
                series_id: self.series_id.clone(),
                series_name: self.series_name.clone(),
                season: self.parent_index_number,
                episode: self.index_number,
            },
            _ => ItemKind::Video,
        };

        let artwork = Artwork {
            primary: build_image_url(base_url, &self.id, "Primary", self.image_tags.primary.as_deref()),
            backdrop: build_image_url(
                base_url,
                &self.id,
                "Backdrop",
                self.backdrop_image_tags.first().map(|s| s.as_str()),
            ),
            logo: build_image_url(base_url, &self.id, "Logo", self.image_tags.logo.as_deref()),
        };

        MediaItem {
            id: self.id,
            name: self.name,
            kind,
            run_time_ticks: self.run_time_ticks.unwrap_or(0),
            resume_ticks: self
                .user_data
                .and_then(|ud| ud.playback_position_ticks)
                .unwrap_or(0),
            part_count: self.part_count.unwrap_or(0),
            media_sources: self.media_sources,
            overview: self.overview,
            year: self.production_year,
            community_rating: self.community_rating,
            premiere_date: self
                .premiere_date
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            artwork,
        }
    }
}

fn build_image_url(
    base_url: &str,
    item_id: &str,
    image_type: &str,
    tag: Option<&str>,
) -> Option<String> {
    tag.map(|t| {
        format!(
            "{}/Items/{}/Images/{}?tag={}",
            base_url, item_id, image_type, t
        )
    })
}
