use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::TICKS_PER_SECOND;

/// Item classification with the fields that only exist for episodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Movie,
    Episode {
        series_id: Option<String>,
        series_name: Option<String>,
        season: Option<u32>,
        episode: Option<u32>,
    },
    /// Trailers, intros and anything else the server serves as plain video.
    Video,
}

/// Immutable snapshot of a server item, fetched per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub run_time_ticks: u64,
    /// Saved playback position in ticks, zero when unwatched.
    pub resume_ticks: u64,
    pub part_count: u32,
    pub media_sources: Vec<MediaSourceInfo>,
    pub overview: Option<String>,
    pub year: Option<u32>,
    pub community_rating: Option<f32>,
    pub premiere_date: Option<DateTime<Utc>>,
    pub artwork: Artwork,
}

impl MediaItem {
    pub fn resume_secs(&self) -> f64 {
        self.resume_ticks as f64 / TICKS_PER_SECOND as f64
    }

    /// Id the host should refresh after playback: the series for episodes,
    /// the item itself for everything else.
    pub fn refresh_id(&self) -> String {
        match &self.kind {
            ItemKind::Episode {
                series_id: Some(series_id),
                ..
            } => series_id.clone(),
            _ => self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artwork {
    pub primary: Option<String>,
    pub backdrop: Option<String>,
    pub logo: Option<String>,
}

/// One playable rendition of an item, as reported by PlaybackInfo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaSourceInfo {
    #[serde(default)]
    pub id: String,
    pub path: Option<String>,
    pub protocol: Option<String>,
    #[serde(default)]
    pub supports_direct_play: bool,
    #[serde(default)]
    pub supports_direct_stream: bool,
    #[serde(default)]
    pub media_streams: Vec<MediaStream>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaStream {
    #[serde(default)]
    pub index: u32,
    #[serde(rename = "Type", default)]
    pub stream_type: String,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub is_text_subtitle_stream: bool,
    pub path: Option<String>,
}

impl MediaStream {
    /// External text subtitles are the only streams the server offers for
    /// separate download.
    pub fn is_external_text_subtitle(&self) -> bool {
        self.stream_type == "Subtitle" && self.is_external && self.is_text_subtitle_stream
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMethod {
    DirectPlay,
    DirectStream,
    Transcode,
}

impl fmt::Display for PlayMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayMethod::DirectPlay => "DirectPlay",
            PlayMethod::DirectStream => "DirectStream",
            PlayMethod::Transcode => "Transcode",
        };
        write!(f, "{}", name)
    }
}

/// A playable URL plus the method the server settled on.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub url: String,
    pub method: PlayMethod,
}

/// Ordered playback segments: intros first, then the primary item, then any
/// additional parts.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    sources: Vec<ResolvedSource>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: ResolvedSource) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[ResolvedSource] {
        &self.sources
    }

    /// Single composite reference concatenating every segment in order.
    /// Only built for multi-segment queues; a single segment plays verbatim.
    pub fn composite(&self) -> Option<String> {
        if self.sources.len() > 1 {
            let urls: Vec<&str> = self.sources.iter().map(|s| s.url.as_str()).collect();
            Some(format!("stack://{}", urls.join(" , ")))
        } else {
            None
        }
    }
}

/// A server produced by discovery; the selected one is persisted as the
/// active configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Machine identifier reported by the server.
    pub id: String,
    pub name: String,
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub access_token: Option<String>,
}

impl ServerRecord {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Entry from the server's public user list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserRecord {
    pub name: String,
    #[serde(default)]
    pub has_password: bool,
}

impl UserRecord {
    pub fn display_name(&self) -> String {
        if self.has_password {
            format!("{} (secure)", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Reachability of a candidate server, as probed during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Ok,
    Unauthorized,
    Unreachable,
}

/// Metadata labels attached to a dispatched item.
#[derive(Debug, Clone, Default)]
pub struct ItemLabels {
    pub title: String,
    pub year: Option<u32>,
    pub plot: Option<String>,
    pub rating: Option<f32>,
    pub premiered: Option<DateTime<Utc>>,
    pub show_title: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl ItemLabels {
    pub fn from_item(item: &MediaItem) -> Self {
        let mut labels = Self {
            title: item.name.clone(),
            year: item.year,
            plot: item.overview.clone(),
            rating: item.community_rating,
            premiered: item.premiere_date,
            ..Self::default()
        };

        if let ItemKind::Episode {
            series_name,
            season,
            episode,
            ..
        } = &item.kind
        {
            labels.show_title = series_name.clone();
            labels.season = *season;
            labels.episode = *episode;
        }

        labels
    }
}

/// What gets handed to the playback sink: a URL (possibly composite) with
/// its metadata and artwork bag.
#[derive(Debug, Clone, Default)]
pub struct PlayableItem {
    pub url: String,
    pub start_offset_secs: f64,
    pub subtitles: Vec<String>,
    pub labels: ItemLabels,
    pub artwork: Artwork,
}
