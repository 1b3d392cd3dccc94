use tracing::{debug, info};

use super::PlaybackError;
use crate::api::EmbyApi;
use crate::config::PlaybackConfig;
use crate::models::{MediaItem, MediaSourceInfo, PlayMethod, ResolvedSource};
use crate::session::PlaybackSession;

/// Picks direct play, direct stream or transcode for one item and builds
/// the matching URL. The actual capability decision comes from the server's
/// PlaybackInfo endpoint; this only ranks the answers.
pub struct SourceResolver<'a> {
    api: &'a EmbyApi,
    config: &'a PlaybackConfig,
}

impl<'a> SourceResolver<'a> {
    pub fn new(api: &'a EmbyApi, config: &'a PlaybackConfig) -> Self {
        Self { api, config }
    }

    /// Resolve an item to a playable URL, recording the chosen method and
    /// the item's bookkeeping against the URL key in the session.
    pub async fn resolve(
        &self,
        session: &mut PlaybackSession,
        item: &MediaItem,
    ) -> Result<ResolvedSource, PlaybackError> {
        let sources = self.api.get_playback_info(&item.id).await?;

        let Some(source) = sources.first() else {
            info!("No media sources reported for item {}", item.id);
            return Err(PlaybackError::Unavailable {
                item_id: item.id.clone(),
            });
        };

        let (url, method) = self.pick(&item.id, source);
        debug!("Resolved item {} as {} via {}", item.id, method, url);

        session.record(&url, item, method);

        Ok(ResolvedSource { url, method })
    }

    fn pick(&self, item_id: &str, source: &MediaSourceInfo) -> (String, PlayMethod) {
        // Native paths bypass the server entirely; only meaningful when the
        // host can reach the file over the same mounts.
        if self.config.direct_paths
            && source.protocol.as_deref() == Some("File")
            && let Some(path) = &source.path
        {
            return (path.clone(), PlayMethod::DirectPlay);
        }

        if source.supports_direct_play {
            (
                self.api.direct_play_url(item_id, &source.id),
                PlayMethod::DirectPlay,
            )
        } else if source.supports_direct_stream {
            (
                self.api.direct_stream_url(item_id, &source.id),
                PlayMethod::DirectStream,
            )
        } else {
            (
                self.api.transcode_url(item_id, &source.id),
                PlayMethod::Transcode,
            )
        }
    }
}
