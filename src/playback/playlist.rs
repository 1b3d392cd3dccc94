use std::time::Duration;
use tracing::{info, warn};

use super::resolver::SourceResolver;
use super::seek::SeekPolicy;
use super::PlaybackError;
use crate::api::EmbyApi;
use crate::config::PlaybackConfig;
use crate::constants::TICKS_PER_SECOND;
use crate::models::{ItemLabels, PlayableItem};
use crate::player::PlayerHandle;
use crate::session::PlaybackSession;

/// Resolves an ordered id list into the host queue. Items that fail to
/// resolve are skipped, not fatal; playback starts as soon as the first
/// item lands so the rest of the queue fills behind it.
pub struct PlaylistBuilder<'a> {
    api: &'a EmbyApi,
    config: &'a PlaybackConfig,
    player: &'a dyn PlayerHandle,
    seek_policy: SeekPolicy,
}

impl<'a> PlaylistBuilder<'a> {
    pub fn new(api: &'a EmbyApi, config: &'a PlaybackConfig, player: &'a dyn PlayerHandle) -> Self {
        Self {
            api,
            config,
            player,
            seek_policy: SeekPolicy::default(),
        }
    }

    pub fn with_seek_policy(mut self, policy: SeekPolicy) -> Self {
        self.seek_policy = policy;
        self
    }

    /// Replace the host queue with the given items and start playback.
    /// `start_ticks` selects a position inside the first item; the seek is
    /// confirmed with bounded retries once the player reports activity.
    pub async fn build_and_play(
        &self,
        session: &mut PlaybackSession,
        item_ids: &[String],
        start_ticks: u64,
    ) -> Result<(), PlaybackError> {
        self.player.clear_queue().await?;

        let queued = self.append(session, item_ids, true).await?;
        if queued == 0 {
            return Err(PlaybackError::Unavailable {
                item_id: item_ids.first().cloned().unwrap_or_default(),
            });
        }
        info!("Queued {} of {} playlist items", queued, item_ids.len());

        if start_ticks > 0 {
            let target = Duration::from_secs_f64(start_ticks as f64 / TICKS_PER_SECOND as f64);
            if !self.seek_policy.seek_to_position(self.player, target).await {
                warn!("Could not confirm start position {:?}", target);
            }
        }

        Ok(())
    }

    /// Append items to the existing host queue without starting playback.
    /// Returns how many items landed.
    pub async fn add_to_playlist(
        &self,
        session: &mut PlaybackSession,
        item_ids: &[String],
    ) -> Result<usize, PlaybackError> {
        self.append(session, item_ids, false).await
    }

    async fn append(
        &self,
        session: &mut PlaybackSession,
        item_ids: &[String],
        start_on_first: bool,
    ) -> Result<usize, PlaybackError> {
        let resolver = SourceResolver::new(self.api, self.config);
        let mut queued = 0;

        for item_id in item_ids {
            let playable = match self.resolve_one(session, &resolver, item_id).await {
                Ok(playable) => playable,
                Err(e) => {
                    warn!("Skipping playlist item {}: {}", item_id, e);
                    continue;
                }
            };

            self.player.queue(playable).await?;
            queued += 1;
            if start_on_first && queued == 1 {
                self.player.play_queue().await?;
            }
        }

        Ok(queued)
    }

    async fn resolve_one(
        &self,
        session: &mut PlaybackSession,
        resolver: &SourceResolver<'_>,
        item_id: &str,
    ) -> Result<PlayableItem, PlaybackError> {
        let item = self.api.get_item(item_id).await?;
        let resolved = resolver.resolve(session, &item).await?;

        Ok(PlayableItem {
            url: resolved.url,
            start_offset_secs: 0.0,
            subtitles: Vec::new(),
            labels: ItemLabels::from_item(&item),
            artwork: item.artwork,
        })
    }
}
