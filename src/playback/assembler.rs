use std::collections::HashMap;
use tracing::{debug, info};

use super::resolver::SourceResolver;
use super::PlaybackError;
use crate::api::EmbyApi;
use crate::config::PlaybackConfig;
use crate::models::{ItemLabels, MediaItem, PlayMethod, PlayableItem, PlaybackQueue};
use crate::player::PlayerHandle;
use crate::prompt::Prompter;
use crate::session::PlaybackSession;

/// Where a playback request came from. Widget requests get the resume
/// dialog; plugin requests are resolved but handed back to the host
/// instead of being pushed at the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayTrigger {
    Service,
    Widget,
    Plugin,
}

/// How a play request left the assembler.
#[derive(Debug)]
pub enum Dispatch {
    /// The composed item was handed to the active player.
    Queued,
    /// The composed item is returned for host-native playback.
    Resolved(PlayableItem),
}

/// Turns one item id into a single playable dispatch: resume handling,
/// cinema-mode intros, multi-part continuation, composite construction and
/// subtitle attachment, in that order. Any failure along the way aborts the
/// request with nothing handed to the player.
pub struct PlaybackAssembler<'a> {
    api: &'a EmbyApi,
    config: &'a PlaybackConfig,
    prompter: &'a dyn Prompter,
    player: &'a dyn PlayerHandle,
}

impl<'a> PlaybackAssembler<'a> {
    pub fn new(
        api: &'a EmbyApi,
        config: &'a PlaybackConfig,
        prompter: &'a dyn Prompter,
        player: &'a dyn PlayerHandle,
    ) -> Self {
        Self {
            api,
            config,
            prompter,
            player,
        }
    }

    pub async fn play(
        &self,
        session: &mut PlaybackSession,
        item_id: &str,
        trigger: PlayTrigger,
    ) -> Result<Dispatch, PlaybackError> {
        let item = self.api.get_item(item_id).await?;
        info!("Assembling playback for '{}' ({:?})", item.name, trigger);

        let seek_secs = self.resume_offset(&item, trigger).await?;
        let resuming = seek_secs > 0.0;

        let resolver = SourceResolver::new(self.api, self.config);
        let mut queue = PlaybackQueue::new();

        // Intros never play in front of a resumed item.
        if !resuming && self.config.cinema_mode {
            for intro in self.api.get_intros(item_id).await? {
                debug!("Queueing intro '{}'", intro.name);
                queue.push(resolver.resolve(session, &intro).await?);
            }
        }

        let primary = resolver.resolve(session, &item).await?;
        let primary_method = primary.method;
        let primary_url = primary.url.clone();
        queue.push(primary);

        if item.part_count > 1 {
            for part in self.api.get_additional_parts(item_id).await? {
                debug!("Queueing additional part '{}'", part.name);
                queue.push(resolver.resolve(session, &part).await?);
            }
        }

        // Multi-segment queues collapse into one composite reference that is
        // tracked under the primary item's method.
        let url = match queue.composite() {
            Some(composite) => {
                session.record_composite(&composite, &item, primary_method);
                composite
            }
            None => primary_url,
        };

        let subtitles = if primary_method != PlayMethod::Transcode {
            self.attach_subtitles(session, &url, &item, primary_method)
        } else {
            Vec::new()
        };

        let playable = PlayableItem {
            url,
            start_offset_secs: seek_secs,
            subtitles,
            labels: ItemLabels::from_item(&item),
            artwork: item.artwork.clone(),
        };

        match trigger {
            PlayTrigger::Plugin => Ok(Dispatch::Resolved(playable)),
            PlayTrigger::Service | PlayTrigger::Widget => {
                self.player.play(playable).await?;
                Ok(Dispatch::Queued)
            }
        }
    }

    /// Decide the start offset, asking the user when a widget request hits a
    /// partially-watched item. Dismissing the dialog cancels the request.
    async fn resume_offset(
        &self,
        item: &MediaItem,
        trigger: PlayTrigger,
    ) -> Result<f64, PlaybackError> {
        let seek_secs = effective_seek(item.resume_secs(), self.config.jump_back_secs);
        if trigger != PlayTrigger::Widget || seek_secs <= 0.0 {
            return Ok(seek_secs);
        }

        let options = vec![
            format!("Resume from {}", format_offset(seek_secs)),
            "Play from beginning".to_string(),
        ];
        match self.prompter.select(&item.name, &options).await {
            Some(0) => Ok(seek_secs),
            Some(_) => Ok(0.0),
            None => Err(PlaybackError::Cancelled),
        }
    }

    /// Collect downloadable subtitles from the first media source, assigning
    /// local slots in stream order and recording the slot to stream-index
    /// mapping against the URL key.
    fn attach_subtitles(
        &self,
        session: &mut PlaybackSession,
        url_key: &str,
        item: &MediaItem,
        method: PlayMethod,
    ) -> Vec<String> {
        let Some(source) = item.media_sources.first() else {
            return Vec::new();
        };

        let mut urls = Vec::new();
        let mut mapping = HashMap::new();
        for stream in &source.media_streams {
            if !stream.is_external_text_subtitle() {
                continue;
            }
            let url = match (&method, &stream.path) {
                (PlayMethod::DirectPlay, Some(path)) => path.clone(),
                _ => self.api.subtitle_url(&item.id, stream.index),
            };
            mapping.insert(urls.len(), stream.index);
            urls.push(url);
        }

        if !mapping.is_empty() {
            debug!("Attached {} external subtitles to {}", urls.len(), url_key);
            session.set_subtitle_mapping(url_key, mapping);
        }
        urls
    }
}

/// Saved position minus the configured jump-back, floored at zero.
pub(crate) fn effective_seek(resume_secs: f64, jump_back_secs: u32) -> f64 {
    (resume_secs - jump_back_secs as f64).max(0.0)
}

fn format_offset(secs: f64) -> String {
    let total = secs as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
