use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::models::PlayableItem;

/// Handle to the host's playback engine. The crate only drives it: queueing
/// resolved items, starting playback, and confirming seeks.
#[async_trait]
pub trait PlayerHandle: Send + Sync {
    /// Append an item to the host playback queue without starting it.
    async fn queue(&self, item: PlayableItem) -> Result<()>;

    /// Start playing the current queue from the top.
    async fn play_queue(&self) -> Result<()>;

    /// Play a single item immediately on the active player session.
    async fn play(&self, item: PlayableItem) -> Result<()>;

    /// Drop all queued items.
    async fn clear_queue(&self) -> Result<()>;

    async fn is_playing(&self) -> bool;

    /// Current playback position, if the player reports one.
    async fn position(&self) -> Option<Duration>;

    async fn seek(&self, position: Duration) -> Result<()>;
}
