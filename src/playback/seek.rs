use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::player::PlayerHandle;

/// Bounds for the wait-for-start poll and the seek-confirmation retries.
/// Both caps are hard limits so a player that never starts (or never lands
/// on the target) can only cost a fixed amount of wall time.
#[derive(Debug, Clone)]
pub struct SeekPolicy {
    /// Maximum number of is-playing polls before giving up on the start.
    pub max_start_polls: u32,
    /// Delay between is-playing polls.
    pub poll_interval: Duration,
    /// Maximum number of seek commands issued before accepting the position.
    pub max_seek_attempts: u32,
    /// Delay between seek attempts.
    pub seek_interval: Duration,
    /// A reported position within this distance of the target counts as done.
    pub tolerance: Duration,
}

impl Default for SeekPolicy {
    fn default() -> Self {
        Self {
            max_start_polls: 10,
            poll_interval: Duration::from_millis(500),
            max_seek_attempts: 10,
            seek_interval: Duration::from_millis(100),
            tolerance: Duration::from_secs(5),
        }
    }
}

impl SeekPolicy {
    /// Wait for the player to report active playback. Returns false once
    /// `max_start_polls` checks have failed.
    pub async fn wait_for_start(&self, player: &dyn PlayerHandle) -> bool {
        let mut polls = 0;
        while !player.is_playing().await {
            polls += 1;
            if polls >= self.max_start_polls {
                return false;
            }
            sleep(self.poll_interval).await;
        }
        true
    }

    /// Wait for playback to begin, then repeatedly seek until the reported
    /// position is within `tolerance` of the target or the retry cap is hit.
    /// Returns whether the target position was confirmed.
    pub async fn seek_to_position(&self, player: &dyn PlayerHandle, target: Duration) -> bool {
        if !self.wait_for_start(player).await {
            warn!(
                "Player did not start within {} polls, skipping seek to {:?}",
                self.max_start_polls, target
            );
            return false;
        }

        let mut attempts = 0;
        while self.below_target(player.position().await, target) {
            if attempts >= self.max_seek_attempts {
                warn!(
                    "Position still short of {:?} after {} seek attempts",
                    target, attempts
                );
                break;
            }
            attempts += 1;
            debug!("Seeking to {:?} (attempt {})", target, attempts);
            if let Err(e) = player.seek(target).await {
                warn!("Seek command failed: {}", e);
                return false;
            }
            sleep(self.seek_interval).await;
        }

        !self.below_target(player.position().await, target)
    }

    fn below_target(&self, position: Option<Duration>, target: Duration) -> bool {
        match position {
            Some(position) => position + self.tolerance < target,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakePlayer;
    use std::sync::atomic::Ordering;

    fn fast_policy() -> SeekPolicy {
        SeekPolicy {
            max_start_polls: 10,
            poll_interval: Duration::from_millis(1),
            max_seek_attempts: 10,
            seek_interval: Duration::from_millis(1),
            tolerance: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_wait_for_start_succeeds_within_bounds() {
        let player = FakePlayer::new().starting_after(3);
        assert!(fast_policy().wait_for_start(&player).await);
        // 3 failed polls plus the succeeding one.
        assert_eq!(player.is_playing_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_wait_for_start_gives_up_after_cap() {
        let player = FakePlayer::new().never_starting();
        assert!(!fast_policy().wait_for_start(&player).await);
        assert_eq!(player.is_playing_calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_seek_reaches_target_on_second_attempt() {
        let player = FakePlayer::new().starting_after(3).on_target_after(2);
        let target = Duration::from_secs(120);

        assert!(fast_policy().seek_to_position(&player, target).await);
        assert_eq!(player.seek_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_seek_returns_when_player_never_starts() {
        let player = FakePlayer::new().never_starting();
        let target = Duration::from_secs(120);

        assert!(!fast_policy().seek_to_position(&player, target).await);
        assert_eq!(player.seek_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_seek_attempts_are_capped() {
        // Player starts immediately but never reaches the target.
        let player = FakePlayer::new().on_target_after(u32::MAX);
        let target = Duration::from_secs(120);

        assert!(!fast_policy().seek_to_position(&player, target).await);
        assert_eq!(player.seek_calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_position_within_tolerance_skips_seeking() {
        let player = FakePlayer::new();
        *player.position.lock().await = Duration::from_secs(118);
        let target = Duration::from_secs(120);

        assert!(fast_policy().seek_to_position(&player, target).await);
        assert_eq!(player.seek_calls.load(Ordering::SeqCst), 0);
    }
}
