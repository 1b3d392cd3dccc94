#![cfg(test)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex as SyncMutex;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::models::PlayableItem;
use crate::player::PlayerHandle;
use crate::prompt::Prompter;

/// Scriptable player for exercising queueing, dispatch and seek flows.
pub struct FakePlayer {
    pub is_playing_calls: AtomicU32,
    pub seek_calls: AtomicU32,
    pub play_queue_calls: AtomicU32,
    pub clear_calls: AtomicU32,
    pub position: Mutex<Duration>,
    pub queued: Mutex<Vec<PlayableItem>>,
    pub played: Mutex<Vec<PlayableItem>>,
    starts_after_polls: u32,
    never_starts: bool,
    seeks_until_on_target: u32,
}

impl FakePlayer {
    pub fn new() -> Self {
        Self {
            is_playing_calls: AtomicU32::new(0),
            seek_calls: AtomicU32::new(0),
            play_queue_calls: AtomicU32::new(0),
            clear_calls: AtomicU32::new(0),
            position: Mutex::new(Duration::ZERO),
            queued: Mutex::new(Vec::new()),
            played: Mutex::new(Vec::new()),
            starts_after_polls: 0,
            never_starts: false,
            seeks_until_on_target: 1,
        }
    }

    /// Report not-playing for the first `polls` checks.
    pub fn starting_after(mut self, polls: u32) -> Self {
        self.starts_after_polls = polls;
        self
    }

    pub fn never_starting(mut self) -> Self {
        self.never_starts = true;
        self
    }

    /// The position only lands on the seek target once this many seek
    /// commands have been issued.
    pub fn on_target_after(mut self, seeks: u32) -> Self {
        self.seeks_until_on_target = seeks;
        self
    }
}

#[async_trait]
impl PlayerHandle for FakePlayer {
    async fn queue(&self, item: PlayableItem) -> Result<()> {
        self.queued.lock().await.push(item);
        Ok(())
    }

    async fn play_queue(&self) -> Result<()> {
        self.play_queue_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn play(&self, item: PlayableItem) -> Result<()> {
        self.played.lock().await.push(item);
        Ok(())
    }

    async fn clear_queue(&self) -> Result<()> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.queued.lock().await.clear();
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        let calls = self.is_playing_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.never_starts {
            return false;
        }
        calls > self.starts_after_polls
    }

    async fn position(&self) -> Option<Duration> {
        Some(*self.position.lock().await)
    }

    async fn seek(&self, position: Duration) -> Result<()> {
        let seeks = self.seek_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if seeks >= self.seeks_until_on_target {
            *self.position.lock().await = position;
        }
        Ok(())
    }
}

/// Prompter answering from pre-loaded responses. Exhausted queues fall back
/// to dismissal so a mis-scripted test aborts instead of hanging.
#[derive(Default)]
pub struct FakePrompter {
    select_responses: SyncMutex<VecDeque<Option<usize>>>,
    confirm_responses: SyncMutex<VecDeque<bool>>,
    credential_responses: SyncMutex<VecDeque<Option<(String, String)>>>,
    pub headings: SyncMutex<Vec<String>>,
    pub select_options: SyncMutex<Vec<Vec<String>>>,
}

impl FakePrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_select(self, response: Option<usize>) -> Self {
        self.select_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn with_confirm(self, response: bool) -> Self {
        self.confirm_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn with_credentials(self, response: Option<(String, String)>) -> Self {
        self.credential_responses
            .lock()
            .unwrap()
            .push_back(response);
        self
    }

    pub fn select_count(&self) -> usize {
        self.select_options.lock().unwrap().len()
    }
}

#[async_trait]
impl Prompter for FakePrompter {
    async fn select(&self, heading: &str, options: &[String]) -> Option<usize> {
        self.headings.lock().unwrap().push(heading.to_string());
        self.select_options.lock().unwrap().push(options.to_vec());
        self.select_responses
            .lock()
            .unwrap()
            .pop_front()
            .flatten()
    }

    async fn confirm(&self, heading: &str, _text: &str, _no_label: &str, _yes_label: &str) -> bool {
        self.headings.lock().unwrap().push(heading.to_string());
        self.confirm_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(false)
    }

    async fn ok(&self, heading: &str, _text: &str) {
        self.headings.lock().unwrap().push(heading.to_string());
    }

    async fn credentials(&self, heading: &str) -> Option<(String, String)> {
        self.headings.lock().unwrap().push(heading.to_string());
        self.credential_responses
            .lock()
            .unwrap()
            .pop_front()
            .flatten()
    }
}
