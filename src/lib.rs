//! Async client library for Emby-compatible media servers: resolves items
//! to playable streams (direct play, direct stream or transcode), assembles
//! playback with intros, multi-part composites and external subtitles,
//! builds host player queues, and runs the first-time server discovery and
//! sign-in flow. Player and dialog surfaces are traits supplied by the host.

pub mod api;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod models;
pub mod playback;
pub mod player;
pub mod prompt;
pub mod session;

#[cfg(test)]
mod test_utils;

pub use api::{ApiError, EmbyApi};
pub use config::Config;
pub use discovery::{ConnectDirectory, CredentialStore, DiscoveryError, ServerDiscovery};
pub use models::{
    ItemKind, MediaItem, PlayMethod, PlayableItem, PlaybackQueue, ResolvedSource, ServerRecord,
    UserRecord,
};
pub use playback::{
    Dispatch, PlayTrigger, PlaybackAssembler, PlaybackError, PlaylistBuilder, SeekPolicy,
    SourceResolver,
};
pub use player::PlayerHandle;
pub use prompt::Prompter;
pub use session::PlaybackSession;
