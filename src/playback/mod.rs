mod assembler;
mod playlist;
mod resolver;
mod seek;

pub use assembler::{Dispatch, PlayTrigger, PlaybackAssembler};
pub use playlist::PlaylistBuilder;
pub use resolver::SourceResolver;
pub use seek::SeekPolicy;

use thiserror::Error;

use crate::api::ApiError;

/// Failures that abort a single playback request. None of these touch
/// state already handed to the player; control returns to the host.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The server offered no playable source for the item.
    #[error("no playable source for item {item_id}")]
    Unavailable { item_id: String },

    /// The user cancelled the resume dialog; the whole request is dropped.
    #[error("playback cancelled by user")]
    Cancelled,

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The host player rejected a queue/play/seek call.
    #[error("player error: {0}")]
    Player(#[from] anyhow::Error),
}
