// Protocol constants shared across the crate.

/// Emby reports durations and playback positions in 100-nanosecond ticks.
pub const TICKS_PER_SECOND: u64 = 10_000_000;

pub const CLIENT_NAME: &str = "embylink";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

// === Local server discovery ===
// Emby servers answer a fixed UDP probe on a well-known port.
pub const DISCOVERY_PORT: u16 = 7359;
pub const DISCOVERY_MESSAGE: &str = "who is EmbyServer?";
pub const DISCOVERY_TIMEOUT_SECS: u64 = 6;
