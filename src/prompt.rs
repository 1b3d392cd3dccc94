use async_trait::async_trait;

/// Dialog surface provided by the host. Consumed by the playback assembler
/// (resume choice) and the discovery flow (server/user selection, one-time
/// setup questions); never implemented here beyond test fakes.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Present a list of options. `None` means the user backed out.
    async fn select(&self, heading: &str, options: &[String]) -> Option<usize>;

    /// Yes/no question; returns true for the yes label.
    async fn confirm(&self, heading: &str, text: &str, no_label: &str, yes_label: &str) -> bool;

    /// Informational dialog, acknowledged and dismissed.
    async fn ok(&self, heading: &str, text: &str);

    /// Ask for a username/password pair. `None` when dismissed.
    async fn credentials(&self, heading: &str) -> Option<(String, String)>;
}
