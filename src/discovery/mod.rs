mod broadcast;
mod credentials;
mod directory;

pub use credentials::CredentialStore;
pub use directory::{ConnectDirectory, DirectoryService};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, EmbyApi};
use crate::config::Config;
use crate::models::{ConnectionStatus, ServerRecord};
use crate::prompt::Prompter;

/// Why first-run setup ended without a configured server. Nothing here is
/// fatal; the host surfaces the outcome and may retry later.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("setup cancelled by user")]
    UserAborted,

    #[error("no servers found")]
    NoCandidates,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// First-run flow: gather candidate servers from the directory service and
/// a local broadcast probe, let the user pick one, validate it, pick a user
/// and ask the one-time setup questions. Mutates the config in place; the
/// caller decides when to persist it.
pub struct ServerDiscovery<'a> {
    directory: &'a dyn DirectoryService,
    prompter: &'a dyn Prompter,
    credentials: &'a CredentialStore,
    use_broadcast: bool,
}

impl<'a> ServerDiscovery<'a> {
    pub fn new(
        directory: &'a dyn DirectoryService,
        prompter: &'a dyn Prompter,
        credentials: &'a CredentialStore,
    ) -> Self {
        Self {
            directory,
            prompter,
            credentials,
            use_broadcast: true,
        }
    }

    /// Skip the UDP probe, for hosts on networks where broadcast is blocked.
    pub fn without_broadcast(mut self) -> Self {
        self.use_broadcast = false;
        self
    }

    pub async fn run(&self, config: &mut Config) -> Result<ServerRecord, DiscoveryError> {
        if let Some(record) = config.server_record() {
            debug!("Server '{}' already configured, skipping discovery", record.name);
            return Ok(record);
        }

        let token = if config.directory.enabled {
            self.directory_token(config).await
        } else {
            None
        };

        let candidates = self.gather_candidates(token.as_deref()).await;
        if candidates.is_empty() {
            info!("Discovery found no candidate servers");
            return Err(DiscoveryError::NoCandidates);
        }

        let record = self.select_server(config, &candidates).await?;
        config.set_server(&record);

        if config.user.user_id.is_none() && config.user.username.is_none() {
            self.select_user(config, &record).await?;
        }

        self.first_run_prompts(config).await;

        info!("Discovery selected server '{}'", record.name);
        Ok(record)
    }

    /// A usable directory token, from storage when the stored one still
    /// validates, otherwise from a fresh sign-in. `None` keeps the flow
    /// going with local discovery only.
    async fn directory_token(&self, config: &mut Config) -> Option<String> {
        match self.credentials.load() {
            Ok(Some((_, token))) => match self.directory.validate(&token).await {
                Ok(()) => return Some(token),
                Err(e) if e.is_auth_failure() => {
                    info!("Stored directory token rejected, asking to sign in again");
                    self.prompter
                        .ok(
                            "Directory sign-in",
                            "Your sign-in has expired. Please sign in again.",
                        )
                        .await;
                }
                Err(e) => {
                    warn!("Directory unreachable, continuing locally: {}", e);
                    self.prompter
                        .ok(
                            "Directory sign-in",
                            "The directory service could not be reached. Servers on your network can still be found.",
                        )
                        .await;
                    return None;
                }
            },
            Ok(None) => {}
            Err(e) => warn!("Could not read stored directory credentials: {}", e),
        }

        self.prompt_sign_in(config).await
    }

    async fn prompt_sign_in(&self, config: &mut Config) -> Option<String> {
        loop {
            let Some((username, password)) =
                self.prompter.credentials("Sign in to directory").await
            else {
                return None;
            };
            // An empty login is the escape hatch out of the retry loop.
            if username.is_empty() {
                return None;
            }

            match self.directory.sign_in(&username, &password).await {
                Ok(token) => {
                    if let Err(e) = self.credentials.save(&username, &token) {
                        warn!("Could not store directory credentials: {}", e);
                    }
                    config.directory.username = Some(username);
                    return Some(token);
                }
                Err(e) if e.is_auth_failure() => {
                    self.prompter
                        .ok("Sign in failed", "Incorrect username or password.")
                        .await;
                }
                Err(e) => {
                    warn!("Directory sign-in failed: {}", e);
                    return None;
                }
            }
        }
    }

    async fn gather_candidates(&self, token: Option<&str>) -> Vec<ServerRecord> {
        let mut candidates: Vec<ServerRecord> = Vec::new();

        if let Some(token) = token {
            match self.directory.servers(token).await {
                Ok(servers) => candidates.extend(servers),
                Err(e) => warn!("Directory server list unavailable: {}", e),
            }
        }

        if self.use_broadcast {
            match broadcast::probe().await {
                Ok(Some(record)) => {
                    let known = !record.id.is_empty()
                        && candidates.iter().any(|c| c.id == record.id);
                    if !known {
                        candidates.push(record);
                    }
                }
                Ok(None) => debug!("No broadcast reply"),
                Err(e) => warn!("Broadcast probe failed: {}", e),
            }
        }

        candidates
    }

    /// Let the user pick a candidate and make sure it actually answers.
    /// Rejected tokens trigger a sign-in against the server itself;
    /// unreachable picks offer another round.
    async fn select_server(
        &self,
        config: &mut Config,
        candidates: &[ServerRecord],
    ) -> Result<ServerRecord, DiscoveryError> {
        let names: Vec<String> = candidates
            .iter()
            .map(|c| format!("{} ({}:{})", c.name, c.host, c.port))
            .collect();

        loop {
            let Some(choice) = self.prompter.select("Select server", &names).await else {
                return Err(DiscoveryError::UserAborted);
            };
            // An out-of-range answer from the host counts as backing out.
            let Some(mut record) = candidates.get(choice).cloned() else {
                return Err(DiscoveryError::UserAborted);
            };

            match EmbyApi::check_connection(&record).await {
                ConnectionStatus::Ok => return Ok(record),
                ConnectionStatus::Unauthorized => {
                    if self.server_sign_in(config, &mut record).await {
                        return Ok(record);
                    }
                    return Err(DiscoveryError::UserAborted);
                }
                ConnectionStatus::Unreachable => {
                    let retry = self
                        .prompter
                        .confirm(
                            "Connection failed",
                            &format!("Could not reach {}. Pick another server?", record.name),
                            "Cancel",
                            "Pick again",
                        )
                        .await;
                    if !retry {
                        return Err(DiscoveryError::UserAborted);
                    }
                }
            }
        }
    }

    /// Username/password sign-in against the selected server. Success also
    /// settles the active user, so the public-user prompt is skipped.
    async fn server_sign_in(&self, config: &mut Config, record: &mut ServerRecord) -> bool {
        loop {
            let Some((username, password)) = self
                .prompter
                .credentials(&format!("Sign in to {}", record.name))
                .await
            else {
                return false;
            };
            if username.is_empty() {
                return false;
            }

            match EmbyApi::authenticate(&record.base_url(), &username, &password).await {
                Ok(auth) => {
                    record.access_token = Some(auth.access_token);
                    config.set_user(&auth.user.id, &auth.user.name);
                    return true;
                }
                Err(e) if e.is_auth_failure() => {
                    self.prompter
                        .ok("Sign in failed", "Incorrect username or password.")
                        .await;
                }
                Err(e) => {
                    warn!("Could not sign in to {}: {}", record.name, e);
                    return false;
                }
            }
        }
    }

    async fn select_user(
        &self,
        config: &mut Config,
        record: &ServerRecord,
    ) -> Result<(), DiscoveryError> {
        let users = EmbyApi::get_public_users(&record.base_url()).await?;
        if users.is_empty() {
            // Hidden user list; the host signs in on first playback instead.
            debug!("Server publishes no public users");
            return Ok(());
        }

        let names: Vec<String> = users.iter().map(|u| u.display_name()).collect();
        let Some(choice) = self.prompter.select("Select user", &names).await else {
            return Err(DiscoveryError::UserAborted);
        };
        let Some(user) = users.get(choice) else {
            return Err(DiscoveryError::UserAborted);
        };

        config.user.username = Some(user.name.clone());
        Ok(())
    }

    /// One-time setup questions, each asked exactly once per install.
    async fn first_run_prompts(&self, config: &mut Config) {
        if !config.playback.prompted_direct_paths {
            let native = self
                .prompter
                .confirm(
                    "Playback mode",
                    "Play files over native network paths instead of server streams?",
                    "Server streams",
                    "Native paths",
                )
                .await;
            config.playback.direct_paths = native;
            config.playback.prompted_direct_paths = true;

            if native && !config.network.prompted_credentials {
                let review = self
                    .prompter
                    .confirm(
                        "Network credentials",
                        "Native paths may need credentials for your network shares. Review them now?",
                        "Later",
                        "Review",
                    )
                    .await;
                if review {
                    self.prompter
                        .ok(
                            "Network credentials",
                            "Add your share credentials in the host's network settings.",
                        )
                        .await;
                }
                config.network.prompted_credentials = true;
            }
        }

        if !config.music.prompted {
            let disable = self
                .prompter
                .confirm(
                    "Music library",
                    "Disable the music library?",
                    "Keep it",
                    "Disable",
                )
                .await;
            config.music.enabled = !disable;
            if !disable {
                config.music.direct_stream = self
                    .prompter
                    .confirm(
                        "Music library",
                        "Stream music directly from the server?",
                        "Resolve through addon",
                        "Direct stream",
                    )
                    .await;
            }
            config.music.prompted = true;
        }
    }
}
