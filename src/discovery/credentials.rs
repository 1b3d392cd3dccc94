use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

const KEYRING_SERVICE: &str = "dev.arsfeld.Embylink";
const KEYRING_ACCOUNT: &str = "directory";

/// Stores the directory-service login as `username|token`, preferring the
/// OS keyring with an obfuscated file as fallback for systems without one.
pub struct CredentialStore {
    use_keyring: bool,
    fallback_path: PathBuf,
}

impl CredentialStore {
    pub fn new() -> Result<Self> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(Self {
            use_keyring: true,
            fallback_path: config_dir.join("embylink").join(".directory.cred"),
        })
    }

    /// File-only store, for hosts where the keyring is known to be absent.
    pub fn file_only(path: PathBuf) -> Self {
        Self {
            use_keyring: false,
            fallback_path: path,
        }
    }

    pub fn save(&self, username: &str, token: &str) -> Result<()> {
        let credentials = format!("{}|{}", username, token);

        if self.use_keyring {
            match keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT) {
                Ok(entry) => match entry.set_password(&credentials) {
                    Ok(_) => {
                        info!("Directory credentials saved to keyring");
                        return Ok(());
                    }
                    Err(e) => {
                        warn!("Failed to save to keyring: {}, using file fallback", e);
                    }
                },
                Err(e) => {
                    warn!("Failed to create keyring entry: {}, using file fallback", e);
                }
            }
        }

        self.write_file(&credentials)?;
        info!("Directory credentials saved to file");
        Ok(())
    }

    pub fn load(&self) -> Result<Option<(String, String)>> {
        if self.use_keyring
            && let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)
            && let Ok(credentials) = entry.get_password()
            && let Some(parsed) = split_credentials(&credentials)
        {
            return Ok(Some(parsed));
        }

        let Some(credentials) = self.read_file()? else {
            return Ok(None);
        };
        Ok(split_credentials(&credentials))
    }

    pub fn clear(&self) -> Result<()> {
        if self.use_keyring
            && let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)
        {
            let _ = entry.delete_credential();
        }
        if self.fallback_path.exists() {
            std::fs::remove_file(&self.fallback_path).context("Failed to remove credential file")?;
        }
        Ok(())
    }

    fn write_file(&self, credentials: &str) -> Result<()> {
        if let Some(parent) = self.fallback_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create credential directory")?;
        }

        std::fs::write(&self.fallback_path, obfuscate(credentials.as_bytes()))
            .context("Failed to write credential file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&self.fallback_path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&self.fallback_path, perms)?;
        }

        Ok(())
    }

    fn read_file(&self) -> Result<Option<String>> {
        if !self.fallback_path.exists() {
            return Ok(None);
        }

        let obfuscated = std::fs::read(&self.fallback_path).context("Failed to read credential file")?;
        let credentials =
            String::from_utf8(obfuscate(&obfuscated)).context("Credential file is corrupt")?;
        Ok(Some(credentials))
    }
}

// XOR with a position-dependent byte; applying it twice round-trips. The
// index byte wraps, so inputs longer than 213 bytes stay in range.
fn obfuscate(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .enumerate()
        .map(|(i, &b)| b ^ (i as u8).wrapping_add(42))
        .collect()
}

fn split_credentials(credentials: &str) -> Option<(String, String)> {
    let (username, token) = credentials.split_once('|')?;
    if username.is_empty() || token.is_empty() {
        return None;
    }
    Some((username.to_string(), token.to_string()))
}
