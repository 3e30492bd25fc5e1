use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use crate::cli::Args;
use crate::config::Config;
use crate::constants::KEYRING_SERVICE;

/// OAuth client registration used to authorize against Gmail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
}

impl ClientCredentials {
    /// Flag value, then config file value, then the contents of the named file.
    pub fn resolve(args: &Args, config: &Config) -> Result<Self> {
        let client_id = first_non_empty(&args.client_id, config.client_id.as_deref())
            .map(Ok)
            .unwrap_or_else(|| read_trimmed(&args.client_id_file))
            .context("OAuth client ID not configured. Pass --client-id or create the client ID file")?;

        let client_secret = match first_non_empty(&args.secret, config.client_secret.as_deref()) {
            Some(secret) => Some(secret),
            None => match read_trimmed(&args.secret_file) {
                Ok(secret) => Some(secret),
                Err(e) => {
                    tracing::debug!("No client secret: {:#}", e);
                    None
                }
            },
        };

        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

fn first_non_empty(flag: &str, config: Option<&str>) -> Option<String> {
    [Some(flag), config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Contents of a file holding a single value, trimmed. Empty files are an error.
pub fn read_trimmed(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = content.trim();
    if value.is_empty() {
        anyhow::bail!("{} is empty", path.display());
    }
    Ok(value.to_string())
}

/// Refresh token storage: OS keyring first, owner-only file as fallback.
pub struct TokenCache {
    key: String,
    token_file: PathBuf,
}

impl TokenCache {
    pub fn new(client_id: &str) -> Self {
        let dir = Config::config_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::in_dir(client_id, &dir)
    }

    fn in_dir(client_id: &str, dir: &Path) -> Self {
        // One cache entry per OAuth client
        let safe_id = client_id.replace(['@', '.', '/', '\\', ':'], "_");
        Self {
            key: format!("oauth2:{}", client_id),
            token_file: dir.join(format!(".refresh_token_{}", safe_id)),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.keyring_get().or_else(|| self.file_get())
    }

    pub fn set(&self, refresh_token: &str) -> Result<()> {
        if self.keyring_set(refresh_token) && self.keyring_get().is_some() {
            return Ok(());
        }

        tracing::debug!("Keyring unavailable, caching token in {}", self.token_file.display());
        self.file_set(refresh_token)
    }

    /// Forget a token that no longer works.
    pub fn clear(&self) {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &self.key) {
            let _ = entry.delete_credential();
        }
        let _ = fs::remove_file(&self.token_file);
    }

    fn keyring_get(&self) -> Option<String> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, &self.key).ok()?;
        entry.get_password().ok()
    }

    fn keyring_set(&self, refresh_token: &str) -> bool {
        keyring::Entry::new(KEYRING_SERVICE, &self.key)
            .map(|entry| entry.set_password(refresh_token).is_ok())
            .unwrap_or(false)
    }

    fn file_get(&self) -> Option<String> {
        fs::read_to_string(&self.token_file)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn file_set(&self, refresh_token: &str) -> Result<()> {
        if let Some(parent) = self.token_file.parent() {
            fs::create_dir_all(parent)?;
        }

        // Create file with restricted permissions atomically to avoid TOCTOU
        #[cfg(unix)]
        {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.token_file)
                .with_context(|| format!("Failed to write {}", self.token_file.display()))?;
            file.write_all(refresh_token.as_bytes())?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.token_file, refresh_token)?;
        }

        Ok(())
    }
}
