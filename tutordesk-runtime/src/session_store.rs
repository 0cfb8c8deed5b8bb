use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tutordesk_core::types::UserProfile;

use crate::secrets::{SecretKey, delete_secret, get_secret, set_secret};

/// A live signed-in session. The token only reaches disk via the OS keyring;
/// the JSON side holds the profile and the remember flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
    pub remember: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProfile {
    pub user: UserProfile,
    pub remember: bool,
    pub saved_at_unix_ms: i64,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_profile(&self) -> anyhow::Result<Option<StoredProfile>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read(&self.path)
            .with_context(|| format!("read session profile: {}", self.path.display()))?;
        let profile: StoredProfile =
            serde_json::from_slice(&raw).context("decode session profile JSON")?;
        Ok(Some(profile))
    }

    pub fn save_profile(&self, profile: &StoredProfile) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            crate::files::ensure_dir(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(profile)?)
            .with_context(|| format!("write session temp: {}", tmp.display()))?;
        crate::files::replace_file(&tmp, &self.path)
            .with_context(|| format!("replace session profile: {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear_profile(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("remove session profile: {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Restore a persisted session on startup.
    ///
    /// A corrupt profile or a missing keyring token clears both sides and
    /// reports signed-out rather than failing startup.
    pub fn hydrate(&self) -> anyhow::Result<Option<AuthSession>> {
        let profile = match self.load_profile() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("discarding unreadable session profile: {e:#}");
                let _ = self.clear();
                return Ok(None);
            }
        };

        let Some(profile) = profile else {
            return Ok(None);
        };

        match get_secret(SecretKey::SessionToken)? {
            Some(token) => Ok(Some(AuthSession {
                token,
                user: profile.user,
                remember: profile.remember,
            })),
            None => {
                // Token revoked or keyring wiped; the profile alone is useless.
                self.clear_profile()?;
                Ok(None)
            }
        }
    }

    /// Persist a session for the next launch. Sessions without the remember
    /// flag stay purely in memory.
    pub fn persist(&self, session: &AuthSession) -> anyhow::Result<()> {
        if !session.remember {
            return Ok(());
        }

        set_secret(SecretKey::SessionToken, &session.token)?;

        let saved_at_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;

        self.save_profile(&StoredProfile {
            user: session.user.clone(),
            remember: session.remember,
            saved_at_unix_ms,
        })
    }

    /// Logout teardown: both the keyring token and the profile file go.
    pub fn clear(&self) -> anyhow::Result<()> {
        delete_secret(SecretKey::SessionToken)?;
        self.clear_profile()
    }
}
