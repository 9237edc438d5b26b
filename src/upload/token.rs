//! Channel token records and refresh.
//!
//! One JSON record per channel, written atomically. A stored record is
//! only overwritten after a confirmed successful refresh - a failed
//! refresh never corrupts persisted state.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::UploadSettings;

/// Seconds of leeway before the recorded expiry at which a token is
/// treated as expired, so a refresh happens before a request can 401.
const EXPIRY_LEEWAY_SECS: i64 = 120;

/// Errors from token storage and refresh.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("No token record for channel '{0}'")]
    NotFound(String),

    #[error("Failed to read token record {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse token record: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Token refresh request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The refresh endpoint rejected the grant. The stored record is
    /// left untouched.
    #[error("Token refresh rejected with status {status}: {body}")]
    RefreshFailed { status: u16, body: String },
}

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Persisted credentials for one target channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelToken {
    pub channel_id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp after which the access token is invalid.
    pub expires_at: i64,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl ChannelToken {
    /// Whether the access token should be refreshed before use.
    pub fn is_expired(&self, now_unix: i64) -> bool {
        now_unix + EXPIRY_LEEWAY_SECS >= self.expires_at
    }
}

/// File-backed store of channel token records.
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    /// Create a store over the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, channel_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", channel_id))
    }

    /// Load the record for a channel.
    pub fn load(&self, channel_id: &str) -> TokenResult<ChannelToken> {
        let path = self.record_path(channel_id);
        if !path.exists() {
            return Err(TokenError::NotFound(channel_id.to_string()));
        }

        let content = fs::read_to_string(&path).map_err(|e| TokenError::Io {
            path: path.clone(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist a record atomically (temp file + rename).
    pub fn save(&self, token: &ChannelToken) -> TokenResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| TokenError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let path = self.record_path(&token.channel_id);
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(token)?;

        {
            let mut file = fs::File::create(&temp_path).map_err(|e| TokenError::Io {
                path: temp_path.clone(),
                source: e,
            })?;
            file.write_all(json.as_bytes()).map_err(|e| TokenError::Io {
                path: temp_path.clone(),
                source: e,
            })?;
        }

        fs::rename(&temp_path, &path).map_err(|e| TokenError::Io { path, source: e })?;
        Ok(())
    }
}

/// Loads, refreshes, and persists channel tokens.
pub struct TokenManager<'a> {
    settings: &'a UploadSettings,
    store: TokenStore,
    http: reqwest::blocking::Client,
}

impl<'a> TokenManager<'a> {
    pub fn new(settings: &'a UploadSettings, token_dir: &Path) -> TokenResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            settings,
            store: TokenStore::new(token_dir),
            http,
        })
    }

    /// Get a valid access token for the channel, refreshing proactively
    /// when the stored expiry has passed.
    pub fn ensure_fresh(&self, channel_id: &str) -> TokenResult<ChannelToken> {
        let token = self.store.load(channel_id)?;

        if !token.is_expired(Utc::now().timestamp()) {
            return Ok(token);
        }

        tracing::info!(channel_id, "access token expired, refreshing");
        let refreshed = self.refresh(&token)?;
        // Persist only after the endpoint confirmed the new token.
        self.store.save(&refreshed)?;
        Ok(refreshed)
    }

    /// Exchange the refresh token for a new access token.
    fn refresh(&self, token: &ChannelToken) -> TokenResult<ChannelToken> {
        let params = [
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("refresh_token", token.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.settings.token_url)
            .form(&params)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TokenError::RefreshFailed {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json()?;
        Ok(apply_refresh_response(token, &json))
    }
}

/// Merge a refresh response into the existing record.
///
/// The endpoint may omit the refresh token and scope on rotation; absent
/// fields keep their stored values.
fn apply_refresh_response(current: &ChannelToken, response: &Value) -> ChannelToken {
    let access_token = response
        .get("access_token")
        .and_then(|v| v.as_str())
        .unwrap_or(&current.access_token)
        .to_string();

    let refresh_token = response
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .unwrap_or(&current.refresh_token)
        .to_string();

    let expires_in = response
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .unwrap_or(3600);

    let scope = response
        .get("scope")
        .and_then(|v| v.as_str())
        .unwrap_or(&current.scope)
        .to_string();

    let token_type = response
        .get("token_type")
        .and_then(|v| v.as_str())
        .unwrap_or(&current.token_type)
        .to_string();

    ChannelToken {
        channel_id: current.channel_id.clone(),
        access_token,
        refresh_token,
        expires_at: Utc::now().timestamp() + expires_in,
        scope,
        token_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn token() -> ChannelToken {
        ChannelToken {
            channel_id: "2".to_string(),
            access_token: "old-access".to_string(),
            refresh_token: "refresh-abc".to_string(),
            expires_at: 1_700_000_000,
            scope: "upload".to_string(),
            token_type: "Bearer".to_string(),
        }
    }

    #[test]
    fn store_round_trips_record() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path());

        store.save(&token()).unwrap();
        let loaded = store.load("2").unwrap();
        assert_eq!(loaded, token());
    }

    #[test]
    fn unknown_channel_is_not_found() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path());
        assert!(matches!(store.load("99"), Err(TokenError::NotFound(_))));
    }

    #[test]
    fn expiry_includes_leeway() {
        let t = token();
        assert!(t.is_expired(t.expires_at));
        assert!(t.is_expired(t.expires_at - 60));
        assert!(!t.is_expired(t.expires_at - 600));
    }

    #[test]
    fn refresh_response_merges_over_current() {
        let current = token();
        let response = json!({
            "access_token": "new-access",
            "expires_in": 3600,
            "token_type": "Bearer"
        });

        let updated = apply_refresh_response(&current, &response);
        assert_eq!(updated.access_token, "new-access");
        // Omitted fields keep stored values.
        assert_eq!(updated.refresh_token, "refresh-abc");
        assert_eq!(updated.scope, "upload");
        assert!(updated.expires_at > Utc::now().timestamp());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path());
        store.save(&token()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|x| x == "tmp").unwrap_or(false))
            .collect();
        assert!(leftovers.is_empty());
    }
}
