//! Explicit session context
//!
//! The session is passed to every client call instead of living in a
//! process-wide store. Persistence to disk is optional and owned by the caller.

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Authenticated user as returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Bearer token and user for outgoing requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// `Authorization` header value, if a token is present
    pub fn bearer(&self) -> Option<String> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {t}"))
    }

    /// Forget token and user
    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// Default location of the persisted session
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bundlelens").join("session.json"))
    }

    /// Load a persisted session; a missing file is an anonymous session
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::anonymous());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "session saved");
        Ok(())
    }

    /// Clear the session and remove its file
    pub fn discard(&mut self, path: &Path) -> Result<()> {
        self.clear();
        if path.exists() {
            fs::remove_file(path)?;
            debug!(path = %path.display(), "session removed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_requires_token() {
        assert_eq!(SessionContext::anonymous().bearer(), None);
        assert_eq!(SessionContext::with_token("").bearer(), None);
        assert_eq!(
            SessionContext::with_token("abc").bearer().as_deref(),
            Some("Bearer abc")
        );
    }

    #[test]
    fn save_load_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut session = SessionContext {
            token: Some("tok".into()),
            user: Some(UserProfile {
                id: 1,
                email: "broker@example.com".into(),
                name: "Broker".into(),
                role: "broker".into(),
                is_active: true,
            }),
        };
        session.save(&path).unwrap();
        assert_eq!(SessionContext::load(&path).unwrap(), session);

        session.discard(&path).unwrap();
        assert!(!session.is_authenticated());
        assert!(!path.exists());
        assert_eq!(SessionContext::load(&path).unwrap(), SessionContext::anonymous());
    }
}
