//! Session guard: the signed-in identity and its bearer credential.
//!
//! The session is produced elsewhere (the service's login endpoint) and is
//! only read here, once. Nothing in the core talks to the feedback service
//! without a [`Session`], so an absent session means no remote calls at all.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{self, ConfigError};
use crate::feedback::UserId;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid session data in {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },
    #[error("ASKTRACKER_TOKEN and ASKTRACKER_USER must be set together")]
    IncompleteEnv,
}

/// Who is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

/// Bearer token issued by the feedback service. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Identity and credential, handed to the engine at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub credential: Credential,
}

impl Session {
    pub fn new(identity: Identity, credential: Credential) -> Self {
        Self {
            identity,
            credential,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.identity.id
    }
}

/// On-disk form of a session; identical to the service's login response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: Identity,
    pub access_token: Credential,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl SessionRecord {
    pub fn load(path: &Path) -> Result<Option<Self>, SessionError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let record = serde_json::from_str(&content).map_err(|source| SessionError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        Ok(Some(record))
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| SessionError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        fs::write(path, content).map_err(io_err)
    }

    /// Delete the session file. Returns whether there was one.
    pub fn remove(path: &Path) -> Result<bool, SessionError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn into_session(self) -> Session {
        Session::new(self.user, self.access_token)
    }
}

/// Default location of the session file.
pub fn session_path() -> Result<PathBuf, SessionError> {
    Ok(config::config_dir()?.join("session.json"))
}

/// Reads the externally supplied session once and answers who is signed in.
#[derive(Debug, Clone, Default)]
pub struct SessionGuard {
    current: Option<Session>,
}

impl SessionGuard {
    /// Read from the environment, falling back to the default session file.
    pub fn load() -> Result<Self, SessionError> {
        Self::from_sources(|key| std::env::var(key).ok(), &session_path()?)
    }

    /// `ASKTRACKER_TOKEN` plus `ASKTRACKER_USER` (identity JSON) win over
    /// the session file. Setting only one of the two is an error.
    pub fn from_sources(
        lookup: impl Fn(&str) -> Option<String>,
        path: &Path,
    ) -> Result<Self, SessionError> {
        let token = lookup("ASKTRACKER_TOKEN").filter(|v| !v.trim().is_empty());
        let user = lookup("ASKTRACKER_USER").filter(|v| !v.trim().is_empty());

        let current = match (token, user) {
            (Some(token), Some(user)) => {
                let identity: Identity =
                    serde_json::from_str(&user).map_err(|source| SessionError::Parse {
                        origin: "ASKTRACKER_USER".to_string(),
                        source,
                    })?;
                debug!(user_id = %identity.id, "session taken from environment");
                Some(Session::new(identity, Credential::new(token)))
            }
            (None, None) => SessionRecord::load(path)?.map(SessionRecord::into_session),
            _ => return Err(SessionError::IncompleteEnv),
        };

        match &current {
            Some(session) => info!(
                user_id = %session.identity.id,
                name = %session.identity.display_name,
                "signed in"
            ),
            None => info!("no session found"),
        }

        Ok(Self { current })
    }

    pub fn from_session(session: Option<Session>) -> Self {
        Self { current: session }
    }

    pub fn current_identity(&self) -> Option<&Identity> {
        self.current.as_ref().map(|s| &s.identity)
    }

    pub fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }
}
