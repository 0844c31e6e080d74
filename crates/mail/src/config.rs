//! OAuth client credentials for the Gmail provider
//!
//! Credentials are looked up in this order:
//! 1. Compile-time embedded credentials (for release builds)
//! 2. JSON file in the config directory (Google Cloud Console format)
//! 3. Runtime environment variables

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Credentials filename in the config directory
const CREDENTIALS_FILE: &str = "google-credentials.json";

const CLIENT_ID_VAR: &str = "GMAIL_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "GMAIL_CLIENT_SECRET";

/// OAuth credentials for Gmail API access
#[derive(Debug, Clone)]
pub struct GmailCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Where a set of credentials came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    CompileTime,
    File(PathBuf),
    Environment,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompileTime => write!(f, "embedded build credentials"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Environment => write!(f, "{}/{}", CLIENT_ID_VAR, CLIENT_SECRET_VAR),
        }
    }
}

/// Google Cloud Console credential file (installed or web app)
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<ClientSection>,
    web: Option<ClientSection>,
}

#[derive(Deserialize)]
struct ClientSection {
    client_id: String,
    client_secret: String,
}

impl GmailCredentials {
    /// Load credentials from the first source that has them
    pub fn load() -> Result<Self> {
        Self::load_with_source().map(|(creds, _)| creds)
    }

    /// Like [`load`](Self::load), also reporting which source answered
    pub fn load_with_source() -> Result<(Self, CredentialSource)> {
        Self::lookup(
            Self::from_compile_time(),
            Self::default_credentials_path().as_deref(),
            |name| std::env::var(name).ok(),
        )
    }

    /// Try each source in order. A credentials file that exists but cannot be
    /// read is an error of its own rather than a silent fall-through.
    fn lookup(
        embedded: Option<Self>,
        file: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, CredentialSource)> {
        if let Some(creds) = embedded {
            return Ok((creds, CredentialSource::CompileTime));
        }

        let file_status = match file {
            Some(path) if path.exists() => {
                let creds = Self::from_file(path).with_context(|| {
                    format!("inbox-assistant credentials file {} is unusable", path.display())
                })?;
                return Ok((creds, CredentialSource::File(path.to_path_buf())));
            }
            Some(path) => format!("no file at {}", path.display()),
            None => "no config directory".to_string(),
        };

        match Self::from_env_vars(env) {
            Ok(creds) => Ok((creds, CredentialSource::Environment)),
            Err(env_status) => Err(anyhow!(
                "No Gmail credentials for inbox-assistant: build has none embedded; {}; {}",
                file_status,
                env_status
            )),
        }
    }

    /// Credentials embedded at build time
    /// (`GOOGLE_CLIENT_ID=xxx GOOGLE_CLIENT_SECRET=yyy cargo build --release`)
    pub fn from_compile_time() -> Option<Self> {
        let client_id = option_env!("GOOGLE_CLIENT_ID")?;
        let client_secret = option_env!("GOOGLE_CLIENT_SECRET")?;
        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }

        Some(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    /// Load credentials from a downloaded `credentials.json`
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: GoogleCredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(file)
    }

    /// Parse credentials from JSON in Google Cloud Console format
    pub fn from_json(json: &str) -> Result<Self> {
        let file: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(file)
    }

    fn from_credential_file(file: GoogleCredentialFile) -> Result<Self> {
        let section = file
            .installed
            .or(file.web)
            .context("Credentials file has neither an 'installed' nor a 'web' section")?;

        Ok(Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
        })
    }

    /// Load credentials from `GMAIL_CLIENT_ID` and `GMAIL_CLIENT_SECRET`
    pub fn from_env() -> Result<Self> {
        Self::from_env_vars(|name| std::env::var(name).ok())
    }

    fn from_env_vars(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let missing: Vec<&str> = [CLIENT_ID_VAR, CLIENT_SECRET_VAR]
            .into_iter()
            .filter(|name| env(name).is_none_or(|v| v.is_empty()))
            .collect();
        if !missing.is_empty() {
            anyhow::bail!("{} not set", missing.join(" and "));
        }

        Ok(Self {
            client_id: env(CLIENT_ID_VAR).unwrap_or_default(),
            client_secret: env(CLIENT_SECRET_VAR).unwrap_or_default(),
        })
    }

    /// Default credentials file (~/.config/inbox-assistant/google-credentials.json)
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }
}
