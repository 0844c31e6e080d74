//! Gmail OAuth2 authentication context
//!
//! Implements the OAuth2 installed-app authorization code flow. A local HTTP
//! listener receives the OAuth callback. Uses synchronous HTTP (ureq).
//!
//! [`GmailAuth`] is an explicit object handed to the client: it owns the
//! credentials, the scopes, the token file location and an in-memory token
//! cache. Its lifecycle is `init` -> `access_token`/`refresh` -> `teardown`.

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::config::GmailCredentials;

/// Scopes requested when none are configured (modify allows read + label changes)
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/gmail.modify"];

/// Token file name inside the config directory
const TOKEN_FILE: &str = "gmail-tokens.json";

/// Tokens expiring within this many seconds are treated as expired
const EXPIRY_BUFFER_SECS: i64 = 300;

/// OAuth2 authentication context for Gmail
pub struct GmailAuth {
    credentials: GmailCredentials,
    scopes: Vec<String>,
    token_path: PathBuf,
    cached: Mutex<Option<StoredToken>>,
}

/// Stored token data
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
}

impl StoredToken {
    fn from_response(token: TokenResponse, now: i64) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token.expires_in.map(|d| now + d as i64),
        }
    }

    /// Whether the access token is usable at `now` (with the expiry buffer)
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at > now + EXPIRY_BUFFER_SECS)
    }
}

/// What the cache holds at a given moment
#[derive(Debug, PartialEq, Eq)]
enum CacheState {
    Fresh(String),
    Expired { refresh_token: Option<String> },
    Missing,
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    #[allow(dead_code)]
    token_type: String,
}

impl GmailAuth {
    /// Gmail API OAuth2 endpoints
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Port range to try for local OAuth callback server
    const PORT_RANGE_START: u16 = 8080;
    const PORT_RANGE_END: u16 = 8090;

    /// Create an auth context that stores tokens at `token_path`
    pub fn new(credentials: GmailCredentials, token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            token_path: token_path.into(),
            cached: Mutex::new(None),
        }
    }

    /// Create an auth context using the default token location
    /// (~/.config/inbox-assistant/gmail-tokens.json)
    pub fn with_default_token_path(credentials: GmailCredentials) -> Result<Self> {
        let token_path = Self::default_token_path()?;
        Ok(Self::new(credentials, token_path))
    }

    /// Replace the requested scopes
    ///
    /// Changing scopes invalidates previously granted tokens; call
    /// [`teardown`](Self::teardown) first so the next `init` re-consents.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Get the default token storage path
    pub fn default_token_path() -> Result<PathBuf> {
        config::config_path(TOKEN_FILE).context("Could not determine config directory")
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Make sure a usable token exists, running the browser flow if needed
    pub fn init(&self) -> Result<()> {
        self.access_token().map(|_| ())
    }

    /// Get a valid access token, refreshing or re-authenticating as needed
    ///
    /// The cache lock is held only to read or store a token, never across the
    /// refresh request or the browser flow. Two callers racing on an expired
    /// token may both refresh; the last one to finish wins the cache.
    pub fn access_token(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();

        let refresh_token = match self.cached_state(now)? {
            CacheState::Fresh(access_token) => return Ok(access_token),
            CacheState::Expired { refresh_token } => refresh_token,
            CacheState::Missing => None,
        };

        if let Some(refresh_token) = refresh_token {
            match self.refresh_access_token(&refresh_token) {
                Ok(response) => return self.store(StoredToken::from_response(response, now)),
                Err(e) => warn!("Token refresh failed, re-authenticating: {:#}", e),
            }
        }

        // Need to authenticate from scratch
        let response = self.authorization_code_auth()?;
        self.store(StoredToken::from_response(response, now))
    }

    /// Force a refresh-token exchange and return the new access token
    pub fn refresh(&self) -> Result<String> {
        let refresh_token = self
            .read_cache(|token| token.and_then(|t| t.refresh_token.clone()))?
            .context("No refresh token available; run the login flow first")?;

        let response = self.refresh_access_token(&refresh_token)?;
        self.store(StoredToken::from_response(
            response,
            chrono::Utc::now().timestamp(),
        ))
    }

    /// Check if a usable token is available without opening a browser
    pub fn is_authenticated(&self) -> bool {
        let Ok(token) = self.load_token() else {
            return false;
        };
        if token.is_fresh(chrono::Utc::now().timestamp()) {
            return true;
        }
        token.refresh_token.is_some() && self.refresh().is_ok()
    }

    /// Forget cached tokens and delete the token file (logout)
    pub fn teardown(&self) -> Result<()> {
        *self.lock_cache()? = None;
        if self.token_path.exists() {
            fs::remove_file(&self.token_path).with_context(|| {
                format!("Failed to remove token file: {}", self.token_path.display())
            })?;
            info!("Removed stored Gmail tokens at {}", self.token_path.display());
        }
        Ok(())
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, Option<StoredToken>>> {
        self.cached
            .lock()
            .map_err(|_| anyhow!("Token cache lock poisoned"))
    }

    /// Run `f` on the cached token, loading it from disk first if needed.
    /// The lock is released when this returns.
    fn read_cache<T>(&self, f: impl FnOnce(Option<&StoredToken>) -> T) -> Result<T> {
        let mut cached = self.lock_cache()?;
        if cached.is_none() {
            *cached = self.load_token().ok();
        }
        Ok(f(cached.as_ref()))
    }

    /// Inspect the cached token as of `now`
    fn cached_state(&self, now: i64) -> Result<CacheState> {
        self.read_cache(|token| match token {
            Some(token) if token.is_fresh(now) => CacheState::Fresh(token.access_token.clone()),
            Some(token) => CacheState::Expired {
                refresh_token: token.refresh_token.clone(),
            },
            None => CacheState::Missing,
        })
    }

    /// Persist a new token and put it in the cache
    fn store(&self, token: StoredToken) -> Result<String> {
        self.save_token(&token)?;
        let access_token = token.access_token.clone();
        *self.lock_cache()? = Some(token);
        Ok(access_token)
    }

    /// Perform authorization code flow authentication
    fn authorization_code_auth(&self) -> Result<TokenResponse> {
        // Step 1: Start local server to receive callback
        let (listener, port) = self.start_local_server()?;
        let redirect_uri = format!("http://localhost:{}", port);

        // Step 2: Build authorization URL
        let auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            Self::AUTH_URL,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&redirect_uri),
            urlencoding::encode(&self.scopes.join(" ")),
        );

        eprintln!("\n=== Gmail Authentication Required ===");
        eprintln!("Opening browser for authentication...");
        eprintln!("If the browser doesn't open, visit: {}", auth_url);

        if let Err(e) = open::that(&auth_url) {
            warn!("Failed to open browser: {}. Please open the URL manually.", e);
        }

        // Step 3: Wait for callback with authorization code
        info!("Waiting for OAuth callback on port {}", port);
        let code = self.wait_for_callback(listener)?;

        // Step 4: Exchange code for tokens
        debug!("Exchanging authorization code for tokens");
        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("code", code.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .context("Failed to exchange authorization code")?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")?;

        info!("Gmail authentication successful");
        Ok(token)
    }

    /// Start a local TCP server on an available port
    fn start_local_server(&self) -> Result<(TcpListener, u16)> {
        for port in Self::PORT_RANGE_START..=Self::PORT_RANGE_END {
            if let Ok(listener) = TcpListener::bind(format!("127.0.0.1:{}", port)) {
                return Ok((listener, port));
            }
        }
        anyhow::bail!(
            "Could not bind to any port in range {}-{}",
            Self::PORT_RANGE_START,
            Self::PORT_RANGE_END
        )
    }

    /// Wait for OAuth callback and extract authorization code
    fn wait_for_callback(&self, listener: TcpListener) -> Result<String> {
        let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .context("Failed to read request")?;

        let code = callback_param(&request_line, "code");
        let error = callback_param(&request_line, "error");

        let (status, body) = if code.is_some() {
            ("200 OK", "Authentication successful! You can close this window.")
        } else {
            ("400 Bad Request", "Authentication failed. Please try again.")
        };

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
            status, body
        );
        stream.write_all(response.as_bytes()).ok();

        if let Some(err) = error {
            anyhow::bail!("OAuth error: {}", err);
        }

        code.context("No authorization code received")
    }

    /// Refresh an access token using a refresh token
    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        debug!("Refreshing Gmail access token");
        let response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .context("Failed to refresh access token")?;

        let mut token: TokenResponse = response
            .into_body()
            .read_json()
            .context("Failed to parse refresh token response")?;

        // Preserve the refresh token if not returned
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }

        Ok(token)
    }

    /// Load stored token from disk
    fn load_token(&self) -> Result<StoredToken> {
        config::load_json_file(&self.token_path)
    }

    /// Save token to disk
    fn save_token(&self, token: &StoredToken) -> Result<()> {
        config::save_json_file(&self.token_path, token)
    }
}

/// Extract a query parameter from the callback's HTTP request line
///
/// Format: `GET /?code=AUTH_CODE&scope=... HTTP/1.1`
fn callback_param(request_line: &str, name: &str) -> Option<String> {
    let path = request_line.split_whitespace().nth(1)?;
    let query = path.split_once('?')?.1;
    query.split('&').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        (key == name).then(|| {
            urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
    })
}
