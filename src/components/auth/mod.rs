//! Delegated sign-in against the Microsoft identity platform.
//!
//! A [`CredentialFlow`] is picked once from [`AuthFlow`] and handed to the
//! [`TokenManager`], which every Graph call goes through.

mod browser;
mod device_code;
pub mod pkce;
pub mod token;

pub use browser::InteractiveBrowserFlow;
pub use device_code::DeviceCodeFlow;
pub use token::TokenManager;

use crate::error::{auth_error, config_error, Error, SyncResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Delegated permissions the sync needs
pub const SCOPES: &[&str] = &[
    "User.Read",
    "Calendars.ReadWrite.Shared",
    "Group.ReadWrite.All",
    "MailboxSettings.Read",
    "offline_access",
];

/// Which credential flow to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    /// Browser sign-in with a local redirect listener
    Interactive,
    /// Device code printed to the console, completed on another device
    DeviceCode,
}

impl AuthFlow {
    /// Headless (container) runs cannot open a browser
    pub fn for_environment(in_container: bool) -> Self {
        if in_container {
            AuthFlow::DeviceCode
        } else {
            AuthFlow::Interactive
        }
    }

    /// Build the strategy for this flow
    pub fn credential_flow(self) -> Box<dyn CredentialFlow> {
        match self {
            AuthFlow::Interactive => Box::new(InteractiveBrowserFlow),
            AuthFlow::DeviceCode => Box::new(DeviceCodeFlow),
        }
    }
}

impl FromStr for AuthFlow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interactive" | "browser" => Ok(AuthFlow::Interactive),
            "device-code" | "device_code" | "devicecode" => Ok(AuthFlow::DeviceCode),
            other => Err(config_error(&format!(
                "Unknown AUTH_FLOW '{}', expected 'interactive' or 'device-code'",
                other
            ))),
        }
    }
}

impl fmt::Display for AuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFlow::Interactive => write!(f, "interactive"),
            AuthFlow::DeviceCode => write!(f, "device-code"),
        }
    }
}

/// Everything a flow needs to talk to the authority
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub client_id: String,
    pub tenant_id: String,
    pub authority_host: String,
    pub scopes: Vec<String>,
    pub redirect_port: u16,
}

impl AuthSettings {
    pub fn new(client_id: &str, tenant_id: &str, authority_host: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            tenant_id: tenant_id.to_string(),
            authority_host: authority_host.trim_end_matches('/').to_string(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            redirect_port: 0,
        }
    }

    /// `{authority}/{tenant}/oauth2/v2.0/{name}`
    pub fn endpoint(&self, name: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/{}",
            self.authority_host, self.tenant_id, name
        )
    }

    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

/// A signed-in credential with its absolute expiry
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
}

impl AccessToken {
    pub fn from_response(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now().timestamp() + response.expires_in,
        }
    }

    /// True if the token is still usable for at least `margin_secs`
    pub fn is_fresh(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at - margin_secs > now
    }
}

/// Successful token endpoint reply
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// OAuth error reply (`{"error": "...", "error_description": "..."}`)
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl OAuthError {
    pub fn into_error(self, context: &str) -> Error {
        match self.error_description {
            Some(description) => auth_error(&format!(
                "{}: {} ({})",
                context,
                self.error,
                first_line(&description)
            )),
            None => auth_error(&format!("{}: {}", context, self.error)),
        }
    }
}

/// Outcome of a token endpoint request
#[derive(Debug)]
pub enum TokenReply {
    Granted(TokenResponse),
    Rejected(OAuthError),
}

/// POST a form to the token endpoint and split success from OAuth errors
pub async fn post_token_request(
    client: &Client,
    settings: &AuthSettings,
    form: &[(&str, String)],
) -> SyncResult<TokenReply> {
    let url = settings.endpoint("token");
    debug!("POST {}", url);

    let response = client
        .post(&url)
        .form(form)
        .send()
        .await
        .map_err(|e| auth_error(&format!("Token request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| auth_error(&format!("Failed to read token response: {}", e)))?;

    if status.is_success() {
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;
        return Ok(TokenReply::Granted(token));
    }

    match serde_json::from_str::<OAuthError>(&body) {
        Ok(err) => Ok(TokenReply::Rejected(err)),
        Err(_) => Err(auth_error(&format!(
            "Token request failed: HTTP {} - {}",
            status, body
        ))),
    }
}

/// A way of obtaining the first token interactively
#[async_trait]
pub trait CredentialFlow: Send + Sync {
    /// Name used in log output
    fn name(&self) -> &'static str;

    /// Run the flow to completion
    async fn acquire(&self, client: &Client, settings: &AuthSettings) -> SyncResult<AccessToken>;
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text).trim()
}
