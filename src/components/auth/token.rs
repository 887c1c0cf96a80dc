use super::{post_token_request, AccessToken, AuthSettings, CredentialFlow, TokenReply};
use crate::error::{auth_error, SyncResult};
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Refresh this many seconds before the token actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Process-wide credential handle shared by every Graph call
#[derive(Clone)]
pub struct TokenManager {
    settings: Arc<AuthSettings>,
    flow: Arc<dyn CredentialFlow>,
    client: Client,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl TokenManager {
    pub fn new(settings: AuthSettings, flow: Box<dyn CredentialFlow>, client: Client) -> Self {
        Self {
            settings: Arc::new(settings),
            flow: Arc::from(flow),
            client,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Run the credential flow up front so sign-in problems surface first
    pub async fn sign_in(&self) -> SyncResult<()> {
        info!("Signing in with the {} flow", self.flow.name());
        let token = self.flow.acquire(&self.client, &self.settings).await?;
        *self.token.write().await = Some(token);
        Ok(())
    }

    /// Get a usable access token, refreshing or signing in as needed
    pub async fn access_token(&self) -> SyncResult<String> {
        let cached = self.token.read().await.clone();

        let token = match cached {
            Some(token) if token.is_fresh(Utc::now().timestamp(), EXPIRY_MARGIN_SECS) => token,
            Some(expired) => match expired.refresh_token.as_deref() {
                Some(refresh_token) => match self.refresh_token(refresh_token).await {
                    Ok(token) => token,
                    Err(e) => {
                        warn!("Token refresh failed, signing in again: {}", e);
                        self.flow.acquire(&self.client, &self.settings).await?
                    }
                },
                None => self.flow.acquire(&self.client, &self.settings).await?,
            },
            None => self.flow.acquire(&self.client, &self.settings).await?,
        };

        let access_token = token.access_token.clone();
        *self.token.write().await = Some(token);
        Ok(access_token)
    }

    /// Refresh an expired token
    async fn refresh_token(&self, refresh_token: &str) -> SyncResult<AccessToken> {
        debug!("Refreshing access token");
        let form = [
            ("client_id", self.settings.client_id.clone()),
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
            ("scope", self.settings.scope_param()),
        ];

        match post_token_request(&self.client, &self.settings, &form).await? {
            TokenReply::Granted(response) => {
                let mut token = AccessToken::from_response(response);
                // Keep the old refresh token if the authority did not rotate it
                if token.refresh_token.is_none() {
                    token.refresh_token = Some(refresh_token.to_string());
                }
                Ok(token)
            }
            TokenReply::Rejected(err) => Err(err.into_error("Token refresh failed")),
        }
    }

    /// Manually seed a token (tests, or callers that signed in elsewhere)
    pub async fn set_token(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
    }

    /// True once a token has been obtained
    pub async fn is_signed_in(&self) -> bool {
        self.token.read().await.is_some()
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("flow", &self.flow.name())
            .field("tenant_id", &self.settings.tenant_id)
            .finish()
    }
}

/// Reject an empty access token early instead of sending `Bearer `
pub fn require_token(token: String) -> SyncResult<String> {
    if token.trim().is_empty() {
        return Err(auth_error("No access token available"));
    }
    Ok(token)
}
