use super::{post_token_request, AccessToken, AuthSettings, CredentialFlow, OAuthError, TokenReply};
use crate::error::{auth_error, SyncResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Extra wait requested by `slow_down`, per RFC 8628
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// Device authorization grant: the user signs in on another device
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceCodeFlow;

/// Reply of the `/devicecode` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_interval() -> u64 {
    5
}

impl DeviceCodeResponse {
    /// Text shown to the user
    pub fn prompt(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => format!(
                "To sign in, open {} and enter the code {}",
                self.verification_uri, self.user_code
            ),
        }
    }
}

/// What to do after a rejected poll
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome {
    KeepWaiting,
    SlowDown,
    Abort,
}

pub fn classify_poll_error(error: &OAuthError) -> PollOutcome {
    match error.error.as_str() {
        "authorization_pending" => PollOutcome::KeepWaiting,
        "slow_down" => PollOutcome::SlowDown,
        _ => PollOutcome::Abort,
    }
}

#[async_trait]
impl CredentialFlow for DeviceCodeFlow {
    fn name(&self) -> &'static str {
        "device code"
    }

    async fn acquire(&self, client: &Client, settings: &AuthSettings) -> SyncResult<AccessToken> {
        let device = request_device_code(client, settings).await?;

        // The user has to act on this, so it goes to stdout and not the log
        println!("{}", device.prompt());

        let deadline = Instant::now() + Duration::from_secs(device.expires_in);
        let mut interval = Duration::from_secs(device.interval);

        let form = [
            ("client_id", settings.client_id.clone()),
            ("grant_type", DEVICE_CODE_GRANT.to_string()),
            ("device_code", device.device_code.clone()),
        ];

        loop {
            if Instant::now() + interval > deadline {
                return Err(auth_error("Device code expired before sign-in completed"));
            }
            tokio::time::sleep(interval).await;

            match post_token_request(client, settings, &form).await? {
                TokenReply::Granted(token) => {
                    info!("Device code sign-in completed");
                    return Ok(AccessToken::from_response(token));
                }
                TokenReply::Rejected(err) => match classify_poll_error(&err) {
                    PollOutcome::KeepWaiting => debug!("Waiting for device code sign-in"),
                    PollOutcome::SlowDown => {
                        interval += SLOW_DOWN_STEP;
                        debug!("Authority asked to slow down, polling every {:?}", interval);
                    }
                    PollOutcome::Abort => return Err(err.into_error("Device code sign-in failed")),
                },
            }
        }
    }
}

async fn request_device_code(
    client: &Client,
    settings: &AuthSettings,
) -> SyncResult<DeviceCodeResponse> {
    let response = client
        .post(settings.endpoint("devicecode"))
        .form(&[
            ("client_id", settings.client_id.clone()),
            ("scope", settings.scope_param()),
        ])
        .send()
        .await
        .map_err(|e| auth_error(&format!("Device code request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        return match serde_json::from_str::<OAuthError>(&body) {
            Ok(err) => Err(err.into_error("Device code request rejected")),
            Err(_) => Err(auth_error(&format!(
                "Device code request failed: HTTP {} - {}",
                status, body
            ))),
        };
    }

    response
        .json()
        .await
        .map_err(|e| auth_error(&format!("Failed to parse device code response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth_error(code: &str) -> OAuthError {
        OAuthError {
            error: code.to_string(),
            error_description: None,
        }
    }

    #[test]
    fn test_poll_classification() {
        assert_eq!(
            classify_poll_error(&oauth_error("authorization_pending")),
            PollOutcome::KeepWaiting
        );
        assert_eq!(classify_poll_error(&oauth_error("slow_down")), PollOutcome::SlowDown);
        assert_eq!(
            classify_poll_error(&oauth_error("authorization_declined")),
            PollOutcome::Abort
        );
        assert_eq!(classify_poll_error(&oauth_error("expired_token")), PollOutcome::Abort);
        assert_eq!(
            classify_poll_error(&oauth_error("bad_verification_code")),
            PollOutcome::Abort
        );
    }

    #[test]
    fn test_prompt_prefers_server_message() {
        let mut device: DeviceCodeResponse = serde_json::from_str(
            r#"{"device_code":"d","user_code":"ABC123","verification_uri":"https://microsoft.com/devicelogin","expires_in":900}"#,
        )
        .unwrap();
        assert_eq!(device.interval, 5);
        assert!(device.prompt().contains("ABC123"));

        device.message = Some("Use code ABC123".to_string());
        assert_eq!(device.prompt(), "Use code ABC123");
    }
}
