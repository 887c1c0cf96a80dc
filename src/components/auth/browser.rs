use super::pkce::PkceChallenge;
use super::{post_token_request, AccessToken, AuthSettings, CredentialFlow, TokenReply};
use crate::error::{auth_error, SyncResult};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

const CALLBACK_PAGE: &str = "<html><body><h3>Sign-in complete.</h3>\
    <p>You can close this window and return to the console.</p></body></html>";

const LOOPBACK_HOST: &str = "127.0.0.1";

/// Authorization-code flow with PKCE and a loopback redirect
#[derive(Debug, Default, Clone, Copy)]
pub struct InteractiveBrowserFlow;

#[async_trait]
impl CredentialFlow for InteractiveBrowserFlow {
    fn name(&self) -> &'static str {
        "interactive browser"
    }

    async fn acquire(&self, client: &Client, settings: &AuthSettings) -> SyncResult<AccessToken> {
        // Start local server to receive the callback
        let (server, redirect_uri) = bind_listener(settings.redirect_port)?;

        let pkce = PkceChallenge::generate();
        let state = uuid::Uuid::new_v4().to_string();
        let auth_url = authorize_url(settings, &redirect_uri, &pkce, &state)?;

        // Open browser for authorization
        info!("Opening browser for sign-in...");
        if let Err(e) = webbrowser::open(auth_url.as_str()) {
            warn!("Could not open a browser ({}), open this URL manually", e);
            println!("{}", auth_url);
        }

        info!("Waiting for authorization callback on {}", redirect_uri);
        let code = tokio::task::spawn_blocking(move || wait_for_code(&server, &state))
            .await
            .map_err(|e| auth_error(&format!("Redirect listener task failed: {}", e)))??;

        // Exchange code for tokens
        let form = [
            ("client_id", settings.client_id.clone()),
            ("grant_type", "authorization_code".to_string()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", pkce.code_verifier),
            ("scope", settings.scope_param()),
        ];
        match post_token_request(client, settings, &form).await? {
            TokenReply::Granted(token) => Ok(AccessToken::from_response(token)),
            TokenReply::Rejected(err) => Err(err.into_error("Code exchange failed")),
        }
    }
}

/// Loopback listener plus the redirect URI that points at it.
///
/// The URI carries the bound IP literal, never `localhost`.
pub fn bind_listener(port: u16) -> SyncResult<(tiny_http::Server, String)> {
    let server = tiny_http::Server::http((LOOPBACK_HOST, port))
        .map_err(|e| auth_error(&format!("Failed to start redirect listener: {}", e)))?;
    let addr = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| auth_error("Redirect listener has no TCP address"))?;
    let redirect_uri = format!("http://{}:{}", addr.ip(), addr.port());
    Ok((server, redirect_uri))
}

/// Build the authorize URL for the auth-code + PKCE request
pub fn authorize_url(
    settings: &AuthSettings,
    redirect_uri: &str,
    pkce: &PkceChallenge,
    state: &str,
) -> SyncResult<Url> {
    let url = Url::parse_with_params(
        &settings.endpoint("authorize"),
        &[
            ("client_id", settings.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("response_mode", "query"),
            ("scope", settings.scope_param().as_str()),
            ("state", state),
            ("code_challenge", pkce.code_challenge.as_str()),
            ("code_challenge_method", "S256"),
        ],
    )?;
    Ok(url)
}

fn wait_for_code(server: &tiny_http::Server, expected_state: &str) -> SyncResult<String> {
    loop {
        let request = server.recv()?;
        let outcome = parse_callback(request.url(), expected_state);

        // Browsers also ask for /favicon.ico and friends
        let Some(result) = outcome else {
            let _ = request.respond(tiny_http::Response::empty(404));
            continue;
        };

        let body = match &result {
            Ok(_) => CALLBACK_PAGE.to_string(),
            Err(e) => format!("<html><body><h3>Sign-in failed</h3><p>{}</p></body></html>", e),
        };
        let mut response = tiny_http::Response::from_string(body);
        if let Ok(header) =
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
        {
            response = response.with_header(header);
        }
        if let Err(e) = request.respond(response) {
            warn!("Failed to answer the browser: {}", e);
        }
        return result;
    }
}

/// Pull the authorization code out of a redirect request path.
///
/// Returns `None` for requests that carry neither `code` nor `error`.
pub fn parse_callback(request_url: &str, expected_state: &str) -> Option<SyncResult<String>> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(request_url))
        .ok()?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        let detail = error_description.unwrap_or_default();
        return Some(Err(auth_error(&format!(
            "Authorization was refused: {} {}",
            error, detail
        ))));
    }

    let code = code?;
    if state.as_deref() != Some(expected_state) {
        return Some(Err(auth_error("State mismatch in authorization callback")));
    }
    Some(Ok(code))
}
