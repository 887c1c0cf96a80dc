use crate::components::auth::AuthFlow;
use crate::error::{config_error, env_error, SyncResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;

/// Default group whose shared calendar receives the vacation entries
pub const DEFAULT_GROUP_NAME: &str = "4PS Deutschland";

/// Public client registered for the sync tool
pub const DEFAULT_CLIENT_ID: &str = "bc6a5c42-f082-4b55-9a87-e765f30a1ba4";

/// Tenant the client is registered in
pub const DEFAULT_TENANT_ID: &str = "92f4dd01-f0ea-4b5f-97f2-505c2945189c";

/// Subject keywords that mark an event as vacation
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "Urlaub", "Vacation", "urlaub", "vacation", "Vakatie", "vakatie",
];

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Main configuration structure for the sync run
#[derive(Debug, Clone)]
pub struct Config {
    /// Display name of the group to sync into
    pub group_name: String,
    /// Application (client) id used for delegated sign-in
    pub client_id: String,
    /// Directory (tenant) id
    pub tenant_id: String,
    /// Vacation keywords, OR-combined as subject substrings
    pub keywords: Vec<String>,
    /// Credential flow used to sign in
    pub auth_flow: AuthFlow,
    /// Timezone the rolling window is computed in
    pub timezone: Tz,
    /// Print per-item detail instead of progress dots
    pub verbose: bool,
    /// Wait for Enter before the process exits
    pub pause_on_exit: bool,
    /// Port for the local OAuth redirect listener, 0 picks a free one
    pub redirect_port: u16,
    /// Graph API base URL
    pub graph_base_url: String,
    /// OAuth authority host
    pub authority_host: String,
}

impl Config {
    /// Load configuration from the environment and an optional `.env` file
    pub fn load() -> SyncResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let group_name = var("GROUP_NAME").unwrap_or_else(|| DEFAULT_GROUP_NAME.to_string());
        let client_id = var("AZURE_CLIENT_ID").unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());
        let tenant_id = var("AZURE_TENANT_ID").unwrap_or_else(|| DEFAULT_TENANT_ID.to_string());

        let keywords = match var("VACATION_KEYWORDS") {
            Some(raw) => parse_keywords(&raw)?,
            None => DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        };

        // An explicit flow wins over the container flag
        let in_container = parse_bool_var(&var, "DOTNET_RUNNING_IN_CONTAINER")?.unwrap_or(false)
            || parse_bool_var(&var, "RUNNING_IN_CONTAINER")?.unwrap_or(false);
        let auth_flow = match var("AUTH_FLOW") {
            Some(raw) => raw.parse::<AuthFlow>()?,
            None => AuthFlow::for_environment(in_container),
        };

        let timezone = match var("TIMEZONE") {
            Some(raw) => raw
                .trim()
                .parse::<Tz>()
                .map_err(|_| config_error(&format!("Unknown timezone '{}'", raw.trim())))?,
            None => Tz::UTC,
        };

        let verbose = parse_bool_var(&var, "VERBOSE")?.unwrap_or(false);
        let pause_on_exit =
            parse_bool_var(&var, "PAUSE_ON_EXIT")?.unwrap_or(auth_flow == AuthFlow::Interactive);

        let redirect_port = match var("REDIRECT_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| env_error("REDIRECT_PORT"))?,
            None => 0,
        };

        let graph_base_url = var("GRAPH_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string());
        let authority_host = var("AUTHORITY_HOST")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());

        Ok(Config {
            group_name,
            client_id,
            tenant_id,
            keywords,
            auth_flow,
            timezone,
            verbose,
            pause_on_exit,
            redirect_port,
            graph_base_url,
            authority_host,
        })
    }
}

/// Whether to pause on exit when loading the configuration failed.
///
/// Reads only the variables that decide the pause and falls back to the
/// `from_lookup` defaults for anything missing or invalid.
pub fn pause_on_exit_hint<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let flag = |key: &str| parse_bool_var(&var, key).ok().flatten();

    if let Some(pause) = flag("PAUSE_ON_EXIT") {
        return pause;
    }
    let in_container = flag("DOTNET_RUNNING_IN_CONTAINER").unwrap_or(false)
        || flag("RUNNING_IN_CONTAINER").unwrap_or(false);
    let auth_flow = var("AUTH_FLOW")
        .and_then(|raw| raw.parse::<AuthFlow>().ok())
        .unwrap_or_else(|| AuthFlow::for_environment(in_container));
    auth_flow == AuthFlow::Interactive
}

/// Split a comma separated keyword list, dropping blanks
pub fn parse_keywords(raw: &str) -> SyncResult<Vec<String>> {
    let keywords: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    if keywords.is_empty() {
        return Err(config_error("VACATION_KEYWORDS must contain at least one keyword"));
    }
    Ok(keywords)
}

fn parse_bool_var<F>(var: &F, key: &str) -> SyncResult<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(env_error(key)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> SyncResult<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.group_name, DEFAULT_GROUP_NAME);
        assert_eq!(config.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(config.keywords.len(), DEFAULT_KEYWORDS.len());
        assert_eq!(config.auth_flow, AuthFlow::Interactive);
        assert_eq!(config.timezone, Tz::UTC);
        assert!(config.pause_on_exit);
        assert!(!config.verbose);
        assert_eq!(config.graph_base_url, DEFAULT_GRAPH_BASE_URL);
    }

    #[test]
    fn test_container_flag_selects_device_code() {
        let config = config_from(&[("DOTNET_RUNNING_IN_CONTAINER", "true")]).unwrap();
        assert_eq!(config.auth_flow, AuthFlow::DeviceCode);
        assert!(!config.pause_on_exit);
    }

    #[test]
    fn test_explicit_flow_overrides_container_flag() {
        let config = config_from(&[
            ("RUNNING_IN_CONTAINER", "true"),
            ("AUTH_FLOW", "interactive"),
        ])
        .unwrap();
        assert_eq!(config.auth_flow, AuthFlow::Interactive);
    }

    #[test]
    fn test_keywords_and_overrides() {
        let config = config_from(&[
            ("VACATION_KEYWORDS", " Urlaub, ,Leave "),
            ("TIMEZONE", "Europe/Berlin"),
            ("GRAPH_BASE_URL", "http://localhost:9000/v1.0/"),
            ("VERBOSE", "yes"),
        ])
        .unwrap();
        assert_eq!(config.keywords, vec!["Urlaub", "Leave"]);
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.graph_base_url, "http://localhost:9000/v1.0");
        assert!(config.verbose);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("VACATION_KEYWORDS", " , ")]).is_err());
        assert!(config_from(&[("TIMEZONE", "Mars/Olympus")]).is_err());
        assert!(config_from(&[("VERBOSE", "maybe")]).is_err());
        assert!(config_from(&[("AUTH_FLOW", "smoke-signals")]).is_err());
        assert!(config_from(&[("REDIRECT_PORT", "99999")]).is_err());
    }

    fn pause_hint_from(pairs: &[(&str, &str)]) -> bool {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        pause_on_exit_hint(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_pause_hint_survives_broken_config() {
        // Config loading fails here, the interactive default still pauses
        assert!(config_from(&[("TIMEZONE", "Mars/Olympus")]).is_err());
        assert!(pause_hint_from(&[("TIMEZONE", "Mars/Olympus")]));

        assert!(!pause_hint_from(&[("RUNNING_IN_CONTAINER", "true"), ("VERBOSE", "maybe")]));
        assert!(!pause_hint_from(&[("PAUSE_ON_EXIT", "false"), ("AUTH_FLOW", "bogus")]));
        assert!(pause_hint_from(&[("PAUSE_ON_EXIT", "maybe")]));
        assert!(!pause_hint_from(&[("AUTH_FLOW", "device-code")]));
    }
}
