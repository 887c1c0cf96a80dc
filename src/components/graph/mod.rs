//! Microsoft Graph REST client for the directory and calendar calls.

pub mod models;
mod pager;

pub use pager::Pager;

use crate::components::auth::token::{require_token, TokenManager};
use crate::components::CalendarDirectory;
use crate::error::{config_error, Error, SyncResult};
use crate::sync::keywords::{odata_string, KeywordFilter};
use crate::sync::window::SyncWindow;
use async_trait::async_trait;
use models::{DirectoryObject, Event, Group, MailboxSettings, NewEvent, Page};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Makes Graph return event times in UTC so they compare with the window
const UTC_PREFER_HEADER: &str = r#"outlook.timezone="UTC""#;

/// Fields needed to decide whether a member is scanned
const MEMBER_SELECT: &str = "id,displayName,mail,accountEnabled";

const EVENT_SELECT: &str = "id,subject,start,end,isAllDay,organizer,sensitivity";

/// Graph client bound to one signed-in credential
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
    tokens: TokenManager,
}

impl GraphClient {
    pub fn new(client: Client, base_url: &str, tokens: TokenManager) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Base URL plus percent-encoded path segments
    pub fn endpoint(&self, segments: &[&str]) -> SyncResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| config_error("Graph base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Pager over a collection starting at `url`
    pub fn pager<T: DeserializeOwned>(&self, url: Url) -> Pager<'_, T> {
        Pager::new(self, url)
    }

    /// Authorize, send and turn non-2xx replies into [`Error::Graph`]
    async fn send(&self, request: RequestBuilder) -> SyncResult<Response> {
        let token = require_token(self.tokens.access_token().await?)?;
        let response = request
            .bearer_auth(token)
            .header("Prefer", UTC_PREFER_HEADER)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(Error::from_graph_response(status.as_u16(), &body));
        }
        Ok(response)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> SyncResult<T> {
        debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json().await?)
    }
}

/// `displayName eq '<name>'`
pub fn group_name_filter(name: &str) -> String {
    format!("displayName eq {}", odata_string(name))
}

/// Keyword predicate restricted to events fully inside the window
pub fn window_event_filter(keywords: &KeywordFilter, window: &SyncWindow) -> String {
    format!(
        "({}) and start/dateTime ge {} and end/dateTime le {}",
        keywords.odata_predicate(),
        odata_string(&window.start_param()),
        odata_string(&window.end_param()),
    )
}

#[async_trait]
impl CalendarDirectory for GraphClient {
    async fn find_groups_by_name(&self, name: &str) -> SyncResult<Vec<Group>> {
        let mut url = self.endpoint(&["groups"])?;
        url.query_pairs_mut()
            .append_pair("$filter", &group_name_filter(name));
        let page: Page<Group> = self.get_json(url.as_str()).await?;
        Ok(page.value)
    }

    async fn list_group_members(&self, group_id: &str) -> SyncResult<Vec<DirectoryObject>> {
        let mut url = self.endpoint(&["groups", group_id, "members"])?;
        url.query_pairs_mut().append_pair("$select", MEMBER_SELECT);
        self.pager(url).collect_all().await
    }

    async fn list_group_events(
        &self,
        group_id: &str,
        keywords: &KeywordFilter,
        window: &SyncWindow,
    ) -> SyncResult<Vec<Event>> {
        let mut url = self.endpoint(&["groups", group_id, "calendar", "events"])?;
        url.query_pairs_mut()
            .append_pair("$filter", &window_event_filter(keywords, window))
            .append_pair("$select", EVENT_SELECT);
        self.pager(url).collect_all().await
    }

    async fn list_calendar_view(
        &self,
        user_id: &str,
        keywords: &KeywordFilter,
        window: &SyncWindow,
    ) -> SyncResult<Vec<Event>> {
        let mut url = self.endpoint(&["users", user_id, "calendar", "calendarView"])?;
        url.query_pairs_mut()
            .append_pair("startDateTime", &window.start_param())
            .append_pair("endDateTime", &window.end_param())
            .append_pair("$filter", &keywords.odata_predicate())
            .append_pair("$select", EVENT_SELECT);
        self.pager(url).collect_all().await
    }

    async fn delete_group_event(&self, group_id: &str, event_id: &str) -> SyncResult<()> {
        let url = self.endpoint(&["groups", group_id, "calendar", "events", event_id])?;
        debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn create_group_event(&self, group_id: &str, event: &NewEvent) -> SyncResult<Event> {
        let url = self.endpoint(&["groups", group_id, "calendar", "events"])?;
        debug!("POST {}", url);
        let response = self.send(self.client.post(url).json(event)).await?;
        Ok(response.json().await?)
    }

    async fn mailbox_settings(&self) -> SyncResult<MailboxSettings> {
        let url = self.endpoint(&["me", "mailboxSettings"])?;
        self.get_json(url.as_str()).await
    }
}
