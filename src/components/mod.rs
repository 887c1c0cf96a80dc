use crate::error::SyncResult;
use crate::sync::keywords::KeywordFilter;
use crate::sync::window::SyncWindow;
use async_trait::async_trait;

// Export components
pub mod auth;
pub mod graph;

pub use auth::TokenManager;
pub use graph::models::{DirectoryObject, Event, Group, MailboxSettings, NewEvent};
pub use graph::GraphClient;

/// The directory/calendar operations the sync pipeline relies on.
///
/// [`GraphClient`] talks to Microsoft Graph; tests plug in an in-memory
/// directory instead. Collection calls return every page.
#[async_trait]
pub trait CalendarDirectory: Send + Sync {
    /// Groups whose display name equals `name` exactly
    async fn find_groups_by_name(&self, name: &str) -> SyncResult<Vec<Group>>;

    /// Direct members of a group
    async fn list_group_members(&self, group_id: &str) -> SyncResult<Vec<DirectoryObject>>;

    /// Shared calendar events matching the keywords, fully inside the window
    async fn list_group_events(
        &self,
        group_id: &str,
        keywords: &KeywordFilter,
        window: &SyncWindow,
    ) -> SyncResult<Vec<Event>>;

    /// A user's calendar view over the window, filtered by keywords
    async fn list_calendar_view(
        &self,
        user_id: &str,
        keywords: &KeywordFilter,
        window: &SyncWindow,
    ) -> SyncResult<Vec<Event>>;

    async fn delete_group_event(&self, group_id: &str, event_id: &str) -> SyncResult<()>;

    async fn create_group_event(&self, group_id: &str, event: &NewEvent) -> SyncResult<Event>;

    /// Mailbox settings of the signed-in user
    async fn mailbox_settings(&self) -> SyncResult<MailboxSettings>;
}
