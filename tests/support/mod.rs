#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use vacation_sync::components::graph::models::{
    DateTimeTimeZone, EmailAddress, Recipient, Sensitivity, USER_ODATA_TYPE,
};
use vacation_sync::components::{
    CalendarDirectory, DirectoryObject, Event, Group, MailboxSettings, NewEvent,
};
use vacation_sync::error::{Error, SyncResult};
use vacation_sync::sync::{KeywordFilter, SyncPlan, SyncWindow};

pub const GROUP_ID: &str = "group-sales";
pub const ORG_TIMEZONE: &str = "W. Europe Standard Time";

/// Calls the pipeline made, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindGroup(String),
    ListMembers,
    ListGroupEvents,
    CalendarView(String),
    Delete(String),
    Create(String),
    Mailbox,
}

#[derive(Debug, Default)]
pub struct DirectoryState {
    pub groups: Vec<Group>,
    pub members: HashMap<String, Vec<DirectoryObject>>,
    /// Personal calendars keyed by user id
    pub personal: HashMap<String, Vec<Event>>,
    /// Shared calendars keyed by group id
    pub shared: HashMap<String, Vec<Event>>,
    pub timezone: Option<String>,
    pub fail_mailbox: bool,
    pub fail_group_lookup: bool,
    pub fail_group_listing: bool,
    pub fail_member_listing: bool,
    pub fail_delete: HashSet<String>,
    pub fail_calendar_for: HashSet<String>,
    pub fail_create_subjects: HashSet<String>,
    pub calls: Vec<Call>,
    next_id: usize,
}

/// Mock directory that applies the same filters Graph would
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    pub state: Mutex<DirectoryState>,
}

fn service_error(message: &str) -> Error {
    Error::Graph {
        status: 500,
        code: "generalException".to_string(),
        message: message.to_string(),
    }
}

impl InMemoryDirectory {
    /// A directory with one group named "Sales" and the org timezone set
    pub fn with_sales_group() -> Self {
        let directory = Self::default();
        {
            let mut state = directory.state.lock().unwrap();
            state.groups.push(Group {
                id: GROUP_ID.to_string(),
                display_name: Some("Sales".to_string()),
            });
            state.timezone = Some(ORG_TIMEZONE.to_string());
        }
        directory
    }

    pub fn add_member(&self, member: DirectoryObject) {
        let mut state = self.state.lock().unwrap();
        state
            .members
            .entry(GROUP_ID.to_string())
            .or_default()
            .push(member);
    }

    pub fn add_personal_event(&self, user_id: &str, event: Event) {
        let mut state = self.state.lock().unwrap();
        let id = format!("personal-{}", state.next_id);
        state.next_id += 1;
        let event = Event {
            id: Some(id),
            ..event
        };
        state
            .personal
            .entry(user_id.to_string())
            .or_default()
            .push(event);
    }

    pub fn add_shared_event(&self, id: &str, event: Event) {
        let mut state = self.state.lock().unwrap();
        let event = Event {
            id: Some(id.to_string()),
            ..event
        };
        state
            .shared
            .entry(GROUP_ID.to_string())
            .or_default()
            .push(event);
    }

    pub fn shared_subjects(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut subjects: Vec<String> = state
            .shared
            .get(GROUP_ID)
            .map(|events| events.iter().map(|e| e.subject_str().to_string()).collect())
            .unwrap_or_default();
        subjects.sort();
        subjects
    }

    pub fn shared_events(&self) -> Vec<Event> {
        let state = self.state.lock().unwrap();
        state.shared.get(GROUP_ID).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut DirectoryState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }
}

#[async_trait]
impl CalendarDirectory for InMemoryDirectory {
    async fn find_groups_by_name(&self, name: &str) -> SyncResult<Vec<Group>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FindGroup(name.to_string()));
        if state.fail_group_lookup {
            return Err(service_error("group lookup failed"));
        }
        Ok(state
            .groups
            .iter()
            .filter(|g| g.display_name.as_deref() == Some(name))
            .cloned()
            .collect())
    }

    async fn list_group_members(&self, group_id: &str) -> SyncResult<Vec<DirectoryObject>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListMembers);
        if state.fail_member_listing {
            return Err(service_error("member listing failed"));
        }
        Ok(state.members.get(group_id).cloned().unwrap_or_default())
    }

    async fn list_group_events(
        &self,
        group_id: &str,
        keywords: &KeywordFilter,
        window: &SyncWindow,
    ) -> SyncResult<Vec<Event>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListGroupEvents);
        if state.fail_group_listing {
            return Err(service_error("listing failed"));
        }
        Ok(state
            .shared
            .get(group_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| keywords.matches(e.subject_str()) && window.contains_event(e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_calendar_view(
        &self,
        user_id: &str,
        keywords: &KeywordFilter,
        window: &SyncWindow,
    ) -> SyncResult<Vec<Event>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CalendarView(user_id.to_string()));
        if state.fail_calendar_for.contains(user_id) {
            return Err(service_error("mailbox not reachable"));
        }
        // calendarView returns everything overlapping the range
        Ok(state
            .personal
            .get(user_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| keywords.matches(e.subject_str()) && overlaps(e, window))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_group_event(&self, group_id: &str, event_id: &str) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(event_id.to_string()));
        if state.fail_delete.contains(event_id) {
            return Err(service_error("delete failed"));
        }
        if let Some(events) = state.shared.get_mut(group_id) {
            events.retain(|e| e.id.as_deref() != Some(event_id));
        }
        Ok(())
    }

    async fn create_group_event(&self, group_id: &str, event: &NewEvent) -> SyncResult<Event> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(event.subject.clone()));
        if state.fail_create_subjects.contains(&event.subject) {
            return Err(service_error("create failed"));
        }
        let id = format!("shared-{}", state.next_id);
        state.next_id += 1;
        let created = Event {
            id: Some(id),
            subject: Some(event.subject.clone()),
            start: event.start.clone(),
            end: event.end.clone(),
            ..Default::default()
        };
        state
            .shared
            .entry(group_id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn mailbox_settings(&self) -> SyncResult<MailboxSettings> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Mailbox);
        if state.fail_mailbox {
            return Err(service_error("mailbox settings unavailable"));
        }
        Ok(MailboxSettings {
            time_zone: state.timezone.clone(),
        })
    }
}

fn overlaps(event: &Event, window: &SyncWindow) -> bool {
    match (
        event.start.as_ref().and_then(DateTimeTimeZone::as_utc),
        event.end.as_ref().and_then(DateTimeTimeZone::as_utc),
    ) {
        (Some(start), Some(end)) => start < window.end && end > window.start,
        _ => false,
    }
}

pub fn user(id: &str, name: &str, mail: &str, enabled: bool) -> DirectoryObject {
    DirectoryObject {
        odata_type: Some(USER_ODATA_TYPE.to_string()),
        id: id.to_string(),
        display_name: Some(name.to_string()),
        mail: Some(mail.to_string()),
        account_enabled: Some(enabled),
    }
}

/// Timed event organized by `organizer`, times in UTC
pub fn event(subject: &str, organizer: (&str, &str), start: &str, end: &str) -> Event {
    Event {
        id: None,
        subject: Some(subject.to_string()),
        start: Some(DateTimeTimeZone::new(start, "UTC")),
        end: Some(DateTimeTimeZone::new(end, "UTC")),
        is_all_day: Some(false),
        organizer: Some(Recipient {
            email_address: Some(EmailAddress {
                name: Some(organizer.0.to_string()),
                address: Some(organizer.1.to_string()),
            }),
        }),
        sensitivity: Some(Sensitivity::Normal),
    }
}

pub fn all_day(subject: &str, organizer: (&str, &str), start: &str, end: &str) -> Event {
    Event {
        is_all_day: Some(true),
        ..event(subject, organizer, start, end)
    }
}

/// Plan for a fixed "now" of 2026-10-16 12:00 UTC
pub fn plan() -> SyncPlan {
    let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
    SyncPlan {
        group_name: "Sales".to_string(),
        keywords: KeywordFilter::new(["Urlaub", "Vacation", "urlaub", "vacation"]).unwrap(),
        window: SyncWindow::around(now).unwrap(),
        verbose: true,
    }
}
