use crate::sync::window::parse_graph_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `@odata.type` of user principals in a members listing
pub const USER_ODATA_TYPE: &str = "#microsoft.graph.user";

/// One page of a Graph collection
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Group member; only users carry the mail/account fields
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryObject {
    #[serde(rename = "@odata.type", default)]
    pub odata_type: Option<String>,
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub account_enabled: Option<bool>,
}

impl DirectoryObject {
    pub fn is_user(&self) -> bool {
        self.odata_type.as_deref() == Some(USER_ODATA_TYPE)
    }

    /// Only an explicit `false` disables a member
    pub fn is_enabled(&self) -> bool {
        self.account_enabled != Some(false)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Normal,
    Personal,
    Private,
    Confidential,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl DateTimeTimeZone {
    pub fn new(date_time: &str, time_zone: &str) -> Self {
        Self {
            date_time: date_time.to_string(),
            time_zone: Some(time_zone.to_string()),
        }
    }

    /// Interpret `date_time` as UTC
    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        parse_graph_datetime(&self.date_time).map(|naive| naive.and_utc())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct EmailAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    #[serde(default)]
    pub email_address: Option<EmailAddress>,
}

/// Calendar event as read from Graph
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub start: Option<DateTimeTimeZone>,
    #[serde(default)]
    pub end: Option<DateTimeTimeZone>,
    #[serde(default)]
    pub is_all_day: Option<bool>,
    #[serde(default)]
    pub organizer: Option<Recipient>,
    #[serde(default)]
    pub sensitivity: Option<Sensitivity>,
}

impl Event {
    pub fn subject_str(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }

    pub fn organizer_address(&self) -> Option<&str> {
        self.organizer
            .as_ref()
            .and_then(|o| o.email_address.as_ref())
            .and_then(|e| e.address.as_deref())
    }

    pub fn organizer_name(&self) -> Option<&str> {
        self.organizer
            .as_ref()
            .and_then(|o| o.email_address.as_ref())
            .and_then(|e| e.name.as_deref())
    }

    pub fn all_day(&self) -> bool {
        self.is_all_day.unwrap_or(false)
    }

    pub fn is_private(&self) -> bool {
        self.sensitivity == Some(Sensitivity::Private)
    }

    /// One-line description for log output
    pub fn describe(&self) -> String {
        format!(
            "{} ({}) {} - {}",
            self.subject_str(),
            self.organizer_name().unwrap_or(""),
            self.start.as_ref().map(|s| s.date_time.as_str()).unwrap_or(""),
            self.end.as_ref().map(|e| e.date_time.as_str()).unwrap_or(""),
        )
    }
}

/// Body of a create request against the shared calendar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub subject: String,
    pub start: Option<DateTimeTimeZone>,
    pub end: Option<DateTimeTimeZone>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MailboxSettings {
    #[serde(default)]
    pub time_zone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserializes_graph_shape() {
        let event: Event = serde_json::from_str(
            r#"{
                "id": "AAMk",
                "subject": "Urlaub",
                "isAllDay": true,
                "sensitivity": "private",
                "start": {"dateTime": "2026-11-02T00:00:00.0000000", "timeZone": "UTC"},
                "end": {"dateTime": "2026-11-07T00:00:00.0000000", "timeZone": "UTC"},
                "organizer": {"emailAddress": {"name": "Anna", "address": "anna@example.com"}},
                "showAs": "oof"
            }"#,
        )
        .unwrap();

        assert_eq!(event.id.as_deref(), Some("AAMk"));
        assert!(event.all_day());
        assert!(event.is_private());
        assert_eq!(event.organizer_address(), Some("anna@example.com"));
        assert_eq!(event.organizer_name(), Some("Anna"));
        assert_eq!(
            event.start.unwrap().as_utc().unwrap().to_rfc3339(),
            "2026-11-02T00:00:00+00:00"
        );
    }

    #[test]
    fn test_unknown_sensitivity_is_tolerated() {
        let event: Event = serde_json::from_str(r#"{"sensitivity": "topSecret"}"#).unwrap();
        assert_eq!(event.sensitivity, Some(Sensitivity::Unknown));
        assert!(!event.is_private());
    }

    #[test]
    fn test_member_kinds() {
        let members: Page<DirectoryObject> = serde_json::from_str(
            r##"{"value": [
                {"@odata.type": "#microsoft.graph.user", "id": "1", "mail": "a@x", "accountEnabled": false},
                {"@odata.type": "#microsoft.graph.group", "id": "2"},
                {"@odata.type": "#microsoft.graph.user", "id": "3"}
            ], "@odata.nextLink": "https://graph/next"}"##,
        )
        .unwrap();

        assert_eq!(members.next_link.as_deref(), Some("https://graph/next"));
        assert!(members.value[0].is_user());
        assert!(!members.value[0].is_enabled());
        assert!(!members.value[1].is_user());
        // accountEnabled missing counts as enabled
        assert!(members.value[2].is_enabled());
    }
}
