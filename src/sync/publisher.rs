use crate::components::{CalendarDirectory, Event, NewEvent};
use crate::error::SyncResult;
use crate::utils::Progress;
use tracing::{error, info};

/// Outcome of copying discovered events into the shared calendar
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub created: usize,
    pub failed: usize,
}

/// Build the shared-calendar copy of a personal event.
///
/// All-day events get the organization timezone on both ends; without it
/// the copy can land on the wrong day.
pub fn prepare_copy(source: &Event, organization_timezone: Option<&str>) -> NewEvent {
    let mut start = source.start.clone();
    let mut end = source.end.clone();

    if let (Some(timezone), true) = (organization_timezone, source.all_day()) {
        for bound in [&mut start, &mut end].into_iter().flatten() {
            bound.time_zone = Some(timezone.to_string());
        }
    }

    NewEvent {
        subject: format!(
            "{} ({})",
            source.subject_str(),
            source.organizer_name().unwrap_or("")
        ),
        start,
        end,
    }
}

/// Create one copy in the group's calendar
pub async fn publish_event(
    directory: &dyn CalendarDirectory,
    group_id: &str,
    source: &Event,
    organization_timezone: Option<&str>,
) -> SyncResult<Event> {
    let copy = prepare_copy(source, organization_timezone);
    directory.create_group_event(group_id, &copy).await
}

/// Copy every event, logging failures and carrying on
pub async fn publish_all(
    directory: &dyn CalendarDirectory,
    group_id: &str,
    events: &[Event],
    organization_timezone: Option<&str>,
    verbose: bool,
) -> PublishReport {
    let mut report = PublishReport::default();
    let mut progress = Progress::new(verbose);

    for event in events {
        progress.item(|| format!("create: {}", event.describe()));
        match publish_event(directory, group_id, event, organization_timezone).await {
            Ok(_) => report.created += 1,
            Err(e) => {
                let dump = serde_json::to_string(event).unwrap_or_else(|_| event.describe());
                error!("Couldn't create event {}: {}", dump, e);
                report.failed += 1;
            }
        }
    }
    progress.finish();

    info!("Created {} shared entries", report.created);
    report
}
