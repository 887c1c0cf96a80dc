use super::keywords::KeywordFilter;
use super::window::SyncWindow;
use crate::components::{CalendarDirectory, DirectoryObject, Event};
use crate::utils::Progress;
use tracing::{debug, error, info, warn};

/// Outcome of scanning the members' personal calendars
#[derive(Debug, Default, Clone)]
pub struct ScanReport {
    /// Events to copy into the shared calendar
    pub events: Vec<Event>,
    pub members_total: usize,
    pub members_scanned: usize,
    /// Non-users, disabled accounts and users without a mail address
    pub members_skipped: usize,
    /// Users whose calendar could not be read
    pub members_failed: usize,
    /// Set when the member listing itself failed
    pub listing_failed: bool,
}

/// True if `event` was organized by `member_mail` and is not private
pub fn is_relevant(event: &Event, member_mail: &str) -> bool {
    let organized_by_member = event
        .organizer_address()
        .map(|address| address.eq_ignore_ascii_case(member_mail))
        .unwrap_or(false);

    organized_by_member && !event.is_private()
}

/// Collect vacation events organized by the group's enabled users
pub async fn scan_members(
    directory: &dyn CalendarDirectory,
    group_id: &str,
    keywords: &KeywordFilter,
    window: &SyncWindow,
    verbose: bool,
) -> ScanReport {
    let mut report = ScanReport::default();

    let members = match directory.list_group_members(group_id).await {
        Ok(members) => members,
        Err(e) => {
            error!("Couldn't get members for {}: {}", group_id, e);
            report.listing_failed = true;
            return report;
        }
    };
    report.members_total = members.len();
    debug!("found {} members for group {}", members.len(), group_id);

    let mut progress = Progress::new(verbose);
    for member in &members {
        let Some(mail) = scannable_mail(member) else {
            report.members_skipped += 1;
            continue;
        };

        progress.item(|| format!("work on: {} ({})", mail, member.id));
        match directory.list_calendar_view(&member.id, keywords, window).await {
            Ok(events) => {
                let relevant: Vec<Event> = events
                    .into_iter()
                    .filter(|event| is_relevant(event, mail) && window.contains_event(event))
                    .collect();
                debug!("\tfound {} relevant entries", relevant.len());
                report.members_scanned += 1;
                report.events.extend(relevant);
            }
            Err(e) => {
                error!("Couldn't get events for {}: {}", mail, e);
                report.members_failed += 1;
            }
        }
    }
    progress.finish();

    info!(
        "Scanned {} of {} members, found {} vacation entries",
        report.members_scanned,
        report.members_total,
        report.events.len()
    );
    report
}

/// Mail address of a member worth scanning, `None` for anyone to skip
fn scannable_mail(member: &DirectoryObject) -> Option<&str> {
    if !member.is_user() {
        debug!("Skipping non-user member {}", member.id);
        return None;
    }
    if !member.is_enabled() {
        debug!("Skipping disabled account {}", member.id);
        return None;
    }
    match member.mail.as_deref().filter(|m| !m.trim().is_empty()) {
        Some(mail) => Some(mail),
        None => {
            warn!(
                "Skipping {} ({}): no mail address",
                member.display_name.as_deref().unwrap_or("unnamed user"),
                member.id
            );
            None
        }
    }
}
