use super::keywords::KeywordFilter;
use super::window::SyncWindow;
use crate::components::CalendarDirectory;
use crate::error::SyncResult;
use crate::utils::Progress;
use tracing::{debug, error, info, warn};

/// Outcome of clearing previously synced entries
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanReport {
    /// Events the listing returned
    pub found: usize,
    pub deleted: usize,
    /// Ids whose delete failed
    pub failed: Vec<String>,
}

/// Delete every shared-calendar vacation event inside the window.
///
/// Returns `Err` only when the listing itself fails; individual deletes are
/// logged and counted.
pub async fn clean_calendar(
    directory: &dyn CalendarDirectory,
    group_id: &str,
    keywords: &KeywordFilter,
    window: &SyncWindow,
    verbose: bool,
) -> SyncResult<CleanReport> {
    let entries = directory
        .list_group_events(group_id, keywords, window)
        .await?;
    debug!(
        "Found {} entries between {} and {}",
        entries.len(),
        window.start_param(),
        window.end_param()
    );

    let mut report = CleanReport {
        found: entries.len(),
        ..Default::default()
    };
    let mut progress = Progress::new(verbose);

    for entry in &entries {
        let Some(event_id) = entry.id.as_deref() else {
            warn!("Skipping shared event without id: {}", entry.describe());
            continue;
        };

        progress.item(|| format!("delete: {} ({})", entry.describe(), event_id));
        match directory.delete_group_event(group_id, event_id).await {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                error!("Couldn't delete event {}: {}", event_id, e);
                report.failed.push(event_id.to_string());
            }
        }
    }
    progress.finish();

    info!(
        "Removed {} of {} previously synced entries",
        report.deleted, report.found
    );
    Ok(report)
}
