//! The vacation sync pipeline.
//!
//! `ResolveGroup → FetchMailboxSettings → Clean → Scan → Publish → Done`.
//! Only the first two stages can stop a run; everything after them logs its
//! failures and moves on.

pub mod cleaner;
pub mod keywords;
pub mod publisher;
pub mod resolver;
pub mod scanner;
pub mod window;

pub use cleaner::CleanReport;
pub use keywords::KeywordFilter;
pub use publisher::PublishReport;
pub use scanner::ScanReport;
pub use window::SyncWindow;

use crate::components::CalendarDirectory;
use crate::config::Config;
use crate::error::SyncResult;
use std::fmt;
use tracing::{error, info, warn};

/// Stages of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunStage {
    ResolveGroup,
    FetchMailboxSettings,
    Clean,
    Scan,
    Publish,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::ResolveGroup => "resolve group",
            RunStage::FetchMailboxSettings => "fetch mailbox settings",
            RunStage::Clean => "clean shared calendar",
            RunStage::Scan => "scan members",
            RunStage::Publish => "publish entries",
            RunStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a run works on, fixed at run start
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub group_name: String,
    pub keywords: KeywordFilter,
    pub window: SyncWindow,
    pub verbose: bool,
}

impl SyncPlan {
    /// Plan for the current moment
    pub fn from_config(config: &Config) -> SyncResult<Self> {
        Ok(Self {
            group_name: config.group_name.clone(),
            keywords: KeywordFilter::new(config.keywords.iter().cloned())?,
            window: SyncWindow::current(config.timezone)?,
            verbose: config.verbose,
        })
    }
}

/// Summary of a run that got past the fatal stages
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub group_id: String,
    pub organization_timezone: Option<String>,
    /// `None` when listing the shared calendar failed
    pub clean: Option<CleanReport>,
    pub scan: ScanReport,
    pub publish: PublishReport,
}

impl SyncReport {
    /// True if any per-item step failed
    pub fn had_failures(&self) -> bool {
        self.clean.as_ref().map_or(true, |c| !c.failed.is_empty())
            || self.scan.listing_failed
            || self.scan.members_failed > 0
            || self.publish.failed > 0
    }
}

fn enter(stage: RunStage) {
    info!("Stage: {}", stage);
}

/// Run the pipeline once.
///
/// Returns `Err` only if the group cannot be resolved or the mailbox
/// settings cannot be read; nothing is changed in either case.
pub async fn run(directory: &dyn CalendarDirectory, plan: &SyncPlan) -> SyncResult<SyncReport> {
    info!(
        "Syncing vacation entries for {} between {} and {}",
        plan.group_name,
        plan.window.start_param(),
        plan.window.end_param()
    );

    enter(RunStage::ResolveGroup);
    let group_id = resolver::resolve_group(directory, &plan.group_name)
        .await
        .inspect_err(|e| error!("Couldn't get group {}: {}", plan.group_name, e))?;

    enter(RunStage::FetchMailboxSettings);
    let mailbox = directory
        .mailbox_settings()
        .await
        .inspect_err(|e| error!("Couldn't get mailbox settings: {}", e))?;
    let organization_timezone = mailbox.time_zone;
    if organization_timezone.is_none() {
        warn!("Mailbox settings carry no timezone, all-day entries are copied unchanged");
    }

    enter(RunStage::Clean);
    let clean = match cleaner::clean_calendar(
        directory,
        &group_id,
        &plan.keywords,
        &plan.window,
        plan.verbose,
    )
    .await
    {
        Ok(report) => Some(report),
        Err(e) => {
            error!(
                "Couldn't get calendar entries for filter {}: {}",
                plan.keywords.odata_predicate(),
                e
            );
            None
        }
    };

    enter(RunStage::Scan);
    let scan = scanner::scan_members(
        directory,
        &group_id,
        &plan.keywords,
        &plan.window,
        plan.verbose,
    )
    .await;

    enter(RunStage::Publish);
    let publish = publisher::publish_all(
        directory,
        &group_id,
        &scan.events,
        organization_timezone.as_deref(),
        plan.verbose,
    )
    .await;

    enter(RunStage::Done);
    let report = SyncReport {
        group_id,
        organization_timezone,
        clean,
        scan,
        publish,
    };
    if report.had_failures() {
        warn!("Sync finished with errors, see the log above");
    }
    Ok(report)
}
