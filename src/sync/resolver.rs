use crate::components::CalendarDirectory;
use crate::error::{Error, SyncResult};
use tracing::{debug, warn};

/// Look up the id of the group whose display name equals `group_name`
pub async fn resolve_group(
    directory: &dyn CalendarDirectory,
    group_name: &str,
) -> SyncResult<String> {
    let groups = directory.find_groups_by_name(group_name).await?;

    if groups.len() > 1 {
        warn!(
            "{} groups are named {}, using the first one",
            groups.len(),
            group_name
        );
    }

    let group = groups
        .into_iter()
        .next()
        .ok_or_else(|| Error::GroupNotFound(group_name.to_string()))?;
    debug!("Resolved group {} to {}", group_name, group.id);
    Ok(group.id)
}
