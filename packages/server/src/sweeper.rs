use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use common::ResourceType;
use sea_orm::sea_query::{LockType, Query};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use tracing::{error, info, warn};

use crate::config::SweeperConfig;
use crate::entity::{entry, file};
use crate::upload::UploadOrchestrator;

/// Periodically delete file resources whose upload was never finished.
pub async fn run_pending_sweeper(
    db: DatabaseConnection,
    uploads: Arc<UploadOrchestrator>,
    config: SweeperConfig,
) {
    let scan_interval = Duration::from_secs(config.scan_interval_secs.max(1));

    info!(
        timeout_secs = config.pending_timeout_secs,
        scan_interval_secs = config.scan_interval_secs,
        "Starting pending upload sweeper"
    );

    let mut interval = tokio::time::interval(scan_interval);

    loop {
        interval.tick().await;

        match sweep_stale_uploads(&db, &uploads, config.pending_timeout_secs).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Removed abandoned uploads"),
            Err(e) => error!(error = %e, "Pending upload sweep failed"),
        }
    }
}

/// Creation time before which a pending file counts as abandoned.
pub fn pending_cutoff(now: DateTime<Utc>, timeout_secs: u64) -> Option<DateTime<Utc>> {
    let age = TimeDelta::try_seconds(i64::try_from(timeout_secs).ok()?)?;
    now.checked_sub_signed(age)
}

/// One sweep pass. Returns how many resources were removed.
pub async fn sweep_stale_uploads(
    db: &DatabaseConnection,
    uploads: &UploadOrchestrator,
    pending_timeout_secs: u64,
) -> anyhow::Result<usize> {
    let cutoff = pending_cutoff(Utc::now(), pending_timeout_secs).ok_or_else(|| {
        anyhow::anyhow!("Pending timeout of {pending_timeout_secs}s is out of range")
    })?;

    let pending_files = Query::select()
        .column(file::Column::EntryId)
        .from(file::Entity)
        .and_where(file::Column::Pending.eq(true))
        .to_owned();

    let stale_ids: Vec<i64> = entry::Entity::find()
        .select_only()
        .column(entry::Column::Id)
        .filter(entry::Column::Kind.eq(ResourceType::File))
        .filter(entry::Column::CreatedAt.lt(cutoff))
        .filter(entry::Column::Id.in_subquery(pending_files))
        .into_tuple()
        .all(db)
        .await?;

    let mut removed = 0;
    for entry_id in stale_ids {
        match remove_stale_upload(db, uploads, entry_id).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => error!(entry_id, error = %e, "Failed to remove abandoned upload"),
        }
    }

    Ok(removed)
}

async fn remove_stale_upload(
    db: &DatabaseConnection,
    uploads: &UploadOrchestrator,
    entry_id: i64,
) -> anyhow::Result<bool> {
    let txn = db.begin().await?;

    let file = file::Entity::find_by_id(entry_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    // Finished between the scan and the lock.
    let Some(file) = file.filter(|f| f.pending) else {
        txn.rollback().await?;
        return Ok(false);
    };

    entry::Entity::delete_by_id(entry_id).exec(&txn).await?;
    txn.commit().await?;

    info!(entry_id, file_uuid = %file.file_uuid, "Removed abandoned upload");

    if let Err(e) = uploads.delete_object(&file.file_uuid).await {
        warn!(entry_id, error = %e, "Failed to delete object of abandoned upload");
    }

    Ok(true)
}
