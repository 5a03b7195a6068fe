// ── Full snapshot assembly ──
//
// One poll cycle: zone listing, device listing, then best-effort
// hot-water enrichment. The listing calls fail the cycle atomically;
// enrichment never does. The whole cycle -- every request it makes --
// runs under one shared wall-clock budget.

use std::time::Duration;

use tracing::debug;

use tadolocal_api::LocalClient;

use crate::convert;
use crate::error::CoreError;
use crate::model::{Zone, ZoneKind};
use crate::store::SyncState;

/// Fetch one consistent snapshot of the whole bridge.
///
/// Either both listings succeed and a complete `SyncState` is returned
/// within `budget`, or the cycle fails and nothing is produced. The
/// budget is total: both listings and every enrichment call share it,
/// so a bridge with many hot-water zones cannot stretch the cycle.
pub(crate) async fn fetch_snapshot(
    client: &LocalClient,
    budget: Duration,
) -> Result<SyncState, CoreError> {
    tokio::time::timeout(budget, assemble_snapshot(client))
        .await
        .map_err(|_| CoreError::Timeout)?
}

async fn assemble_snapshot(client: &LocalClient) -> Result<SyncState, CoreError> {
    let zone_records = client.list_zones().await?;
    let device_records = client.list_devices().await?;

    let mut zones: Vec<Zone> = zone_records
        .into_iter()
        .filter_map(convert::zone_from_record)
        .collect();
    let devices = device_records
        .into_iter()
        .filter_map(convert::device_from_record)
        .collect();

    for zone in zones.iter_mut().filter(|z| z.kind == ZoneKind::HotWater) {
        enrich_hot_water(client, zone).await;
    }

    Ok(SyncState { zones, devices })
}

/// Best-effort enrichment: on success the detail replaces the zone's
/// hot-water sub-state; on any failure the prior value stays and the
/// cycle continues with the next zone.
async fn enrich_hot_water(client: &LocalClient, zone: &mut Zone) {
    match client.hot_water_detail(&zone.id.to_raw()).await {
        Ok(detail) => {
            let Some(value) = detail.state else { return };
            match serde_json::from_value(value) {
                Ok(hot_water) => zone.state.hot_water = Some(hot_water),
                Err(e) => {
                    debug!(zone = %zone.id, error = %e, "unusable hot-water detail");
                }
            }
        }
        Err(e) => {
            debug!(zone = %zone.id, error = %e, "hot-water detail fetch failed");
        }
    }
}
