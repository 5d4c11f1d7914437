mod booking;
mod error;
mod reservations;
mod schedule;

pub use error::EngineError;
pub use reservations::{release, reserve};

use std::sync::Arc;

use ulid::Ulid;

use crate::alerts::AlertHub;
use crate::config::EngineConfig;
use crate::limits::{MAX_VALID_TIMESTAMP_MS, MIN_VALID_TIMESTAMP_MS};
use crate::model::{Alert, AlertKind, Ms, Slot};
use crate::observability;
use crate::staffing::StaffingDirectory;
use crate::store::Store;

/// The slot-booking engine. Coordination between concurrent bookings happens
/// exclusively through the store's compare-and-swap — the engine holds no
/// lock across a store call.
pub struct Engine {
    pub store: Store,
    pub alerts: Arc<AlertHub>,
    staffing: Arc<dyn StaffingDirectory>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(store: Store, staffing: Arc<dyn StaffingDirectory>, config: EngineConfig) -> Self {
        Self {
            store,
            alerts: Arc::new(AlertHub::new()),
            staffing,
            config,
        }
    }

    /// Persist + broadcast an alert. Observational only: a failed write is
    /// logged and never fails the calling operation.
    pub(super) async fn raise_alert(&self, site_id: Ulid, kind: AlertKind, message: String) {
        let mut alert = Alert::new(site_id, kind, message);
        if let Err(e) = self.store.save(&mut alert, None).await {
            tracing::warn!(site = %site_id, "alert write failed: {e}");
        }
        self.alerts.send(site_id, &alert);
        metrics::counter!(observability::ALERTS_TOTAL, "kind" => kind.label()).increment(1);
    }

    /// Undo reservations this call made: reload each slot, clear the
    /// reservation, save unconditionally. Idempotent — a slot someone already
    /// freed is skipped — and best-effort: failures are logged, the remaining
    /// slots are still released.
    pub(super) async fn release_held(&self, held: &[Slot]) {
        for slot in held {
            let mut fresh: Slot = match self.store.get(slot.meta.id).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(slot = %slot.meta.id, "rollback reload failed: {e}");
                    continue;
                }
            };
            if !fresh.reserved {
                continue;
            }
            fresh.reserved = false;
            fresh.case = None;
            if let Err(e) = self.store.save(&mut fresh, None).await {
                tracing::warn!(slot = %fresh.meta.id, "rollback release failed: {e}");
            }
        }
    }
}

pub(super) fn validate_instant(t: Ms) -> Result<(), EngineError> {
    if !(MIN_VALID_TIMESTAMP_MS..MAX_VALID_TIMESTAMP_MS).contains(&t) {
        return Err(EngineError::Validation("timestamp out of range"));
    }
    Ok(())
}
