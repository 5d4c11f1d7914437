use ulid::Ulid;

use crate::limits::{
    MAX_SCHEDULE_WINDOW_MS, MAX_SLOT_DURATION_MS, MAX_SLOTS_PER_BATCH, MIN_SLOT_DURATION_MS,
};
use crate::model::{Ms, Site, Slot, Span};
use crate::observability;

use super::{Engine, EngineError, validate_instant};

impl Engine {
    /// Bulk-create the schedule for a site: tile `[window_start, window_end)`
    /// in steps of `duration`, one slot per desk per step. Every invariant is
    /// checked before anything is persisted — a rejected request creates
    /// nothing. This is an operator path with no concurrent writers; a save
    /// failure here is fatal and propagates.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_slots(
        &self,
        site_id: Ulid,
        window_start: Ms,
        window_end: Ms,
        duration: Ms,
        desks: u32,
        margin: Option<u32>,
        margin_first_desk_only: bool,
    ) -> Result<Vec<Slot>, EngineError> {
        validate_instant(window_start)?;
        validate_instant(window_end)?;
        if duration < MIN_SLOT_DURATION_MS {
            return Err(EngineError::Validation("slot duration below minimum"));
        }
        if duration > MAX_SLOT_DURATION_MS {
            return Err(EngineError::Validation("slot duration above maximum"));
        }
        if window_end <= window_start {
            return Err(EngineError::Validation("schedule window is empty"));
        }
        if window_end - window_start > MAX_SCHEDULE_WINDOW_MS {
            return Err(EngineError::Validation("schedule window too wide"));
        }
        if desks == 0 {
            return Err(EngineError::Validation("desk count must be positive"));
        }
        let staff = self.staffing.assigned_staff(site_id).await?;
        if desks > staff {
            return Err(EngineError::Validation("desk count exceeds assigned staff"));
        }
        let _site: Site = self.store.get(site_id).await?;

        let mut slots = Vec::new();
        let mut t = window_start;
        while t + duration <= window_end {
            for desk in 0..desks {
                if slots.len() >= MAX_SLOTS_PER_BATCH {
                    return Err(EngineError::Validation("slot batch too large"));
                }
                let m = if margin_first_desk_only && desk > 0 {
                    None
                } else {
                    margin
                };
                slots.push(Slot::new(site_id, Span::new(t, t + duration), m));
            }
            t += duration;
        }

        // Full batch validated — persist it.
        for slot in &mut slots {
            self.store.save(slot, None).await?;
        }
        metrics::counter!(observability::SLOTS_CREATED_TOTAL).increment(slots.len() as u64);
        Ok(slots)
    }

    /// Display helper: slots at the site starting at or after `reference`,
    /// ordered by start time. Read path only — no locking, no reservation.
    pub async fn list_upcoming_slots(
        &self,
        site_id: Ulid,
        free_only: bool,
        reference: Ms,
    ) -> Result<Vec<Slot>, EngineError> {
        let mut slots: Vec<Slot> = self
            .store
            .query(|s: &Slot| {
                s.site_id == site_id && s.span.start >= reference && (!free_only || !s.reserved)
            })
            .await?;
        slots.sort_by_key(|s| s.span.start);
        Ok(slots)
    }
}
