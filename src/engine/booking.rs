use std::time::{Duration, Instant};

use tracing::debug;
use ulid::Ulid;

use crate::calendar::{
    add_business_days, business_days_between, next_business_day_start, now_ms,
};
use crate::model::{AlertKind, Booking, BookingRequest, CaseRef, Ms, Site, Slot};
use crate::observability;

use super::reservations::reserve;
use super::{Engine, EngineError, validate_instant};

impl Engine {
    /// Find and reserve one free future slot at the site — or, for a family
    /// request, two back-to-back slots. The whole search-and-reserve cycle
    /// retries on write conflicts, up to the configured attempt cap; the
    /// final conflict is surfaced if contention never clears.
    ///
    /// An empty result (no eligible slot) is a valid outcome, not an error;
    /// it emits a "no slots" alert and leaves the schedule untouched.
    pub async fn book(
        &self,
        site_id: Ulid,
        case: CaseRef,
        req: BookingRequest,
    ) -> Result<Booking, EngineError> {
        let site: Site = self.store.get(site_id).await?;
        let reference = req.reference_time.unwrap_or_else(now_ms);
        validate_instant(reference)?;

        // Earliest reservable moment: the next business day, never same-day.
        let search_start = next_business_day_start(reference);
        let days_ahead = req.max_days_ahead.unwrap_or(site.max_days_ahead);
        let window_end = (days_ahead > 0).then(|| add_business_days(search_start, days_ahead));

        let started = Instant::now();
        let mut attempts: u32 = 0;
        let slots = loop {
            attempts += 1;
            let candidates = self.free_slots(site_id, search_start, window_end).await?;
            let result = if req.family {
                self.try_reserve_pair(candidates, case).await
            } else {
                self.try_reserve_first(candidates, case).await
            };
            match result {
                Ok(slots) => break slots,
                Err(e) if e.is_conflict() => {
                    if attempts >= self.config.max_attempts {
                        metrics::counter!(observability::BOOKINGS_TOTAL, "outcome" => "conflict")
                            .increment(1);
                        return Err(e);
                    }
                    debug!(site = %site_id, attempts, "slot contention, retrying search");
                    let backoff = self.config.retry_backoff_ms << (attempts - 1).min(6);
                    if backoff > 0 {
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        };

        metrics::histogram!(observability::BOOKING_ATTEMPTS).record(attempts as f64);
        metrics::histogram!(observability::BOOKING_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        if slots.is_empty() {
            metrics::counter!(observability::BOOKINGS_TOTAL, "outcome" => "unsatisfied")
                .increment(1);
            self.raise_alert(
                site_id,
                AlertKind::NoSlots,
                format!("no bookable slot at site {site_id}"),
            )
            .await;
        } else {
            metrics::counter!(observability::BOOKINGS_TOTAL, "outcome" => "booked").increment(1);
        }

        Ok(Booking {
            site_id,
            case,
            search_start,
            slots,
            confirmed: false,
        })
    }

    /// Deferred lead-time check, to be called only once the caller's own
    /// linked document has been durably saved: raises an alert when the
    /// earliest reserved slot sits beyond the configured lead time.
    pub async fn confirm(&self, booking: &mut Booking) {
        if let Some(first) = booking.slots.first() {
            let lead = business_days_between(booking.search_start, first.span.start);
            if lead > self.config.lead_time_alert_days {
                self.raise_alert(
                    booking.site_id,
                    AlertKind::LongLeadTime,
                    format!("earliest slot is {lead} business days out"),
                )
                .await;
            }
        }
        booking.confirmed = true;
    }

    /// Release every slot held by the booking (unconditional saves) — the
    /// escape hatch when the caller's own document save fails after the slots
    /// were reserved. Idempotent and best-effort; failures are logged.
    pub async fn cancel(&self, booking: &mut Booking) {
        self.release_held(&booking.slots).await;
        booking.slots.clear();
        booking.confirmed = false;
    }

    /// Free slots at the site ordered by start time, restricted to the search
    /// window. Fetched fresh on every retry iteration — stale candidates are
    /// how conflicts happen, not how they are resolved.
    async fn free_slots(
        &self,
        site_id: Ulid,
        from: Ms,
        until: Option<Ms>,
    ) -> Result<Vec<Slot>, EngineError> {
        let mut slots: Vec<Slot> = self
            .store
            .query(|s: &Slot| {
                s.site_id == site_id
                    && !s.reserved
                    && s.span.start >= from
                    && until.is_none_or(|end| s.span.start < end)
            })
            .await?;
        slots.sort_by_key(|s| s.span.start);
        Ok(slots)
    }

    async fn try_reserve_first(
        &self,
        mut candidates: Vec<Slot>,
        case: CaseRef,
    ) -> Result<Vec<Slot>, EngineError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let mut slot = candidates.remove(0);
        reserve(&mut slot, case)?;
        let expected = slot.meta.version;
        self.store.save(&mut slot, Some(expected)).await?;
        Ok(vec![slot])
    }

    /// Scan adjacent candidates for a back-to-back pair. Slots sharing a start
    /// time are parallel desks for the same period, never a pair — the scan
    /// skips them and advances.
    async fn try_reserve_pair(
        &self,
        mut candidates: Vec<Slot>,
        case: CaseRef,
    ) -> Result<Vec<Slot>, EngineError> {
        let mut pick = None;
        for i in 0..candidates.len().saturating_sub(1) {
            let (a, b) = (&candidates[i], &candidates[i + 1]);
            if a.span.start == b.span.start {
                continue;
            }
            if a.span.end == b.span.start {
                pick = Some(i);
                break;
            }
        }
        let Some(i) = pick else {
            return Ok(Vec::new());
        };
        let mut second = candidates.remove(i + 1);
        let mut first = candidates.remove(i);

        reserve(&mut first, case)?;
        let expected = first.meta.version;
        self.store.save(&mut first, Some(expected)).await?;

        // From here on, `first` is ours: any failure on the second slot must
        // undo it before returning or retrying.
        if let Err(e) = reserve(&mut second, case) {
            self.release_held(std::slice::from_ref(&first)).await;
            return Err(e);
        }
        let expected = second.meta.version;
        if let Err(e) = self.store.save(&mut second, Some(expected)).await {
            self.release_held(std::slice::from_ref(&first)).await;
            return Err(e.into());
        }

        Ok(vec![first, second])
    }
}
