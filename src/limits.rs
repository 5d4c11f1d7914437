//! Operational limits. Values bound single requests so one caller cannot
//! overload a site's schedule or spin forever on a contended slot.

use crate::model::Ms;

/// Shortest slot an operator may generate.
pub const MIN_SLOT_DURATION_MS: Ms = 10 * 60_000;

/// Longest slot an operator may generate (one day).
pub const MAX_SLOT_DURATION_MS: Ms = 24 * 3_600_000;

/// Widest schedule-generation window (7 days).
pub const MAX_SCHEDULE_WINDOW_MS: Ms = 7 * 86_400_000;

/// Most slots one generation request may create.
pub const MAX_SLOTS_PER_BATCH: usize = 200;

/// Search-and-reserve iterations before a conflict is surfaced to the caller.
pub const MAX_BOOKING_ATTEMPTS: u32 = 10;

/// Base of the exponential backoff between booking retries, in milliseconds.
pub const RETRY_BACKOFF_BASE_MS: u64 = 2;

/// Lead time (business days) beyond which a confirmed booking raises an alert.
pub const LEAD_TIME_ALERT_BUSINESS_DAYS: u32 = 3;

/// Default per-site booking lookahead in business days.
pub const DEFAULT_MAX_DAYS_AHEAD: u32 = 3;

/// Accepted timestamp range: [1970-01-01, 2100-01-01).
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;
