use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::calendar::now_ms;
use crate::limits::DEFAULT_MAX_DAYS_AHEAD;

/// Unix milliseconds — the only time type in the data model.
pub type Ms = i64;

/// Per-document version counter. 0 means "never persisted".
pub type Version = u64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Header embedded in every persisted document. `version`, `created_at` and
/// `updated_at` are owned by the store; callers only ever read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub id: Ulid,
    pub version: Version,
    pub created_at: Ms,
    pub updated_at: Ms,
}

impl Meta {
    pub fn new() -> Self {
        let now = now_ms();
        Self {
            id: Ulid::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixed set of case-file kinds a reservation can link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseKind {
    /// Initial intake file opened at the counter.
    Intake,
    /// The claim under examination.
    Claim,
    /// Permit delivered once the claim is granted.
    Permit,
}

/// Reference to the business document holding a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRef {
    pub kind: CaseKind,
    pub id: Ulid,
}

/// A bookable time interval at a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub meta: Meta,
    pub site_id: Ulid,
    pub span: Span,
    pub reserved: bool,
    /// Invariant: `Some` iff `reserved`.
    pub case: Option<CaseRef>,
    /// Informational only — carries no weight in booking decisions.
    pub margin: Option<u32>,
}

impl Slot {
    pub fn new(site_id: Ulid, span: Span, margin: Option<u32>) -> Self {
        Self {
            meta: Meta::new(),
            site_id,
            span,
            reserved: false,
            case: None,
            margin,
        }
    }
}

/// Per-site configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub meta: Meta,
    pub name: String,
    /// Default booking lookahead in business days. 0 = unlimited.
    pub max_days_ahead: u32,
}

impl Site {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: Meta::new(),
            name: name.into(),
            max_days_ahead: DEFAULT_MAX_DAYS_AHEAD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    /// The search found no bookable slot at all.
    NoSlots,
    /// The earliest bookable slot is further out than the configured lead time.
    LongLeadTime,
}

impl AlertKind {
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::NoSlots => "no_slots",
            AlertKind::LongLeadTime => "long_lead_time",
        }
    }
}

/// Observational record emitted on booking anomalies. Never blocks a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub meta: Meta,
    pub site_id: Ulid,
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn new(site_id: Ulid, kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            meta: Meta::new(),
            site_id,
            kind,
            message: message.into(),
        }
    }
}

// ── Booking request/result types ─────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct BookingRequest {
    /// Reserve two consecutive slots instead of one.
    pub family: bool,
    /// Search reference instant; `None` means now.
    pub reference_time: Option<Ms>,
    /// Lookahead override in business days; `None` uses the site's value.
    pub max_days_ahead: Option<u32>,
}

/// Outcome of one booking attempt. An empty slot list is a valid outcome
/// (no eligible slot existed), not an error.
#[derive(Debug, Clone)]
pub struct Booking {
    pub site_id: Ulid,
    pub case: CaseRef,
    /// First business-day midnight the search considered.
    pub search_start: Ms,
    /// The reserved slots: empty, one, or two consecutive.
    pub slots: Vec<Slot>,
    pub confirmed: bool,
}

impl Booking {
    pub fn is_satisfied(&self) -> bool {
        !self.slots.is_empty()
    }
}
