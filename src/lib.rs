//! Appointment-slot reservation engine over a versioned document store.
//!
//! Two cooperating pieces: a typed optimistic-concurrency [`store::Store`]
//! (compare-and-swap on a per-document version counter) and the
//! [`engine::Engine`] that searches for and atomically reserves one or two
//! consecutive free slots at a site, retrying on write conflicts.

pub mod alerts;
pub mod calendar;
pub mod config;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod staffing;
pub mod store;

pub use config::EngineConfig;
pub use engine::{Engine, EngineError, release, reserve};
pub use model::*;
pub use staffing::{FixedStaffing, StaffingDirectory};
pub use store::{Backend, Document, MemoryBackend, Store, StoreError};
