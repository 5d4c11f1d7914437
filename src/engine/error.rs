use ulid::Ulid;

use crate::store::StoreError;

#[derive(Debug)]
pub enum EngineError {
    Store(StoreError),
    AlreadyReserved(Ulid),
    AlreadyReleased(Ulid),
    Validation(&'static str),
}

impl EngineError {
    /// True for the one failure the booking loops are allowed to retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_conflict())
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Store(e) => write!(f, "{e}"),
            EngineError::AlreadyReserved(id) => write!(f, "slot already reserved: {id}"),
            EngineError::AlreadyReleased(id) => write!(f, "slot already free: {id}"),
            EngineError::Validation(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e)
    }
}
