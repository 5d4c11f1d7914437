use async_trait::async_trait;
use ulid::Ulid;

use crate::engine::EngineError;

/// Staffing lookup, consumed only by schedule generation: a site cannot run
/// more parallel desks than it has assigned staff.
#[async_trait]
pub trait StaffingDirectory: Send + Sync + 'static {
    async fn assigned_staff(&self, site_id: Ulid) -> Result<u32, EngineError>;
}

/// Constant staffing, for standalone deployments and tests.
pub struct FixedStaffing(pub u32);

#[async_trait]
impl StaffingDirectory for FixedStaffing {
    async fn assigned_staff(&self, _site_id: Ulid) -> Result<u32, EngineError> {
        Ok(self.0)
    }
}
