use ulid::Ulid;

use crate::model::{CaseRef, Slot};

use super::{Engine, EngineError};

/// Mark `slot` reserved for `case`. Pure in-memory mutation — the caller must
/// still persist the slot through the store.
pub fn reserve(slot: &mut Slot, case: CaseRef) -> Result<(), EngineError> {
    if slot.reserved {
        return Err(EngineError::AlreadyReserved(slot.meta.id));
    }
    slot.reserved = true;
    slot.case = Some(case);
    Ok(())
}

/// Clear a reservation. Pure in-memory mutation — the caller must still
/// persist the slot through the store.
pub fn release(slot: &mut Slot) -> Result<(), EngineError> {
    if !slot.reserved {
        return Err(EngineError::AlreadyReleased(slot.meta.id));
    }
    slot.reserved = false;
    slot.case = None;
    Ok(())
}

impl Engine {
    /// Reserve exactly the listed slots, in order, conditionally saving each.
    /// All-or-nothing in intent: if any step fails, every slot already
    /// reserved by this call is released again, then the triggering error is
    /// re-raised.
    pub async fn reserve_all(
        &self,
        slot_ids: &[Ulid],
        case: CaseRef,
    ) -> Result<Vec<Slot>, EngineError> {
        let mut held: Vec<Slot> = Vec::with_capacity(slot_ids.len());
        for &id in slot_ids {
            match self.reserve_one(id, case).await {
                Ok(slot) => held.push(slot),
                Err(e) => {
                    self.release_held(&held).await;
                    return Err(e);
                }
            }
        }
        Ok(held)
    }

    async fn reserve_one(&self, id: Ulid, case: CaseRef) -> Result<Slot, EngineError> {
        let mut slot: Slot = self.store.get(id).await?;
        reserve(&mut slot, case)?;
        let expected = slot.meta.version;
        self.store.save(&mut slot, Some(expected)).await?;
        Ok(slot)
    }
}
