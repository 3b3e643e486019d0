use std::sync::Mutex;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::SecretStore;
use crate::types::{CredentialRecord, OtpPayload, PersistentRef};

/// In-memory store suitable for embedded usage and tests.
///
/// Records enumerate in creation order, which keeps reconciliation of lost
/// records deterministic. References are freshly generated UUID bytes.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    records: Vec<(PersistentRef, OtpPayload)>,
    ref_list: Vec<PersistentRef>,
}

impl MemoryStore {
    /// Construct a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // Every mutation completes before the guard drops, so a poisoned
        // lock still guards consistent state.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SecretStore for MemoryStore {
    fn enumerate(&self) -> Result<Vec<CredentialRecord>> {
        let guard = self.lock();
        Ok(guard
            .records
            .iter()
            .map(|(reference, payload)| {
                CredentialRecord::with_reference(reference.clone(), payload.clone())
            })
            .collect())
    }

    fn read_ref_list(&self) -> Result<Vec<PersistentRef>> {
        Ok(self.lock().ref_list.clone())
    }

    fn write_ref_list(&self, refs: &[PersistentRef]) -> Result<()> {
        self.lock().ref_list = refs.to_vec();
        Ok(())
    }

    fn create(&self, payload: OtpPayload) -> Result<CredentialRecord> {
        let reference = PersistentRef::new(Uuid::new_v4().as_bytes().to_vec());
        let mut guard = self.lock();
        guard.records.push((reference.clone(), payload.clone()));
        Ok(CredentialRecord::with_reference(reference, payload))
    }

    fn update(&self, reference: &PersistentRef, payload: OtpPayload) -> Result<()> {
        let mut guard = self.lock();
        let entry = guard
            .records
            .iter_mut()
            .find(|(stored, _)| stored == reference)
            .ok_or_else(|| Error::NotFound {
                entity: format!("{reference:?}"),
            })?;
        entry.1 = payload;
        Ok(())
    }

    fn delete(&self, reference: &PersistentRef) -> Result<()> {
        let mut guard = self.lock();
        let index = guard
            .records
            .iter()
            .position(|(stored, _)| stored == reference)
            .ok_or_else(|| Error::NotFound {
                entity: format!("{reference:?}"),
            })?;
        guard.records.remove(index);
        Ok(())
    }
}
