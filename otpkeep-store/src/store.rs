use std::sync::Arc;

use crate::error::Result;
use crate::types::{CredentialRecord, OtpPayload, PersistentRef};

/// Storage interface for credential records and the persisted display order.
///
/// A store guarantees durable storage of records keyed by opaque reference,
/// but not ordering; the reference list is the single auxiliary value that
/// carries the user-facing order, read and rewritten as one unit.
pub trait SecretStore: Send + Sync {
    /// Return a complete, unordered snapshot of all stored records.
    fn enumerate(&self) -> Result<Vec<CredentialRecord>>;

    /// Read the last persisted reference list, or empty if none was written.
    fn read_ref_list(&self) -> Result<Vec<PersistentRef>>;

    /// Atomically overwrite the persisted reference list.
    fn write_ref_list(&self, refs: &[PersistentRef]) -> Result<()>;

    /// Persist a new record and return it with its assigned reference.
    fn create(&self, payload: OtpPayload) -> Result<CredentialRecord>;

    /// Replace the payload of an existing record in place.
    fn update(&self, reference: &PersistentRef, payload: OtpPayload) -> Result<()>;

    /// Remove a record from the store.
    fn delete(&self, reference: &PersistentRef) -> Result<()>;
}

impl<T> SecretStore for Box<T>
where
    T: SecretStore + ?Sized,
{
    fn enumerate(&self) -> Result<Vec<CredentialRecord>> {
        (**self).enumerate()
    }

    fn read_ref_list(&self) -> Result<Vec<PersistentRef>> {
        (**self).read_ref_list()
    }

    fn write_ref_list(&self, refs: &[PersistentRef]) -> Result<()> {
        (**self).write_ref_list(refs)
    }

    fn create(&self, payload: OtpPayload) -> Result<CredentialRecord> {
        (**self).create(payload)
    }

    fn update(&self, reference: &PersistentRef, payload: OtpPayload) -> Result<()> {
        (**self).update(reference, payload)
    }

    fn delete(&self, reference: &PersistentRef) -> Result<()> {
        (**self).delete(reference)
    }
}

impl<T> SecretStore for Arc<T>
where
    T: SecretStore + ?Sized,
{
    fn enumerate(&self) -> Result<Vec<CredentialRecord>> {
        (**self).enumerate()
    }

    fn read_ref_list(&self) -> Result<Vec<PersistentRef>> {
        (**self).read_ref_list()
    }

    fn write_ref_list(&self, refs: &[PersistentRef]) -> Result<()> {
        (**self).write_ref_list(refs)
    }

    fn create(&self, payload: OtpPayload) -> Result<CredentialRecord> {
        (**self).create(payload)
    }

    fn update(&self, reference: &PersistentRef, payload: OtpPayload) -> Result<()> {
        (**self).update(reference, payload)
    }

    fn delete(&self, reference: &PersistentRef) -> Result<()> {
        (**self).delete(reference)
    }
}

pub type DynSecretStore = Arc<dyn SecretStore + Send + Sync>;
