use otpkeep_store::{CredentialRecord, Error, OtpPayload, PersistentRef, Result, SecretStore};
use tracing::{debug, warn};

use crate::reconcile::reconcile;

/// Ordered view over the credential records held by a secret store.
///
/// The registry owns the in-memory sequence and is the only writer to the
/// store's reference list: every structural mutation re-derives the list
/// from the sequence and rewrites it in full, so the persisted order is
/// always exactly the current display order. External readers get shared
/// references and iterators, never a mutable handle.
///
/// All operations are synchronous and take `&mut self` for mutation, which
/// makes the single-writer model a compile-time property. A concurrent port
/// would wrap the whole registry in one mutex; operations are short enough
/// that coarse locking suffices.
pub struct CredentialRegistry<S> {
    store: S,
    records: Vec<CredentialRecord>,
}

impl<S: SecretStore> CredentialRegistry<S> {
    /// Load the registry by reconciling the store snapshot against the
    /// persisted reference list.
    ///
    /// When reconciliation appends lost records, the corrected list is
    /// re-persisted immediately. A failure of that corrective write is
    /// logged and tolerated — the next load reconciles again — but a
    /// failure to read the store is fatal.
    pub fn load(store: S) -> Result<Self> {
        let snapshot = store.enumerate()?;
        let ref_list = store.read_ref_list()?;
        let outcome = reconcile(snapshot, &ref_list);
        debug!(
            records = outcome.records.len(),
            listed = ref_list.len(),
            "loaded credential registry"
        );

        let registry = Self {
            store,
            records: outcome.records,
        };
        if outcome.drift {
            warn!(
                appended = registry.records.len() - ref_list.len(),
                "reference list did not cover the store; appending lost records"
            );
            if let Err(err) = registry.persist_order() {
                warn!(%err, "failed to persist corrected order; will retry on next load");
            }
        }
        Ok(registry)
    }

    /// Number of records in the sequence.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when any record is time-based.
    pub fn has_time_based(&self) -> bool {
        self.records.iter().any(CredentialRecord::is_time_based)
    }

    /// The record at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index >= len()`; callers validate indices against
    /// [`len`](Self::len), as a table view does with its row count.
    pub fn record(&self, index: usize) -> &CredentialRecord {
        &self.records[index]
    }

    /// Non-panicking variant of [`record`](Self::record).
    pub fn get(&self, index: usize) -> Option<&CredentialRecord> {
        self.records.get(index)
    }

    /// Iterate over the sequence in display order.
    pub fn iter(&self) -> impl Iterator<Item = &CredentialRecord> {
        self.records.iter()
    }

    /// Create a record in the store and append it to the sequence.
    ///
    /// The sequence is untouched when the store rejects the create.
    pub fn add(&mut self, payload: OtpPayload) -> Result<()> {
        let record = self.store.create(payload)?;
        debug!(reference = ?record.reference(), "created credential record");
        self.records.push(record);
        self.persist_order()
    }

    /// Move the record at `from` so it sits at `to`, then persist the order.
    ///
    /// The in-memory move is not rolled back when the order write fails;
    /// the divergence heals on the next successful mutation or load.
    ///
    /// # Panics
    ///
    /// Panics when either index is out of range.
    pub fn move_record(&mut self, from: usize, to: usize) -> Result<()> {
        let record = self.records.remove(from);
        self.records.insert(to, record);
        self.persist_order()
    }

    /// Write `record`'s payload through to the store and refresh the cached
    /// copy in the sequence. The display order is unchanged.
    pub fn save(&mut self, record: &CredentialRecord) -> Result<()> {
        let reference = record.reference().ok_or(Error::MissingReference)?;
        self.store.update(reference, record.payload().clone())?;

        if let Some(cached) = self
            .records
            .iter_mut()
            .find(|candidate| candidate.reference() == Some(reference))
        {
            cached.set_payload(record.payload().clone());
        }
        Ok(())
    }

    /// Delete the record at `index` from the store, drop it from the
    /// sequence, and persist the shortened order.
    ///
    /// The sequence is untouched when the record was never persisted or the
    /// store delete fails.
    ///
    /// # Panics
    ///
    /// Panics when `index >= len()`.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        let reference = self.records[index]
            .reference()
            .ok_or(Error::MissingReference)?;
        self.store.delete(reference)?;
        debug!(reference = ?self.records[index].reference(), "deleted credential record");
        self.records.remove(index);
        self.persist_order()
    }

    /// Derive the reference list from the current sequence and write it to
    /// the store as one unit. Records without a reference are skipped.
    pub fn persist_order(&self) -> Result<()> {
        let refs: Vec<PersistentRef> = self
            .records
            .iter()
            .filter_map(|record| record.reference().cloned())
            .collect();
        self.store.write_ref_list(&refs)
    }
}
