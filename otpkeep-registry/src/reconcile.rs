use std::collections::HashMap;

use otpkeep_store::{CredentialRecord, PersistentRef};

/// Outcome of merging a store snapshot with the persisted reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// The merged, ordered sequence.
    pub records: Vec<CredentialRecord>,
    /// True when at least one lost record was appended, meaning the
    /// persisted list no longer covers the store and must be rewritten.
    pub drift: bool,
}

/// Merge an unordered record snapshot with a possibly stale reference list.
///
/// Records whose reference appears in `ref_list` come first, in list order.
/// Records the list does not cover — including records with no reference at
/// all — are appended afterwards, preserving their relative order in the
/// snapshot. References with no matching record are dropped silently; they
/// belong to records deleted externally.
pub fn reconcile(records: Vec<CredentialRecord>, ref_list: &[PersistentRef]) -> Reconciled {
    // Index the snapshot by reference so each list entry resolves in O(1).
    // Duplicate references cannot occur in a well-formed store; if one did,
    // the later record would simply stay in the unmatched pool.
    let mut by_ref: HashMap<PersistentRef, usize> = HashMap::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if let Some(reference) = record.reference() {
            by_ref.entry(reference.clone()).or_insert(index);
        }
    }

    let mut pool: Vec<Option<CredentialRecord>> = records.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(pool.len());

    for reference in ref_list {
        if let Some(&index) = by_ref.get(reference) {
            if let Some(record) = pool[index].take() {
                ordered.push(record);
            }
        }
    }

    // Whatever the list did not claim goes to the tail, in snapshot order.
    for slot in pool {
        if let Some(record) = slot {
            ordered.push(record);
        }
    }

    let drift = ordered.len() > ref_list.len();
    Reconciled {
        records: ordered,
        drift,
    }
}
