use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use otpkeep_registry::CredentialRegistry;
use otpkeep_store::{
    CredentialRecord, Error, MemoryStore, OtpAlgorithm, OtpKind, OtpPayload, PersistentRef,
    Result, SecretStore, SecretString,
};

fn totp_payload(account: &str) -> OtpPayload {
    OtpPayload {
        issuer: "example.org".into(),
        account: account.into(),
        secret: SecretString::from("JBSWY3DPEHPK3PXP"),
        kind: OtpKind::Totp { period: 30 },
        algorithm: OtpAlgorithm::Sha1,
        digits: 6,
    }
}

fn hotp_payload(account: &str) -> OtpPayload {
    OtpPayload {
        kind: OtpKind::Hotp { counter: 0 },
        ..totp_payload(account)
    }
}

fn accounts<S: SecretStore>(registry: &CredentialRegistry<S>) -> Vec<String> {
    registry
        .iter()
        .map(|record| record.payload().account.clone())
        .collect()
}

fn derived_refs<S: SecretStore>(registry: &CredentialRegistry<S>) -> Vec<PersistentRef> {
    registry
        .iter()
        .filter_map(|record| record.reference().cloned())
        .collect()
}

/// Wrapper store that counts order writes and injects failures on demand.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_create: AtomicBool,
    fail_order_write: AtomicBool,
    order_writes: AtomicUsize,
}

impl FlakyStore {
    fn order_write_count(&self) -> usize {
        self.order_writes.load(Ordering::SeqCst)
    }
}

impl SecretStore for FlakyStore {
    fn enumerate(&self) -> Result<Vec<CredentialRecord>> {
        self.inner.enumerate()
    }

    fn read_ref_list(&self) -> Result<Vec<PersistentRef>> {
        self.inner.read_ref_list()
    }

    fn write_ref_list(&self, refs: &[PersistentRef]) -> Result<()> {
        if self.fail_order_write.load(Ordering::SeqCst) {
            return Err(Error::Storage("injected order write failure".into()));
        }
        self.order_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_ref_list(refs)
    }

    fn create(&self, payload: OtpPayload) -> Result<CredentialRecord> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::Storage("injected create failure".into()));
        }
        self.inner.create(payload)
    }

    fn update(&self, reference: &PersistentRef, payload: OtpPayload) -> Result<()> {
        self.inner.update(reference, payload)
    }

    fn delete(&self, reference: &PersistentRef) -> Result<()> {
        self.inner.delete(reference)
    }
}

/// Store whose snapshot includes a record that was never persisted.
struct UnsavedRecordStore {
    inner: MemoryStore,
}

impl SecretStore for UnsavedRecordStore {
    fn enumerate(&self) -> Result<Vec<CredentialRecord>> {
        let mut records = self.inner.enumerate()?;
        records.push(CredentialRecord::new(totp_payload("unsaved")));
        Ok(records)
    }

    fn read_ref_list(&self) -> Result<Vec<PersistentRef>> {
        self.inner.read_ref_list()
    }

    fn write_ref_list(&self, refs: &[PersistentRef]) -> Result<()> {
        self.inner.write_ref_list(refs)
    }

    fn create(&self, payload: OtpPayload) -> Result<CredentialRecord> {
        self.inner.create(payload)
    }

    fn update(&self, reference: &PersistentRef, payload: OtpPayload) -> Result<()> {
        self.inner.update(reference, payload)
    }

    fn delete(&self, reference: &PersistentRef) -> Result<()> {
        self.inner.delete(reference)
    }
}

#[test]
fn empty_store_scenario_walkthrough() {
    let store = Arc::new(MemoryStore::new());
    let mut registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");
    assert_eq!(registry.len(), 0);
    assert!(registry.is_empty());

    registry.add(totp_payload("p1")).expect("add p1");
    assert_eq!(registry.len(), 1);
    assert_eq!(store.read_ref_list().expect("read"), derived_refs(&registry));

    registry.add(totp_payload("p2")).expect("add p2");
    registry.move_record(1, 0).expect("move");
    assert_eq!(accounts(&registry), ["p2", "p1"]);
    assert_eq!(store.read_ref_list().expect("read"), derived_refs(&registry));

    registry.remove(0).expect("remove p2");
    assert_eq!(accounts(&registry), ["p1"]);
    assert_eq!(store.read_ref_list().expect("read"), derived_refs(&registry));

    let remaining = store.enumerate().expect("enumerate");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].payload().account, "p1");
}

#[test]
fn persisted_list_tracks_every_mutation() {
    let store = Arc::new(MemoryStore::new());
    let mut registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");

    for name in ["a", "b", "c", "d"] {
        registry.add(totp_payload(name)).expect("add");
        assert_eq!(store.read_ref_list().expect("read"), derived_refs(&registry));
    }
    registry.move_record(3, 0).expect("move");
    assert_eq!(store.read_ref_list().expect("read"), derived_refs(&registry));

    registry.remove(2).expect("remove");
    assert_eq!(store.read_ref_list().expect("read"), derived_refs(&registry));
}

#[test]
fn move_relocates_one_element_and_keeps_relative_order() {
    let n = 4;
    for from in 0..n {
        for to in 0..n {
            let store = Arc::new(MemoryStore::new());
            let mut registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");
            let names = ["a", "b", "c", "d"];
            for name in names {
                registry.add(totp_payload(name)).expect("add");
            }

            registry.move_record(from, to).expect("move");
            assert_eq!(registry.len(), n);

            let mut expected: Vec<&str> = names.to_vec();
            let moved = expected.remove(from);
            expected.insert(to, moved);
            assert_eq!(accounts(&registry), expected, "move({from}, {to})");
        }
    }
}

#[test]
fn add_then_remove_restores_sequence_and_list() {
    let store = Arc::new(MemoryStore::new());
    let mut registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");
    registry.add(totp_payload("a")).expect("add a");
    registry.add(totp_payload("b")).expect("add b");

    let before_accounts = accounts(&registry);
    let before_list = store.read_ref_list().expect("read");

    registry.add(totp_payload("extra")).expect("add extra");
    let index = accounts(&registry)
        .iter()
        .position(|name| name == "extra")
        .expect("extra present");
    registry.remove(index).expect("remove extra");

    assert_eq!(accounts(&registry), before_accounts);
    assert_eq!(store.read_ref_list().expect("read"), before_list);
}

#[test]
fn load_recovers_lost_records_and_repersists() {
    let store = Arc::new(MemoryStore::new());
    let mut created = Vec::new();
    for name in ["r1", "r2", "r3", "r4", "r5"] {
        created.push(store.create(totp_payload(name)).expect("create"));
    }
    // Persist an order that only covers two of the five records.
    let partial = vec![
        created[1].reference().expect("ref").clone(),
        created[3].reference().expect("ref").clone(),
    ];
    store.write_ref_list(&partial).expect("write");

    let registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");
    assert_eq!(accounts(&registry), ["r2", "r4", "r1", "r3", "r5"]);

    // The corrected order was written back durably.
    assert_eq!(store.read_ref_list().expect("read"), derived_refs(&registry));
    assert_eq!(store.read_ref_list().expect("read").len(), 5);
}

#[test]
fn load_with_matching_list_does_not_rewrite_it() {
    let store = Arc::new(FlakyStore::default());
    let mut registry = CredentialRegistry::load(Arc::clone(&store)).expect("initial load");
    registry.add(totp_payload("a")).expect("add");
    registry.add(totp_payload("b")).expect("add");
    let writes_after_setup = store.order_write_count();

    let reloaded = CredentialRegistry::load(Arc::clone(&store)).expect("reload");
    assert_eq!(accounts(&reloaded), ["a", "b"]);
    assert_eq!(store.order_write_count(), writes_after_setup);
}

#[test]
fn load_drops_stale_references_silently() {
    let store = Arc::new(MemoryStore::new());
    let kept = store.create(totp_payload("kept")).expect("create");
    let stale = PersistentRef::new(vec![0xff; 16]);
    store
        .write_ref_list(&[kept.reference().expect("ref").clone(), stale])
        .expect("write");

    let registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");
    assert_eq!(accounts(&registry), ["kept"]);
}

#[test]
fn failed_create_leaves_sequence_and_list_untouched() {
    let store = Arc::new(FlakyStore::default());
    let mut registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");
    registry.add(totp_payload("a")).expect("add");
    let list_before = store.read_ref_list().expect("read");

    store.fail_create.store(true, Ordering::SeqCst);
    let err = registry.add(totp_payload("b")).expect_err("injected failure");
    assert!(matches!(err, Error::Storage(_)));
    assert_eq!(registry.len(), 1);
    assert_eq!(store.read_ref_list().expect("read"), list_before);
}

#[test]
fn move_survives_order_write_failure_until_next_persist() {
    let store = Arc::new(FlakyStore::default());
    let mut registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");
    registry.add(totp_payload("a")).expect("add");
    registry.add(totp_payload("b")).expect("add");

    store.fail_order_write.store(true, Ordering::SeqCst);
    let err = registry.move_record(1, 0).expect_err("injected failure");
    assert!(matches!(err, Error::Storage(_)));

    // The in-memory move stands; the persisted list is temporarily stale.
    assert_eq!(accounts(&registry), ["b", "a"]);
    assert_ne!(store.read_ref_list().expect("read"), derived_refs(&registry));

    // The next successful write heals the divergence.
    store.fail_order_write.store(false, Ordering::SeqCst);
    registry.persist_order().expect("persist");
    assert_eq!(store.read_ref_list().expect("read"), derived_refs(&registry));
}

#[test]
fn save_updates_store_and_cached_copy() {
    let store = Arc::new(FlakyStore::default());
    let mut registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");
    registry.add(totp_payload("alice")).expect("add");
    let writes_before = store.order_write_count();

    let mut edited = registry.record(0).clone();
    edited.set_payload(totp_payload("alice@renamed"));
    registry.save(&edited).expect("save");

    assert_eq!(registry.record(0).payload().account, "alice@renamed");
    let stored = store.enumerate().expect("enumerate");
    assert_eq!(stored[0].payload().account, "alice@renamed");

    // Saving edits a record in place; the order is untouched.
    assert_eq!(store.order_write_count(), writes_before);
}

#[test]
fn save_without_reference_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let mut registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");
    let unsaved = CredentialRecord::new(totp_payload("ghost"));
    assert_eq!(
        registry.save(&unsaved).expect_err("no reference"),
        Error::MissingReference
    );
}

#[test]
fn remove_without_reference_leaves_sequence_untouched() {
    let store = UnsavedRecordStore {
        inner: MemoryStore::new(),
    };
    store.inner.create(totp_payload("saved")).expect("create");

    let mut registry = CredentialRegistry::load(store).expect("load");
    assert_eq!(accounts(&registry), ["saved", "unsaved"]);

    assert_eq!(
        registry.remove(1).expect_err("no reference"),
        Error::MissingReference
    );
    assert_eq!(registry.len(), 2);
}

#[test]
fn has_time_based_reflects_record_kinds() {
    let store = Arc::new(MemoryStore::new());
    let mut registry = CredentialRegistry::load(Arc::clone(&store)).expect("load");
    assert!(!registry.has_time_based());

    registry.add(hotp_payload("counter")).expect("add hotp");
    assert!(!registry.has_time_based());

    registry.add(totp_payload("timer")).expect("add totp");
    assert!(registry.has_time_based());

    registry.remove(1).expect("remove totp");
    assert!(!registry.has_time_based());
}
