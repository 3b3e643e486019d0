//! Walk through the registry lifecycle against an in-memory store.

use otpkeep_registry::CredentialRegistry;
use otpkeep_store::{MemoryStore, OtpAlgorithm, OtpKind, OtpPayload, SecretString};
use std::sync::Arc;

fn payload(issuer: &str, account: &str) -> OtpPayload {
    OtpPayload {
        issuer: issuer.into(),
        account: account.into(),
        secret: SecretString::from("JBSWY3DPEHPK3PXP"),
        kind: OtpKind::Totp { period: 30 },
        algorithm: OtpAlgorithm::Sha1,
        digits: 6,
    }
}

fn print_order<S: otpkeep_store::SecretStore>(registry: &CredentialRegistry<S>) {
    for (index, record) in registry.iter().enumerate() {
        let payload = record.payload();
        println!("  {index}: {} ({})", payload.account, payload.issuer);
    }
}

fn main() -> otpkeep_store::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let mut registry = CredentialRegistry::load(Arc::clone(&store))?;

    registry.add(payload("github.com", "alice"))?;
    registry.add(payload("mail.example.org", "alice"))?;
    registry.add(payload("bank.example.net", "alice"))?;
    println!("after adds:");
    print_order(&registry);

    registry.move_record(2, 0)?;
    println!("after moving the bank to the top:");
    print_order(&registry);

    // A fresh load sees the same order the store persisted.
    let reloaded = CredentialRegistry::load(store)?;
    println!("after reload:");
    print_order(&reloaded);
    Ok(())
}
