//! Secret store boundary for the otpkeep workspace.
//!
//! A [`SecretStore`] durably holds OTP credential records keyed by an opaque
//! [`PersistentRef`], plus one auxiliary value: the ordered reference list
//! that carries the user-facing display order. Stores make no ordering
//! promise for the records themselves; keeping the list consistent with the
//! record set is the registry's job.

pub mod error;
pub mod file;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{DynSecretStore, SecretStore};
pub use types::{
    CredentialRecord, OtpAlgorithm, OtpKind, OtpPayload, PersistentRef, SecretString,
};
