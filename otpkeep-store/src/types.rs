use core::fmt;
use core::ops::Deref;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Opaque, stable identifier a store assigns to a record on create.
///
/// The byte content is meaningful only to the store that issued it; the
/// registry treats it as an equality-comparable token for correlating a
/// record across the store and the persisted reference list.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersistentRef(Vec<u8>);

impl PersistentRef {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PersistentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PersistentRef(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

impl From<Vec<u8>> for PersistentRef {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Wrapper around secret material that zeroizes its memory on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl Deref for SecretString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

/// Kind of one-time password a credential produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpKind {
    /// Counter-based (HOTP); the moving factor advances on use.
    Hotp { counter: u64 },
    /// Time-based (TOTP); codes rotate every `period` seconds.
    Totp { period: u16 },
}

impl OtpKind {
    pub fn is_time_based(&self) -> bool {
        matches!(self, OtpKind::Totp { .. })
    }
}

/// Hashing algorithm the credential was provisioned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

/// Configuration payload for one OTP credential.
///
/// Opaque to the registry apart from `kind`, which feeds aggregate queries.
/// Code generation from this payload lives outside this workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpPayload {
    pub issuer: String,
    pub account: String,
    pub secret: SecretString,
    pub kind: OtpKind,
    pub algorithm: OtpAlgorithm,
    pub digits: u8,
}

/// One credential as held by the registry: the payload plus the reference
/// the store assigned to it, absent until the record is first saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    reference: Option<PersistentRef>,
    payload: OtpPayload,
}

impl CredentialRecord {
    /// A record that has not been persisted yet.
    pub fn new(payload: OtpPayload) -> Self {
        Self {
            reference: None,
            payload,
        }
    }

    /// A record as returned by a store, carrying its assigned reference.
    pub fn with_reference(reference: PersistentRef, payload: OtpPayload) -> Self {
        Self {
            reference: Some(reference),
            payload,
        }
    }

    pub fn reference(&self) -> Option<&PersistentRef> {
        self.reference.as_ref()
    }

    pub fn payload(&self) -> &OtpPayload {
        &self.payload
    }

    pub fn is_time_based(&self) -> bool {
        self.payload.kind.is_time_based()
    }

    /// Replace the payload in place, keeping the reference. Used by the
    /// registry to refresh its cached copy after a successful store update.
    pub fn set_payload(&mut self, payload: OtpPayload) {
        self.payload = payload;
    }
}
