//! Ordered credential registry for the otpkeep workspace.
//!
//! A secret store guarantees durable records but not their order. This crate
//! keeps the user-facing display order: [`reconcile`](reconcile::reconcile)
//! merges a store snapshot with the persisted reference list into one
//! deterministic, loss-tolerant sequence, and [`CredentialRegistry`] mediates
//! every mutation so the persisted list always matches the sequence.

pub mod reconcile;
pub mod registry;

pub use reconcile::Reconciled;
pub use registry::CredentialRegistry;
