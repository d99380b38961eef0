//! Shared types for Permafrost: fingerprints, handles, the streaming hash,
//! and logging setup. Everything else builds on this crate.

pub mod handle;
pub mod hash;
pub mod kind;
pub mod logging;

pub use handle::{Fingerprint, Handle};
pub use hash::Hasher;
pub use kind::ObjectKind;
