//! Recording side of Permafrost.
//!
//! A [`StateRecorder`] accepts create-info descriptions from the application
//! thread, hands them to a background worker that fingerprints and
//! deduplicates them, and writes per-object JSON archives to the capture
//! directory. See the crate-level docs of `permafrost-schema` for the
//! description model.

mod error;
mod hashing;
mod index;
mod recorder;
mod remap;
mod serialize;
mod worker;

pub use error::RecordError;
pub use recorder::{RecorderConfig, StateRecorder};
