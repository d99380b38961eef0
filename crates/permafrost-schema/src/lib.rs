//! Owned mirrors of the GPU API's pipeline-object create-info structs, plus
//! the JSON archive document they serialize into.
//!
//! Every struct here is a plain value: arrays are `Vec`s, strings are owned,
//! binary payloads are byte buffers. Handle-typed fields hold whatever handle
//! space the surrounding code put them in (see [`permafrost_core::Handle`]).

pub mod archive;
pub mod consts;
pub mod create_info;
mod payload;

pub use archive::{StateArchive, FORMAT_VERSION};
pub use create_info::*;
