//! Replaying side of Permafrost.
//!
//! A [`StateReplayer`] parses archives produced by the recorder and drives a
//! [`StateCreator`] in dependency order so every object can be wired to the
//! driver handles of its referents. Cross-archive references (shader modules,
//! base pipelines) are fetched lazily through an [`ArchiveResolver`].

mod creator;
mod error;
mod replayer;
mod resolver;

pub use creator::StateCreator;
pub use error::ReplayError;
pub use replayer::StateReplayer;
pub use resolver::{ArchiveResolver, DirectoryResolver};
