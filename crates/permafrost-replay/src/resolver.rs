//! Lazy cross-archive reference resolution.

use std::path::PathBuf;

use permafrost_core::Fingerprint;
use tracing::debug;

/// Hands the replayer the raw bytes of another archive on demand.
///
/// `None` (or empty bytes) signals "not found" and surfaces as
/// [`ReplayError::UnresolvedReference`](crate::ReplayError::UnresolvedReference).
pub trait ArchiveResolver {
    fn resolve(&mut self, hash: Fingerprint) -> Option<Vec<u8>>;
}

/// Resolves fingerprints against a capture directory laid out the way the
/// recorder writes it: one `<HEX16>.json` file per object.
pub struct DirectoryResolver {
    dir: PathBuf,
}

impl DirectoryResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArchiveResolver for DirectoryResolver {
    fn resolve(&mut self, hash: Fingerprint) -> Option<Vec<u8>> {
        let path = self.dir.join(format!("{hash}.json"));
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!("could not resolve {hash} from {}: {e}", path.display());
                None
            }
        }
    }
}
