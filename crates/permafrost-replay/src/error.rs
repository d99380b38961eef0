use permafrost_core::{Fingerprint, ObjectKind};
use permafrost_schema::FORMAT_VERSION;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("malformed archive: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("archive version {found} does not match supported version {FORMAT_VERSION}")]
    VersionMismatch { found: u32 },

    #[error("unresolved {kind} reference {hash}")]
    UnresolvedReference { kind: ObjectKind, hash: Fingerprint },

    #[error("creator failed to create {kind} {hash}")]
    CreateFailed { kind: ObjectKind, hash: Fingerprint },
}
