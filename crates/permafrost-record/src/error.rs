use permafrost_core::{Handle, ObjectKind};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("extension chain on {0} is not supported")]
    ExtensionNotSupported(&'static str),

    #[error("{kind} handle {handle} is not registered")]
    NotRegistered { kind: ObjectKind, handle: Handle },

    #[error("recorder is shut down")]
    QueueClosed,

    #[error("archive serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
