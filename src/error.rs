use thiserror::Error;

/// Failures of the key-value store backing `loopState` and `preferences`.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage file is not a JSON object")]
    Corrupt,
}

/// Why a cross-context message got no answer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliveryError {
    /// No context is registered for the target (tab closed, never loaded).
    #[error("Could not establish connection. Receiving end does not exist (tab {0})")]
    NoReceiver(u32),

    /// The context existed but its inbox is gone (page unloaded mid-flight).
    #[error("Receiving context was closed")]
    ContextClosed,

    /// The handler dropped the reply channel without answering.
    #[error("The message port closed before a response was received")]
    NoReply,

    #[error("Message could not be encoded: {0}")]
    Encode(String),
}

/// Host page write failures. Reads never fail, they degrade to defaults.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("No element matches {0}")]
    NotFound(String),

    #[error("Element rejected the write: {0}")]
    Rejected(String),
}
