//! Failure taxonomy of the host bridge.
//!
//! Accessors never hand these to their callers: every failure is terminal at
//! the point where it occurs and is only logged. The pass-through host API
//! calls on [`crate::bridge::Bridge`] are the exception and return them.

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// No host global object is attached (standalone preview, tests).
    #[error("host is not attached")]
    HostAbsent,

    /// The host object exists but does not expose `setWidgetState`.
    #[error("setWidgetState is not available on the host")]
    SetterUnavailable,

    /// The host rejected an asynchronous `setWidgetState` write.
    #[error("host rejected the widget state write: {0}")]
    PersistenceRejected(String),

    /// A host API call (display mode, tool call, follow-up) failed.
    #[error("host rejected the request: {0}")]
    HostRejected(String),

    /// A widget state write resolved to an empty value.
    #[error("widget state write resolved to null")]
    NullWritePayload,

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    pub fn rejected(err: anyhow::Error) -> Self {
        BridgeError::PersistenceRejected(format!("{err:#}"))
    }

    pub fn host_rejected(err: anyhow::Error) -> Self {
        BridgeError::HostRejected(format!("{err:#}"))
    }
}
