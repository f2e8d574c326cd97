//! Errors returned by the cluster gateway.
//!
//! The gateway never interprets a failed call on behalf of its caller; it only
//! separates failures that happened on the way to the cluster (transport) from
//! answers the cluster actually gave (rejections). Whether a failure is worth
//! retrying is decided from that split by [`GatewayError::is_transient`].

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never produced an HTTP answer (connection refused, timeout, DNS ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The cluster answered with a non-success status.
    #[error("cluster rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The cluster answered 2xx but the body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl GatewayError {
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        GatewayError::Rejected {
            status,
            body: body.into(),
        }
    }

    /// `true` for failures that may go away on their own: transport errors,
    /// overloaded nodes (429) and server-side errors (5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Transport(_) => true,
            GatewayError::Rejected { status, .. } => *status == 429 || *status >= 500,
            GatewayError::Malformed(_) => false,
        }
    }
}
