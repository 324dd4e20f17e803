use thiserror::Error;

/// Failure talking to the chat-completion endpoint.
#[derive(Debug, Error)]
pub enum LlmError {
    /// DNS, connect, TLS or timeout failure. Never retried.
    #[error("AI service unreachable: {0}")]
    Unreachable(String),

    #[error("AI service unavailable (HTTP {status}): {body}")]
    Unavailable { status: u16, body: String },

    #[error("AI request failed (HTTP {status}): {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Unexpected AI response: {reason}")]
    MalformedResponse { reason: String, body: String },
}

impl LlmError {
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Unavailable { status, .. } | LlmError::RequestFailed { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
