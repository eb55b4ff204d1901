use crate::domain::action::Action;
use std::fmt;

// Port for the send side of the network adapter, used by request-to-network stages.
pub trait ActionSink: Send + Sync {
    fn send(&self, action: &Action) -> Result<(), SendError>;
}

#[derive(Debug)]
pub enum SendError {
    // Client-local actions (key presses, transport events) never leave the process.
    NotTransmittable(&'static str),
    // Inbound server facts are not echoed back.
    NotClientOrigin(&'static str),
    Encode(serde_json::Error),
    // Outbound queue is full; the action is dropped.
    Full,
    Closed,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::NotTransmittable(kind) => write!(f, "{kind} is client-local"),
            SendError::NotClientOrigin(kind) => write!(f, "{kind} is not a client request"),
            SendError::Encode(e) => write!(f, "failed to encode action: {e}"),
            SendError::Full => f.write_str("outbound queue full"),
            SendError::Closed => f.write_str("outbound queue closed"),
        }
    }
}

impl From<serde_json::Error> for SendError {
    fn from(e: serde_json::Error) -> Self {
        SendError::Encode(e)
    }
}
