use serde::{Deserialize, Serialize};

/// Control message from a frontend surface (popup, CLI, whatever is
/// driving the session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "lowercase")]
pub enum Request {
    Login,
    Logout,
}

/// Acknowledgement for a control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
}
