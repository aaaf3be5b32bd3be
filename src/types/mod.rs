pub mod startup;
pub mod user;

use serde::{Deserialize, Serialize};

/// `{"message": ...}` acknowledgement used by the write routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
