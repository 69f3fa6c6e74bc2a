pub mod ollama;
pub mod stt;

use serde::{Deserialize, Serialize};

/// A reply from a model, with enough metadata to display or log its origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiReply {
    pub content: String,
    pub model: String,
    pub timestamp: String,
}
