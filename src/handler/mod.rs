use serde::{Deserialize, Serialize};

pub mod middleware;
pub mod tts;
pub use tts::router;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TtsRequest {
    pub text: String,
    /// Voice identifier; the configured default is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Speaker index within a multi-speaker model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<u32>,
}
