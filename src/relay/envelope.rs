//! EVI server events
//!
//! Every EVI message is a JSON object with a `type` discriminant. Only the
//! variants the relay acts on are modelled; anything else lands in
//! `Unrecognized`.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EviEvent {
    /// Base64 audio chunk of the assistant's voice
    AudioOutput { data: String },
    AssistantMessage,
    UserMessage,
    AssistantEnd,
    UserInterruption,
    Error {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Unrecognized,
}

impl EviEvent {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
