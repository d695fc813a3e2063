use super::envelope::EviEvent;
use super::frame::Frame;
use base64::Engine;
use serde_json::json;
use tracing::warn;

/// Outcome of translating one frame
#[derive(Debug, PartialEq, Eq)]
pub enum Translated {
    Forward(Frame),
    Drop(DropReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Not parseable as the expected vendor format
    Malformed(String),
    /// Well-formed envelope of a type the relay does not forward
    Unrecognized,
    /// Frame kind the direction does not carry
    Unsupported(&'static str),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::Malformed(detail) => write!(f, "malformed: {}", detail),
            DropReason::Unrecognized => write!(f, "unrecognized envelope"),
            DropReason::Unsupported(what) => write!(f, "unsupported: {}", what),
        }
    }
}

/// Per-direction payload translation for a relay pair
pub trait Translator: Send {
    fn to_vendor(&mut self, frame: Frame) -> Translated;
    fn to_client(&mut self, frame: Frame) -> Translated;
}

/// Forwards frames unchanged in both directions (speech-to-text)
#[derive(Debug, Default)]
pub struct Passthrough;

impl Translator for Passthrough {
    fn to_vendor(&mut self, frame: Frame) -> Translated {
        Translated::Forward(frame)
    }

    fn to_client(&mut self, frame: Frame) -> Translated {
        Translated::Forward(frame)
    }
}

/// Empathic voice: browser text/audio in, decoded assistant audio out
#[derive(Debug, Default)]
pub struct EviTranslator;

impl Translator for EviTranslator {
    fn to_vendor(&mut self, frame: Frame) -> Translated {
        let envelope = match frame {
            Frame::Text(text) => json!({"type": "user_input", "text": text}),
            Frame::Binary(audio) => json!({
                "type": "audio_input",
                "data": base64::engine::general_purpose::STANDARD.encode(audio),
            }),
        };
        Translated::Forward(Frame::Text(envelope.to_string()))
    }

    fn to_client(&mut self, frame: Frame) -> Translated {
        let text = match frame {
            Frame::Text(text) => text,
            Frame::Binary(_) => return Translated::Drop(DropReason::Unsupported("binary from EVI")),
        };

        match EviEvent::parse(&text) {
            Ok(EviEvent::AudioOutput { data }) => {
                match base64::engine::general_purpose::STANDARD.decode(data.as_bytes()) {
                    Ok(audio) => Translated::Forward(Frame::Binary(audio)),
                    Err(e) => Translated::Drop(DropReason::Malformed(format!("audio data: {}", e))),
                }
            }
            Ok(EviEvent::Error { code, message }) => {
                warn!(
                    "EVI reported error {}: {}",
                    code.as_deref().unwrap_or("-"),
                    message.as_deref().unwrap_or("-")
                );
                Translated::Forward(Frame::Text(text))
            }
            Ok(EviEvent::AssistantMessage)
            | Ok(EviEvent::UserMessage)
            | Ok(EviEvent::AssistantEnd)
            | Ok(EviEvent::UserInterruption) => Translated::Forward(Frame::Text(text)),
            Ok(EviEvent::Unrecognized) => Translated::Drop(DropReason::Unrecognized),
            Err(e) => Translated::Drop(DropReason::Malformed(e.to_string())),
        }
    }
}
