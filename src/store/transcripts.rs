//! Per-conversation transcripts, one JSON file per conversation id.
//!
//! Turns are append-only. Conversation-level fields (`finished`,
//! `finishedAt`, anything else the caller cares about) are patched by
//! shallow merge. Every mutation is a locked read-modify-write followed by
//! an atomic replace of the whole file.

use super::documents::DocumentDir;
use super::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, error, warn};

/// Fields a patch may never overwrite
const PROTECTED_FIELDS: &[&str] = &["id", "created", "turns"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

/// Conversation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Intro,
    Collect,
    Closing,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Voice,
    Chat,
}

/// One message or event in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    /// Assigned by the store on append
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<DateTime<Utc>>,

    /// Free-form extras such as `solutionText` or `cta`, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Turn {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            text: None,
            phase: None,
            mode: None,
            ts: None,
            extra: Map::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn is_ending(&self) -> bool {
        self.phase == Some(Phase::Ended)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub id: String,

    pub created: DateTime<Utc>,

    #[serde(default)]
    pub turns: Vec<Turn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Conversation-level fields set by patches
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transcript {
    pub fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            created: Utc::now(),
            turns: Vec::new(),
            finished: None,
            finished_at: None,
            extra: Map::new(),
        }
    }

    /// Shallow-merge `patch` into the conversation-level fields
    pub fn merge(self, patch: &Map<String, Value>) -> StoreResult<Self> {
        let mut value = serde_json::to_value(&self)?;

        if let Value::Object(fields) = &mut value {
            for (key, v) in patch {
                if PROTECTED_FIELDS.contains(&key.as_str()) {
                    debug!("Ignoring patch of protected field {} on {}", key, self.id);
                    continue;
                }
                fields.insert(key.clone(), v.clone());
            }
        }

        serde_json::from_value(value).map_err(|e| StoreError::InvalidPatch(e.to_string()))
    }

    /// `<role>: <text>` lines for turns that carry text
    pub fn render_dialogue(&self) -> String {
        self.turns
            .iter()
            .filter_map(|turn| {
                let text = turn.text.as_deref()?.trim();
                if text.is_empty() {
                    return None;
                }
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                    Role::System => "system",
                };
                Some(format!("{}: {}", role, text))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The patch that marks a conversation as finished
pub fn finished_patch(at: DateTime<Utc>) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("finished".to_string(), Value::Bool(true));
    patch.insert("finishedAt".to_string(), Value::String(at.to_rfc3339()));
    patch
}

/// Listing entry for the admin panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSummary {
    pub id: String,
    pub created: DateTime<Utc>,
    pub turn_count: usize,
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_text: Option<String>,
}

impl From<&Transcript> for TranscriptSummary {
    fn from(t: &Transcript) -> Self {
        Self {
            id: t.id.clone(),
            created: t.created,
            turn_count: t.turns.len(),
            finished: t.finished.unwrap_or(false),
            finished_at: t.finished_at,
            last_text: t.turns.iter().rev().find_map(|turn| turn.text.clone()),
        }
    }
}

#[derive(Debug)]
pub struct TranscriptStore {
    docs: DocumentDir,
}

impl TranscriptStore {
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        Ok(Self {
            docs: DocumentDir::open(dir).await?,
        })
    }

    pub fn dir(&self) -> &std::path::Path {
        self.docs.root()
    }

    /// Append `turn` with a server-assigned `ts`, creating the transcript if needed
    pub async fn append_turn(&self, id: &str, mut turn: Turn) -> StoreResult<()> {
        DocumentDir::validate_key(id)?;
        let _guard = self.docs.lock(id).await;

        let mut transcript = self.load_for_write(id).await?;
        turn.ts = Some(Utc::now());
        transcript.turns.push(turn);

        self.docs.write(id, &transcript).await?;
        debug!("Appended turn {} to {}", transcript.turns.len(), id);
        Ok(())
    }

    /// Shallow-merge `patch` into the transcript, creating it if needed
    pub async fn update_conversation(&self, id: &str, patch: &Map<String, Value>) -> StoreResult<()> {
        DocumentDir::validate_key(id)?;
        let _guard = self.docs.lock(id).await;

        let transcript = self.load_for_write(id).await?.merge(patch)?;
        self.docs.write(id, &transcript).await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Transcript>> {
        self.docs.read(id).await
    }

    /// Summaries, newest first. Unreadable files are skipped with a warning.
    pub async fn list(&self) -> StoreResult<Vec<TranscriptSummary>> {
        let mut summaries = Vec::new();

        for key in self.docs.keys().await? {
            match self.docs.read::<Transcript>(&key).await {
                Ok(Some(t)) => summaries.push(TranscriptSummary::from(&t)),
                Ok(None) => {}
                Err(e) => warn!("Skipping transcript {}: {}", key, e),
            }
        }

        summaries.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        DocumentDir::validate_key(id)?;
        let _guard = self.docs.lock(id).await;
        self.docs.remove(id).await
    }

    /// Current transcript, a fresh one if absent, or a fresh one after
    /// quarantining an unreadable file. Caller holds the key lock.
    async fn load_for_write(&self, id: &str) -> StoreResult<Transcript> {
        match self.docs.read::<Transcript>(id).await {
            Ok(Some(t)) => Ok(t),
            Ok(None) => Ok(Transcript::empty(id)),
            Err(StoreError::Corrupt { source, .. }) => {
                error!("Transcript {} is unreadable ({}), starting fresh", id, source);
                self.docs.quarantine(id).await?;
                Ok(Transcript::empty(id))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn turn_keeps_extra_fields() {
        let turn: Turn = serde_json::from_value(json!({
            "role": "tool",
            "text": "recommendation ready",
            "solutionText": "Automate lead intake",
            "cta": {"label": "Book a call"}
        }))
        .unwrap();

        assert_eq!(turn.role, Role::Tool);
        assert_eq!(turn.extra["solutionText"], "Automate lead intake");

        let back = serde_json::to_value(&turn).unwrap();
        assert_eq!(back["cta"]["label"], "Book a call");
        assert!(back.get("ts").is_none());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed = serde_json::from_value::<Turn>(json!({"role": "narrator"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn merge_protects_structural_fields() {
        let mut t = Transcript::empty("c1");
        t.turns.push(Turn::new(Role::User).with_text("hi"));
        let created = t.created;

        let patch = json!({
            "id": "other",
            "turns": [],
            "created": "2000-01-01T00:00:00Z",
            "finished": true,
            "leadScore": 7
        });
        let merged = t.merge(patch.as_object().unwrap()).unwrap();

        assert_eq!(merged.id, "c1");
        assert_eq!(merged.created, created);
        assert_eq!(merged.turns.len(), 1);
        assert_eq!(merged.finished, Some(true));
        assert_eq!(merged.extra["leadScore"], 7);
    }

    #[test]
    fn merge_rejects_ill_typed_fields() {
        let patch = json!({"finishedAt": "yesterday"});
        let err = Transcript::empty("c1")
            .merge(patch.as_object().unwrap())
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPatch(_)));
    }

    #[test]
    fn dialogue_skips_textless_turns() {
        let mut t = Transcript::empty("c1");
        t.turns.push(Turn::new(Role::User).with_text("I run a clinic"));
        t.turns.push(Turn::new(Role::Tool));
        t.turns.push(Turn::new(Role::Assistant).with_text("  Great!  "));

        assert_eq!(t.render_dialogue(), "user: I run a clinic\nassistant: Great!");
    }
}
