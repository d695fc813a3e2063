//! Prompt text for the LLM-backed endpoints and the realtime "say" event

use serde_json::{json, Value};

pub const SOLUTION_SYSTEM_PROMPT: &str = "You are a solutions consultant at NeuroBiz, an agency that \
builds AI automation (voice agents, chat assistants, workflow integrations) for small and medium \
businesses. Given what a prospect told our sales agent, recommend one concrete solution in at most \
120 words: what we would build, which of their problems it removes, and a realistic first step. \
Plain prose, no lists, no pricing.";

pub const SUMMARY_SYSTEM_PROMPT: &str = "You summarize sales conversations for the NeuroBiz team. \
Write a short summary (at most 6 sentences) of the conversation below: who the prospect is, their \
business, the problems they described, what was offered, and any agreed next step or contact \
details. Do not invent facts that are not in the conversation.";

pub fn solution_prompt(answers: &Value) -> String {
    let profile = match answers {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    format!("Prospect answers:\n{}", profile)
}

/// Realtime client event that makes the assistant speak `text` verbatim
pub fn say_event(text: &str) -> Value {
    json!({
        "type": "response.create",
        "response": {
            "modalities": ["audio", "text"],
            "instructions": format!(
                "Say exactly the following, word for word, and nothing else: {}",
                text
            ),
        }
    })
}
