//! Typed inter-agent messages.
//!
//! The message format is shared by every agent on a session's bus:
//! a closed kind set, a normalised content payload, threading fields,
//! and template constructors for the common debate shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// Kinds and priorities
// ============================================================================

/// Message kinds (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    // Debate
    Argument,
    Rebuttal,
    Question,
    Answer,
    Concession,
    // Agent coordination
    Request,
    Response,
    Inform,
    Query,
    Confirm,
    Reject,
    // System
    System,
    Error,
    Status,
    // Evaluation
    Evaluation,
    Score,
    Verdict,
}

/// Message priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for MessagePriority {
    fn default() -> Self {
        Self::Normal
    }
}

// ============================================================================
// Payload
// ============================================================================

/// Normalised message content.
///
/// Every payload carries the same five optional fields; raw strings are
/// wrapped as `{ result }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub thought: Option<Value>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub score: Option<Value>,
}

impl MessagePayload {
    /// Wraps a raw string as a result-only payload.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            result: Some(Value::String(text.into())),
            ..Self::default()
        }
    }

    /// Returns true when the payload carries no content at all.
    pub fn is_empty(&self) -> bool {
        self.role.is_empty()
            && self.thought.is_none()
            && self.action.is_empty()
            && self.result.is_none()
            && self.score.is_none()
    }
}

// ============================================================================
// Message
// ============================================================================

/// A message exchanged between agents on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Opaque message id.
    pub id: String,
    /// Sender agent id.
    pub sender: String,
    /// Receiver agent id; empty means broadcast.
    #[serde(default)]
    pub receiver: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub priority: MessagePriority,
    pub content: MessagePayload,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Debate round this message belongs to (0 outside rounds).
    #[serde(default)]
    pub round: u32,
    pub timestamp: DateTime<Utc>,
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

impl AgentMessage {
    /// Creates a message with defaults for everything but the essentials.
    pub fn new(sender: impl Into<String>, kind: MessageKind, content: MessagePayload) -> Self {
        Self {
            id: new_message_id(),
            sender: sender.into(),
            receiver: String::new(),
            kind,
            priority: MessagePriority::Normal,
            content,
            metadata: BTreeMap::new(),
            reply_to: None,
            thread_id: None,
            round: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = receiver.into();
        self
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }

    pub fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// True when the message is addressed to no one in particular.
    pub fn is_broadcast(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Creates a reply: sender/receiver swapped, `reply_to` set, and the
    /// thread id inherited (or derived from this message's id).
    pub fn create_reply(&self, content: MessagePayload, kind: Option<MessageKind>) -> Self {
        Self {
            id: new_message_id(),
            sender: self.receiver.clone(),
            receiver: self.sender.clone(),
            kind: kind.unwrap_or(MessageKind::Response),
            priority: MessagePriority::Normal,
            content,
            metadata: BTreeMap::new(),
            reply_to: Some(self.id.clone()),
            thread_id: Some(self.thread_id.clone().unwrap_or_else(|| self.id.clone())),
            round: self.round,
            timestamp: Utc::now(),
        }
    }

    // ------------------------------------------------------------------
    // Template constructors
    // ------------------------------------------------------------------

    /// An argument utterance from a debater.
    pub fn argument(sender: impl Into<String>, content: impl Into<String>, round: u32) -> Self {
        Self::new(
            sender,
            MessageKind::Argument,
            MessagePayload {
                role: "debater".to_string(),
                action: "argument".to_string(),
                result: Some(Value::String(content.into())),
                ..MessagePayload::default()
            },
        )
        .with_round(round)
    }

    /// A rebuttal targeting an earlier message.
    pub fn rebuttal(
        sender: impl Into<String>,
        content: impl Into<String>,
        target_message_id: impl Into<String>,
        round: u32,
    ) -> Self {
        Self::new(
            sender,
            MessageKind::Rebuttal,
            MessagePayload {
                role: "debater".to_string(),
                action: "rebuttal".to_string(),
                result: Some(Value::String(content.into())),
                ..MessagePayload::default()
            },
        )
        .with_reply_to(target_message_id)
        .with_round(round)
    }

    /// A round evaluation from the evaluator.
    pub fn evaluation(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        scores: Value,
        commentary: impl Into<String>,
        round: u32,
    ) -> Self {
        Self::new(
            sender,
            MessageKind::Evaluation,
            MessagePayload {
                role: "evaluator".to_string(),
                action: "evaluate".to_string(),
                result: Some(Value::String(commentary.into())),
                score: Some(scores),
                ..MessagePayload::default()
            },
        )
        .with_receiver(receiver)
        .with_round(round)
    }

    /// The final verdict.
    pub fn verdict(
        sender: impl Into<String>,
        winner: impl Into<String>,
        pro_score: u32,
        con_score: u32,
        summary: impl Into<String>,
    ) -> Self {
        let winner: String = winner.into();
        Self::new(
            sender,
            MessageKind::Verdict,
            MessagePayload {
                role: "evaluator".to_string(),
                action: "verdict".to_string(),
                result: Some(Value::String(summary.into())),
                score: Some(serde_json::json!({
                    "winner": winner,
                    "pro_score": pro_score,
                    "con_score": con_score,
                })),
                ..MessagePayload::default()
            },
        )
        .with_priority(MessagePriority::High)
    }

    /// A coordination request from one agent to another.
    pub fn request(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        action: impl Into<String>,
        params: Value,
    ) -> Self {
        Self::new(
            sender,
            MessageKind::Request,
            MessagePayload {
                role: "system".to_string(),
                action: action.into(),
                result: Some(params),
                ..MessagePayload::default()
            },
        )
        .with_receiver(receiver)
    }

    /// A status broadcast.
    pub fn status(sender: impl Into<String>, status: impl Into<String>, details: Value) -> Self {
        let status: String = status.into();
        Self::new(
            sender,
            MessageKind::Status,
            MessagePayload {
                role: "system".to_string(),
                action: "status".to_string(),
                result: Some(serde_json::json!({
                    "status": status,
                    "details": details,
                })),
                ..MessagePayload::default()
            },
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_from_text() {
        let payload = MessagePayload::from_text("hello");
        assert_eq!(payload.result, Some(Value::String("hello".to_string())));
        assert!(payload.role.is_empty());
    }

    #[test]
    fn test_broadcast_detection() {
        let msg = AgentMessage::argument("pro", "claim", 1);
        assert!(msg.is_broadcast());
        let directed = msg.with_receiver("con");
        assert!(!directed.is_broadcast());
    }

    #[test]
    fn test_rebuttal_carries_reply_to() {
        let msg = AgentMessage::rebuttal("con", "no", "msg-1", 2);
        assert_eq!(msg.reply_to.as_deref(), Some("msg-1"));
        assert_eq!(msg.kind, MessageKind::Rebuttal);
        assert_eq!(msg.round, 2);
    }

    #[test]
    fn test_reply_threading() {
        let original = AgentMessage::request("orchestrator", "pro", "speak", Value::Null);
        let reply = original.create_reply(MessagePayload::from_text("done"), None);
        assert_eq!(reply.sender, "pro");
        assert_eq!(reply.receiver, "orchestrator");
        assert_eq!(reply.reply_to.as_deref(), Some(original.id.as_str()));
        assert_eq!(reply.thread_id.as_deref(), Some(original.id.as_str()));

        // A reply to a threaded message inherits the thread.
        let deeper = reply.create_reply(MessagePayload::from_text("ack"), None);
        assert_eq!(deeper.thread_id, reply.thread_id);
    }

    #[test]
    fn test_verdict_template_scores() {
        let msg = AgentMessage::verdict("evaluator", "pro", 70, 62, "pro carried the motion");
        let score = msg.content.score.unwrap();
        assert_eq!(score["winner"], "pro");
        assert_eq!(score["pro_score"], 70);
        assert_eq!(score["con_score"], 62);
        assert_eq!(msg.priority, MessagePriority::High);
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&MessageKind::Rebuttal).unwrap();
        assert_eq!(json, "\"rebuttal\"");
    }
}
