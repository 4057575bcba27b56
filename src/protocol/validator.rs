//! Structural validation of agent messages.
//!
//! Checks the invariants the message templates are supposed to uphold,
//! for messages built by hand or deserialized from outside.

use serde_json::Value;

use super::message::{AgentMessage, MessageKind};

/// Validates messages against the communication protocol.
pub struct ProtocolValidator;

impl ProtocolValidator {
    /// Validates a message; `Err` carries the reason.
    pub fn validate(message: &AgentMessage) -> Result<(), String> {
        if message.sender.is_empty() {
            return Err("Missing sender".to_string());
        }
        if message.content.is_empty() {
            return Err("Missing content".to_string());
        }

        match message.kind {
            MessageKind::Rebuttal => {
                if message.reply_to.is_none() {
                    return Err("Rebuttal must have reply_to".to_string());
                }
            }
            MessageKind::Evaluation => {
                if message.content.score.is_none() {
                    return Err("Evaluation must have score".to_string());
                }
            }
            MessageKind::Verdict => {
                let required = ["winner", "pro_score", "con_score"];
                let score = message.content.score.as_ref();
                let missing: Vec<&str> = match score {
                    Some(Value::Object(map)) => required
                        .iter()
                        .filter(|field| !map.contains_key(**field))
                        .copied()
                        .collect(),
                    _ => required.to_vec(),
                };
                if !missing.is_empty() {
                    return Err(format!("Verdict missing fields: {}", missing.join(", ")));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Tuple-shaped variant for callers that report rather than branch.
    pub fn check(message: &AgentMessage) -> (bool, String) {
        match Self::validate(message) {
            Ok(()) => (true, String::new()),
            Err(reason) => (false, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::MessagePayload;

    #[test]
    fn test_valid_argument() {
        let msg = AgentMessage::argument("pro", "claim", 1);
        assert!(ProtocolValidator::validate(&msg).is_ok());
    }

    #[test]
    fn test_missing_sender() {
        let msg = AgentMessage::new("", MessageKind::Inform, MessagePayload::from_text("x"));
        assert_eq!(
            ProtocolValidator::validate(&msg).unwrap_err(),
            "Missing sender"
        );
    }

    #[test]
    fn test_missing_content() {
        let msg = AgentMessage::new("pro", MessageKind::Inform, MessagePayload::default());
        assert_eq!(
            ProtocolValidator::validate(&msg).unwrap_err(),
            "Missing content"
        );
    }

    #[test]
    fn test_rebuttal_requires_reply_to() {
        let mut msg = AgentMessage::rebuttal("pro", "x", "target", 1);
        msg.reply_to = None;
        let (valid, reason) = ProtocolValidator::check(&msg);
        assert!(!valid);
        assert_eq!(reason, "Rebuttal must have reply_to");
    }

    #[test]
    fn test_evaluation_requires_score() {
        let mut msg = AgentMessage::evaluation("evaluator", "", serde_json::json!({}), "c", 1);
        msg.content.score = None;
        assert_eq!(
            ProtocolValidator::validate(&msg).unwrap_err(),
            "Evaluation must have score"
        );
    }

    #[test]
    fn test_verdict_requires_all_score_fields() {
        let mut msg = AgentMessage::verdict("evaluator", "pro", 70, 62, "summary");
        if let Some(Value::Object(map)) = msg.content.score.as_mut() {
            map.remove("con_score");
        }
        let reason = ProtocolValidator::validate(&msg).unwrap_err();
        assert!(reason.contains("con_score"), "got: {reason}");

        msg.content.score = None;
        let reason = ProtocolValidator::validate(&msg).unwrap_err();
        assert!(reason.contains("winner"));
        assert!(reason.contains("pro_score"));
        assert!(reason.contains("con_score"));
    }
}
