//! In-process message bus.
//!
//! Single-threaded cooperative pub/sub for one session. Dispatch order
//! for a published message:
//!
//! 1. Append to history unconditionally.
//! 2. Invoke every handler registered for the message's kind.
//! 3. Directed message: invoke only the receiver's subscriber handlers.
//! 4. Broadcast: invoke every subscriber's handlers except the sender's.
//!
//! Handler failures are logged and never interrupt dispatch to other
//! handlers. Within one publish, handlers run in registration order;
//! across publishes, delivery order equals publication order.

use std::collections::HashMap;

use serde_json::Value;

use super::message::{AgentMessage, MessageKind};

/// Handler invoked on message delivery.
///
/// Returning `Err` reports a handler-local failure; the bus logs it and
/// carries on.
pub type MessageHandler = Box<dyn Fn(&AgentMessage) -> Result<(), String> + Send + Sync>;

/// In-process pub/sub with typed messages and full history.
#[derive(Default)]
pub struct MessageBus {
    messages: Vec<AgentMessage>,
    subscribers: HashMap<String, Vec<MessageHandler>>,
    // Registration order matters for dispatch; keep insertion order per kind.
    kind_handlers: Vec<(MessageKind, MessageHandler)>,
    subscriber_order: Vec<String>,
}

/// Filter for [`MessageBus::get_messages`].
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub kind: Option<MessageKind>,
    pub round: Option<u32>,
    pub limit: Option<usize>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes an agent; its handlers fire for directed messages and
    /// for broadcasts from other agents.
    pub fn subscribe(&mut self, agent_id: impl Into<String>, handler: MessageHandler) {
        let agent_id = agent_id.into();
        if !self.subscribers.contains_key(&agent_id) {
            self.subscriber_order.push(agent_id.clone());
        }
        self.subscribers.entry(agent_id).or_default().push(handler);
    }

    /// Removes all of an agent's subscriptions.
    pub fn unsubscribe(&mut self, agent_id: &str) {
        self.subscribers.remove(agent_id);
        self.subscriber_order.retain(|id| id != agent_id);
    }

    /// Registers a handler for every message of a given kind.
    pub fn register_handler(&mut self, kind: MessageKind, handler: MessageHandler) {
        self.kind_handlers.push((kind, handler));
    }

    /// Publishes a message, dispatching per the rules above.
    pub fn publish(&mut self, message: AgentMessage) {
        self.messages.push(message.clone());

        for (kind, handler) in &self.kind_handlers {
            if *kind == message.kind {
                if let Err(reason) = handler(&message) {
                    tracing::warn!(kind = ?message.kind, %reason, "message handler failed");
                }
            }
        }

        if !message.is_broadcast() {
            if let Some(handlers) = self.subscribers.get(&message.receiver) {
                for handler in handlers {
                    if let Err(reason) = handler(&message) {
                        tracing::warn!(
                            receiver = %message.receiver,
                            %reason,
                            "subscriber handler failed"
                        );
                    }
                }
            }
        } else {
            for agent_id in &self.subscriber_order {
                if agent_id == &message.sender {
                    continue;
                }
                if let Some(handlers) = self.subscribers.get(agent_id) {
                    for handler in handlers {
                        if let Err(reason) = handler(&message) {
                            tracing::warn!(
                                subscriber = %agent_id,
                                %reason,
                                "broadcast handler failed"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Returns messages matching the filter, oldest first.
    ///
    /// The receiver filter also matches broadcasts, since those reach
    /// every subscriber.
    pub fn get_messages(&self, filter: &MessageFilter) -> Vec<&AgentMessage> {
        let mut result: Vec<&AgentMessage> = self
            .messages
            .iter()
            .filter(|m| filter.sender.as_deref().map_or(true, |s| m.sender == s))
            .filter(|m| {
                filter
                    .receiver
                    .as_deref()
                    .map_or(true, |r| m.receiver == r || m.is_broadcast())
            })
            .filter(|m| filter.kind.map_or(true, |k| m.kind == k))
            .filter(|m| filter.round.map_or(true, |r| m.round == r))
            .collect();

        if let Some(limit) = filter.limit {
            let start = result.len().saturating_sub(limit);
            result = result.split_off(start);
        }
        result
    }

    /// Returns a conversation thread: the root message plus everything
    /// tagged with its thread id.
    pub fn get_thread(&self, thread_id: &str) -> Vec<&AgentMessage> {
        self.messages
            .iter()
            .filter(|m| m.thread_id.as_deref() == Some(thread_id) || m.id == thread_id)
            .collect()
    }

    /// Returns the directed messages between two agents, either way.
    pub fn get_conversation_between(&self, a: &str, b: &str) -> Vec<&AgentMessage> {
        self.messages
            .iter()
            .filter(|m| {
                (m.sender == a && m.receiver == b) || (m.sender == b && m.receiver == a)
            })
            .collect()
    }

    /// Number of messages in history.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Clears the message history. Subscriptions survive.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Exports the full history as JSON values.
    pub fn export_history(&self) -> Vec<Value> {
        self.messages
            .iter()
            .map(|m| serde_json::to_value(m).unwrap_or(Value::Null))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::MessagePayload;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_handler(counter: Arc<AtomicUsize>) -> MessageHandler {
        Box::new(move |_msg| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_directed_delivery() {
        let mut bus = MessageBus::new();
        let pro = Arc::new(AtomicUsize::new(0));
        let con = Arc::new(AtomicUsize::new(0));
        bus.subscribe("pro", counting_handler(pro.clone()));
        bus.subscribe("con", counting_handler(con.clone()));

        bus.publish(AgentMessage::request("orchestrator", "pro", "speak", Value::Null));

        assert_eq!(pro.load(Ordering::SeqCst), 1);
        assert_eq!(con.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_broadcast_skips_sender() {
        let mut bus = MessageBus::new();
        let pro = Arc::new(AtomicUsize::new(0));
        let con = Arc::new(AtomicUsize::new(0));
        let evaluator = Arc::new(AtomicUsize::new(0));
        bus.subscribe("pro", counting_handler(pro.clone()));
        bus.subscribe("con", counting_handler(con.clone()));
        bus.subscribe("evaluator", counting_handler(evaluator.clone()));

        bus.publish(AgentMessage::argument("pro", "my claim", 1));

        assert_eq!(pro.load(Ordering::SeqCst), 0, "sender must not hear its own broadcast");
        assert_eq!(con.load(Ordering::SeqCst), 1);
        assert_eq!(evaluator.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_kind_handlers_fire_regardless_of_receiver() {
        let mut bus = MessageBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        bus.register_handler(MessageKind::Argument, counting_handler(seen.clone()));

        bus.publish(AgentMessage::argument("pro", "a", 1));
        bus.publish(AgentMessage::status("orchestrator", "setup", Value::Null));

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_error_does_not_stop_dispatch() {
        let mut bus = MessageBus::new();
        let reached = Arc::new(AtomicUsize::new(0));
        bus.subscribe("con", Box::new(|_| Err("boom".to_string())));
        bus.subscribe("con", counting_handler(reached.clone()));

        bus.publish(AgentMessage::argument("pro", "a", 1));

        assert_eq!(reached.load(Ordering::SeqCst), 1);
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_history_always_appended() {
        let mut bus = MessageBus::new();
        bus.publish(AgentMessage::argument("pro", "a", 1));
        bus.publish(AgentMessage::argument("con", "b", 1));
        assert_eq!(bus.len(), 2);
        assert_eq!(bus.export_history().len(), 2);
    }

    #[test]
    fn test_filtered_queries() {
        let mut bus = MessageBus::new();
        bus.publish(AgentMessage::argument("pro", "a1", 1));
        bus.publish(AgentMessage::argument("con", "b1", 1));
        bus.publish(AgentMessage::argument("pro", "a2", 2));
        bus.publish(AgentMessage::status("orchestrator", "round_end", Value::Null));

        let from_pro = bus.get_messages(&MessageFilter {
            sender: Some("pro".to_string()),
            ..MessageFilter::default()
        });
        assert_eq!(from_pro.len(), 2);

        let round_one = bus.get_messages(&MessageFilter {
            round: Some(1),
            kind: Some(MessageKind::Argument),
            ..MessageFilter::default()
        });
        assert_eq!(round_one.len(), 2);

        let limited = bus.get_messages(&MessageFilter {
            limit: Some(1),
            ..MessageFilter::default()
        });
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].kind, MessageKind::Status);
    }

    #[test]
    fn test_thread_and_conversation_queries() {
        let mut bus = MessageBus::new();
        let request = AgentMessage::request("orchestrator", "pro", "speak", Value::Null);
        let reply = request.create_reply(MessagePayload::from_text("done"), None);
        let root_id = request.id.clone();
        bus.publish(request);
        bus.publish(reply);

        assert_eq!(bus.get_thread(&root_id).len(), 2);
        assert_eq!(bus.get_conversation_between("orchestrator", "pro").len(), 2);
        assert!(bus.get_conversation_between("pro", "con").is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = MessageBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        bus.subscribe("con", counting_handler(seen.clone()));
        bus.unsubscribe("con");

        bus.publish(AgentMessage::argument("pro", "a", 1));
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}
