//! Agent communication protocol.
//!
//! Typed messages, the per-session message bus, and the structural
//! validator that keeps both honest.

pub mod bus;
pub mod message;
pub mod validator;

pub use bus::{MessageBus, MessageFilter, MessageHandler};
pub use message::{AgentMessage, MessageKind, MessagePayload, MessagePriority};
pub use validator::ProtocolValidator;
