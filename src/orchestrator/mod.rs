//! Session orchestrators.
//!
//! Each orchestrator owns its agents, memory and bus by value and
//! drives a deterministic per-round protocol, emitting every observable
//! step on an event channel. The only suspension points are the LLM
//! calls inside the agents.

pub mod debate;
pub mod dialectic;
pub mod events;

pub use debate::{DebateOrchestrator, DebateState};
pub use dialectic::DialecticOrchestrator;
pub use events::{DebateEvent, DialecticEvent};
