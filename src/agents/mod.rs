//! Multi-agent system for structured debates.
//!
//! The agent runtime (`base`) defines the observe/think/act contract;
//! the concrete agents build on it: two opposing debaters, a neutral
//! evaluator, and the dialectic trio (thesis, antithesis, observer).

pub mod base;
pub mod debater;
pub mod dialectic;
pub mod error;
pub mod evaluator;

pub use base::{
    confidence_from, extract_json, parse_json_or, Agent, AgentCore, AgentState, MemoryEvent,
    ThinkResult,
};
pub use debater::{
    DebateTurnContext, DebaterAgent, DebaterStreamEvent, HistoryEntry, Side, Strategy,
};
pub use dialectic::{
    AntithesisAgent, AntithesisContext, DialecticHistoryEntry, Fallacy, ObserverAgent, Severity,
    SynthesisResult, ThesisAgent, ThesisContext, SYNTHESIS_FALLBACK,
};
pub use error::{AgentError, AgentResult};
pub use evaluator::{
    EvaluatorAgent, FinalVerdict, Margin, RoundEvaluation, RoundScore, Standings, Suggestions,
    Winner,
};
