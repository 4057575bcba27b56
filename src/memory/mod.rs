//! Session memories: the debate transcript, the dialectic record, and
//! the argument graph derived from a completed transcript.

pub mod dialectic;
pub mod graph;
pub mod shared;

pub use dialectic::{
    DialecticMemory, DialecticRoundRecord, EvolutionTree, TreeEdge, TreeNode, TreeNodeKind,
};
pub use graph::{
    extract_key_points, ArgumentAnalyzer, ArgumentEdge, ArgumentGraph, ArgumentNode,
    ArgumentStrength, ArgumentType, DebateScore, RelationKind,
};
pub use shared::{
    ArgumentRecord, DebateMemory, DebateMemoryEvent, DebateStatus, MemoryStandings,
};
