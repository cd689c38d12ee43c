//! Agents, delegation edges and the immutable agent graph.

pub mod definition;
pub mod graph;
pub mod handoff;
pub mod prompts;

pub use definition::{Agent, AgentRole};
pub use graph::{default_graph, AgentGraph, AgentGraphBuilder, DelegationPhase};
pub use handoff::{Handoff, HandoffOptions, InputFilter};
