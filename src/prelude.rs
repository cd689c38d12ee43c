//! Convenience re-exports for common use.

pub use crate::agent::{default_graph, Agent, AgentGraph, AgentRole, HandoffOptions, InputFilter};
pub use crate::config::{ChatConfig, ConfigStore, ConfigUpdate};
pub use crate::context::SessionContext;
pub use crate::error::{ErrorKind, ParleyError, Result, TurnError};
pub use crate::provider::{ModelProvider, ProviderFactory};
pub use crate::runner::{LoopRunner, RunOptions, Runner};
pub use crate::session::{ChatSession, Reply};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments, ToolOutcome};
pub use crate::trace::TraceSink;
pub use crate::types::{ContentPart, ModelMessage, Role};
pub use crate::ui::{Theme, UiController};
