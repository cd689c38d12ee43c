//! The immutable agent graph and its two-phase builder.
//!
//! Phase one declares agents, phase two declares delegation edges. Every
//! edge gets an implicit back-edge, so a run that delegates can always
//! return to its caller.
//!
//! ```
//! use parley::agent::{Agent, AgentGraph, AgentRole, HandoffOptions, InputFilter};
//!
//! let graph = AgentGraph::builder()
//!     .agent(Agent::new(AgentRole::Main, "m"))
//!     .agent(Agent::new(AgentRole::Helper, "m"))
//!     .delegate(
//!         AgentRole::Main,
//!         AgentRole::Helper,
//!         HandoffOptions::builder().input_filter(InputFilter::RemoveToolCalls).build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert!(graph.agent(AgentRole::Helper).unwrap().handoff_for("transfer_to_main").is_some());
//! ```

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use super::definition::{Agent, AgentRole};
use super::handoff::{Handoff, HandoffOptions};
use super::prompts;
use crate::config::{self, ChatConfig};
use crate::error::{ParleyError, Result};
use crate::tools::builtin::{helper_tools, main_tools};
use crate::tools::ToolRegistry;

/// Name of the Helper's tool for returning to Main in the default graph.
pub const RETURN_TO_MAIN_TOOL: &str = "transform_to_default_agent";

#[derive(Debug, Clone)]
pub struct AgentGraph {
    agents: BTreeMap<AgentRole, Agent>,
}

impl AgentGraph {
    pub fn builder() -> AgentGraphBuilder {
        AgentGraphBuilder::default()
    }

    pub fn agent(&self, role: AgentRole) -> Result<&Agent> {
        self.agents
            .get(&role)
            .ok_or_else(|| ParleyError::InvalidState(format!("agent graph has no {role} agent")))
    }

    pub fn main(&self) -> &Agent {
        // build() guarantees a Main agent
        &self.agents[&AgentRole::Main]
    }

    pub fn contains(&self, role: AgentRole) -> bool {
        self.agents.contains_key(&role)
    }
}

/// Phase one: declare agents.
#[derive(Debug, Default)]
pub struct AgentGraphBuilder {
    agents: Vec<Agent>,
}

impl AgentGraphBuilder {
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Start declaring edges.
    pub fn delegate(self, from: AgentRole, to: AgentRole, options: HandoffOptions) -> DelegationPhase {
        DelegationPhase {
            agents: self.agents,
            edges: Vec::new(),
        }
        .delegate(from, to, options)
    }

    pub fn build(self) -> Result<AgentGraph> {
        DelegationPhase {
            agents: self.agents,
            edges: Vec::new(),
        }
        .build()
    }
}

/// Phase two: declare delegation edges.
#[derive(Debug)]
pub struct DelegationPhase {
    agents: Vec<Agent>,
    edges: Vec<(AgentRole, AgentRole, HandoffOptions)>,
}

impl DelegationPhase {
    pub fn delegate(mut self, from: AgentRole, to: AgentRole, options: HandoffOptions) -> Self {
        self.edges.push((from, to, options));
        self
    }

    pub fn build(self) -> Result<AgentGraph> {
        let mut agents: BTreeMap<AgentRole, Agent> = BTreeMap::new();
        for agent in self.agents {
            let role = agent.role();
            if agents.insert(role, agent).is_some() {
                return Err(graph_error(format!("agent {role} declared twice")));
            }
        }
        if !agents.contains_key(&AgentRole::Main) {
            return Err(graph_error("a main agent is required".into()));
        }

        for (from, to, options) in self.edges {
            if from == to {
                return Err(graph_error(format!("agent {from} cannot delegate to itself")));
            }
            let (Some(source), Some(target)) = (agents.get(&from), agents.get(&to)) else {
                return Err(graph_error(format!("edge {from} -> {to} names an undeclared agent")));
            };

            let forward = Handoff {
                target: to,
                tool_name: options
                    .tool_name
                    .unwrap_or_else(|| Handoff::default_tool_name(to)),
                description: options.description.unwrap_or_else(|| {
                    format!("Hand the conversation to {}. {}", target.name(), target.description())
                        .trim()
                        .to_string()
                }),
                input_filter: options.input_filter,
            };
            let back = Handoff {
                target: from,
                tool_name: options
                    .return_tool_name
                    .unwrap_or_else(|| Handoff::default_tool_name(from)),
                description: format!("Hand the conversation back to {}.", source.name()),
                input_filter: Default::default(),
            };

            add_handoff(&mut agents, from, forward)?;
            if !agents[&to].handoffs.iter().any(|h| h.target == from) {
                add_handoff(&mut agents, to, back)?;
            }
        }

        for role in agents.keys() {
            if !reaches_main(&agents, *role) {
                return Err(graph_error(format!("agent {role} cannot reach the main agent")));
            }
        }

        debug!(agents = agents.len(), "Agent graph built");
        Ok(AgentGraph { agents })
    }
}

fn add_handoff(agents: &mut BTreeMap<AgentRole, Agent>, role: AgentRole, handoff: Handoff) -> Result<()> {
    let agent = agents
        .get_mut(&role)
        .ok_or_else(|| graph_error(format!("agent {role} is not declared")))?;
    if agent.tools().get(&handoff.tool_name).is_some() || agent.handoff_for(&handoff.tool_name).is_some() {
        return Err(graph_error(format!(
            "tool name '{}' is already used by agent {role}",
            handoff.tool_name
        )));
    }
    agent.handoffs.push(handoff);
    Ok(())
}

fn reaches_main(agents: &BTreeMap<AgentRole, Agent>, start: AgentRole) -> bool {
    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(role) = queue.pop_front() {
        if role == AgentRole::Main {
            return true;
        }
        for handoff in agents[&role].handoffs() {
            if seen.insert(handoff.target) {
                queue.push_back(handoff.target);
            }
        }
    }
    false
}

fn graph_error(message: String) -> ParleyError {
    ParleyError::Configuration(format!("invalid agent graph: {message}"))
}

/// The standard two-agent graph for `config`.
///
/// Fails with `ConfigIncomplete` when the config cannot drive a run.
pub fn default_graph(config: &ChatConfig) -> Result<AgentGraph> {
    config::validate(config)?;
    let helper_tool = Handoff::default_tool_name(AgentRole::Helper);

    let main = Agent::new(AgentRole::Main, config.model_id.as_str())
        .with_description(prompts::MAIN_DESCRIPTION)
        .with_instructions(prompts::main_instructions(&helper_tool))
        .with_tools(ToolRegistry::from_tools(main_tools())?);
    let helper = Agent::new(AgentRole::Helper, config.model_id.as_str())
        .with_description(prompts::HELPER_DESCRIPTION)
        .with_instructions(prompts::helper_instructions(RETURN_TO_MAIN_TOOL))
        .with_tools(ToolRegistry::from_tools(helper_tools())?);

    AgentGraph::builder()
        .agent(main)
        .agent(helper)
        .delegate(
            AgentRole::Main,
            AgentRole::Helper,
            HandoffOptions::builder()
                .tool_name(helper_tool)
                .input_filter(super::InputFilter::RemoveToolCalls)
                .return_tool_name(RETURN_TO_MAIN_TOOL)
                .build(),
        )
        .build()
}
