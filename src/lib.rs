//! Parley: multi-agent chat client core.
//!
//! A conversation is driven by a Main agent that can hand a turn off to a
//! Helper agent (model management) and back, calling tools along the way.
//! The pieces are usable on their own: a JSON-backed config store, an
//! OpenAI-compatible provider, a tool registry with schema validation, an
//! immutable agent graph, a run loop, and a JSON-lines trace sink.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use parley::prelude::*;
//!
//! # async fn example() -> parley::error::Result<()> {
//! let config = Arc::new(ConfigStore::open_default());
//! let ctx = SessionContext::new(config);
//! let mut session = ChatSession::new(ctx);
//! let reply = session.send_message("Which model are you running on?").await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod runner;
pub mod search;
pub mod session;
pub mod tools;
pub mod trace;
pub mod types;
pub mod ui;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
