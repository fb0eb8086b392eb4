//! chainstream: typed event streaming for graph-executed agents.
//!
//! A graph executor runs an agent (model plus tools) and reports what it is
//! doing as a flat stream of loosely-typed events. This crate turns that
//! stream into a small, strongly-typed protocol for UIs
//! ([`types::AgentStreamingEvent`]), or into a single final answer, while
//! recording each tool invocation as a span in an optional trace sink.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use chainstream::prelude::*;
//!
//! # async fn example() -> chainstream::error::Result<()> {
//! let store = Arc::new(InMemorySessionStore::with_session(
//!     "s-1",
//!     vec![SessionMessage::user("What is Rust?")],
//! ));
//! let executor = Arc::new(ReplayExecutor::new("run.jsonl"));
//! let agent = ChatAgent::new(AgentConfig::builder().name("qa-agent").build(), executor, store);
//!
//! let mut events = agent.stream("s-1", MessageWindow::default()).await?;
//! while let Some(event) = events.next().await {
//!     println!("{:?}", event?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod agent;
pub mod config;
pub mod error;
pub mod executor;
pub mod interpreter;
pub mod prelude;
pub mod store;
pub mod trace;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
