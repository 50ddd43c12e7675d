//! tablechat: workflow orchestration for tabular-data analyst sessions.
//!
//! Users bring a database (or have one provisioned), push tabular files
//! into it, and converse with a pair of AI analyst agents that hold the
//! connection server-side. This crate owns the workflows, the service
//! clients they call and the session-scoped state they share; rendering
//! is someone else's job and subscribes to progress snapshots and UI
//! signals.

pub mod app;
pub mod artifacts;
pub mod config;
pub mod prompts;
pub mod services;
pub mod session;
pub mod stores;
pub mod tabular;
pub mod types;
pub mod workflows;
