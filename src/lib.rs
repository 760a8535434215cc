//! Skills Workflow - self-reported skill approvals and skill dependency graphs.
//!
//! This is the engine library behind the skills REST layer. It keeps each
//! project's skill dependency graph acyclic and runs the self-report
//! workflow: honor-system awards, approval requests, and approver decisions
//! routed by workload rules.
//!
//! Callers open an [`AppState`] once and pass it to the functions in
//! [`commands`]; [`services`] holds the same operations on a bare pool.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

pub use config::EngineConfig;
pub use error::AppError;
pub use services::{DependencyGraph, GraphLocks};
pub use state::AppState;
