//! Business logic services.
//!
//! This module contains the dependency graph validator, the self-report
//! approval workflow and the project/skill/role/workload management they
//! depend on. Services take a `DbPool` (and, for graph writes, the
//! per-project locks) and return `AppError` for every expected failure.

pub mod dependencies;
pub mod graph;
pub mod points;
pub mod projects;
pub mod self_report;
pub mod skills;
pub mod users;
pub mod validation;
pub mod workload;

#[cfg(test)]
pub(crate) mod test_support;

pub use graph::{DependencyGraph, GraphLocks};

/// Current Unix timestamp in milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
