//! Data models for the engine.
//!
//! These models represent the entities stored in SQLite and exchanged with
//! the REST layer. Row types derive `FromRow`; everything crossing the
//! boundary derives serde with camelCase field names.

pub mod approval;
pub mod dependency;
pub mod page;
pub mod project;
pub mod skill;
pub mod user;
pub mod workload;

// Re-exports for convenient access
pub use approval::{
    ApprovalFilter, ApprovalOrderBy, ApprovalRequest, ApprovalSortField, ApprovalStatus,
    BatchResult, Decision, DecisionOutcome, RequestOutcome, SelfReport, SubmitResult,
};
pub use dependency::{DependencyEdge, DependencyInfo, SkillDependencyInfo};
pub use page::{Page, PageRequest};
pub use project::{NewProject, Project};
pub use skill::{SelfReportingType, Skill, SkillRequest};
pub use user::{ProjectRole, Role, UserTag};
pub use workload::{WorkloadCriterion, WorkloadRule, WorkloadRuleInput};
