//! Command handlers for the REST layer.
//!
//! Each command takes the shared [`AppState`](crate::state::AppState) and a
//! camelCase input struct, and returns `Result<T, AppError>` so errors reach
//! the caller as structured JSON. Commands are organized by functionality:
//! - `projects`: projects, roles and user tags
//! - `skills`: skill CRUD and user points
//! - `dependencies`: skill prerequisites
//! - `self_report`: submissions, approvals and request lists
//! - `workload`: approver workload rules
//! - `settings`: engine configuration

pub mod dependencies;
pub mod projects;
pub mod self_report;
pub mod settings;
pub mod skills;
pub mod workload;

// Re-export commands for convenience
pub use dependencies::{
    add_dependency, get_dependency_info, list_dependencies, list_skill_dependencies,
    remove_dependency,
};
pub use projects::{
    assign_role, create_project, delete_project, get_project, get_user_tags, list_projects,
    list_roles, remove_role, remove_user_tag, set_user_tag,
};
pub use self_report::{
    approve_request, approve_requests, dismiss_rejection, get_request, list_decided_requests,
    list_pending_requests, list_rejections, reject_request, reject_requests, submit_self_report,
};
pub use settings::{get_settings, update_settings};
pub use skills::{create_skill, delete_skill, get_skill, get_user_points, list_skills, update_skill};
pub use workload::{delete_workload_rule, get_workload, upsert_workload_rule};
