//! Shared fixtures for service tests.

use crate::db::pool::DbPool;
use crate::models::{NewProject, SelfReportingType, SkillRequest};
use crate::services::{projects, skills};
use crate::config::EngineConfig;
use tempfile::tempdir;

pub(crate) async fn setup_test_db() -> DbPool {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    // Keep the dir alive by leaking it (for test purposes)
    std::mem::forget(dir);

    crate::db::initialize(&db_path).await.unwrap()
}

pub(crate) async fn create_project(pool: &DbPool, project_id: &str) {
    projects::create_project(
        pool,
        NewProject {
            project_id: project_id.to_string(),
            name: format!("Project {}", project_id),
        },
    )
    .await
    .unwrap();
}

pub(crate) async fn create_skill(
    pool: &DbPool,
    project_id: &str,
    skill_id: &str,
    mode: SelfReportingType,
) {
    skills::create_skill(
        pool,
        &EngineConfig::default(),
        project_id,
        SkillRequest {
            skill_id: skill_id.to_string(),
            name: format!("Skill {}", skill_id),
            point_increment: 50,
            num_perform_to_completion: 2,
            self_reporting_type: mode,
        },
    )
    .await
    .unwrap();
}
