//! Skill dependency graph tests.
//!
//! These tests drive the dependency commands end to end against a real
//! SQLite database and check that:
//! 1. A dependency closing a cycle is rejected with the full cycle path
//! 2. The stored graph is left unchanged by a rejected insertion
//! 3. Removing edges is idempotent
//! 4. Concurrent insertions never leave a cycle behind

use skills_workflow_lib::commands::dependencies::DependencyInput;
use skills_workflow_lib::commands::skills::SkillInput;
use skills_workflow_lib::commands::{
    add_dependency, create_project, create_skill, delete_skill, list_dependencies,
    remove_dependency,
};
use skills_workflow_lib::models::{NewProject, SelfReportingType, SkillRequest};
use skills_workflow_lib::services::dependencies::load_graph;
use skills_workflow_lib::{AppError, AppState};
use tempfile::tempdir;

async fn setup_state(skill_count: usize) -> (tempfile::TempDir, AppState) {
    let dir = tempdir().unwrap();
    let state = AppState::open(dir.path()).await.unwrap();

    create_project(
        &state,
        NewProject {
            project_id: "proj1".into(),
            name: "Project One".into(),
        },
    )
    .await
    .unwrap();

    for i in 1..=skill_count {
        create_skill(
            &state,
            SkillInput {
                project_id: "proj1".into(),
                skill: SkillRequest {
                    skill_id: format!("skill{}", i),
                    name: format!("Skill number {}", i),
                    point_increment: 10,
                    num_perform_to_completion: 1,
                    self_reporting_type: SelfReportingType::Approval,
                },
            },
        )
        .await
        .unwrap();
    }

    (dir, state)
}

fn edge(from: &str, to: &str) -> DependencyInput {
    DependencyInput {
        project_id: "proj1".into(),
        skill_id: from.into(),
        dependent_skill_id: to.into(),
    }
}

#[tokio::test]
async fn test_two_skill_cycle_reports_path() {
    let (_dir, state) = setup_state(2).await;

    add_dependency(&state, edge("skill1", "skill2")).await.unwrap();
    let err = add_dependency(&state, edge("skill2", "skill1")).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Discovered circular dependency [proj1:skill1 -> proj1:skill2 -> proj1:skill1]"
    );

    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["type"], "CircularDependency");
    assert_eq!(
        json["details"]["path"],
        serde_json::json!(["skill1", "skill2", "skill1"])
    );
}

#[tokio::test]
async fn test_long_cycle_leaves_graph_unchanged() {
    let (_dir, state) = setup_state(4).await;

    add_dependency(&state, edge("skill1", "skill2")).await.unwrap();
    add_dependency(&state, edge("skill2", "skill3")).await.unwrap();
    add_dependency(&state, edge("skill3", "skill4")).await.unwrap();

    let before = list_dependencies(&state, "proj1".into()).await.unwrap();
    let err = add_dependency(&state, edge("skill4", "skill1")).await.unwrap_err();
    assert_eq!(
        err.cycle_path().unwrap(),
        &["skill1", "skill2", "skill3", "skill4", "skill1"].map(String::from)
    );

    let after = list_dependencies(&state, "proj1".into()).await.unwrap();
    assert_eq!(before, after);

    // skipping a level is still fine
    add_dependency(&state, edge("skill1", "skill3")).await.unwrap();
}

#[tokio::test]
async fn test_remove_dependency_is_idempotent() {
    let (_dir, state) = setup_state(2).await;

    remove_dependency(&state, edge("skill1", "skill2")).await.unwrap();

    add_dependency(&state, edge("skill1", "skill2")).await.unwrap();
    remove_dependency(&state, edge("skill1", "skill2")).await.unwrap();
    remove_dependency(&state, edge("skill1", "skill2")).await.unwrap();

    assert!(list_dependencies(&state, "proj1".into()).await.unwrap().is_empty());
    // the reverse edge is allowed once the first one is gone
    add_dependency(&state, edge("skill2", "skill1")).await.unwrap();
}

#[tokio::test]
async fn test_deleting_skill_removes_its_edges() {
    let (_dir, state) = setup_state(3).await;
    add_dependency(&state, edge("skill1", "skill2")).await.unwrap();
    add_dependency(&state, edge("skill2", "skill3")).await.unwrap();

    delete_skill(
        &state,
        skills_workflow_lib::commands::skills::SkillRef {
            project_id: "proj1".into(),
            skill_id: "skill2".into(),
        },
    )
    .await
    .unwrap();

    assert!(list_dependencies(&state, "proj1".into()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_project_or_skill() {
    let (_dir, state) = setup_state(1).await;

    let err = add_dependency(&state, edge("skill1", "ghost")).await.unwrap_err();
    assert!(err.is_not_found());

    let err = list_dependencies(&state, "nope".into()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn test_concurrent_ring_never_closes() {
    let (_dir, state) = setup_state(4).await;

    // Every edge of the ring skill1 -> skill2 -> skill3 -> skill4 -> skill1
    // at once; at least one must be refused.
    let tasks: Vec<_> = [
        ("skill1", "skill2"),
        ("skill2", "skill3"),
        ("skill3", "skill4"),
        ("skill4", "skill1"),
    ]
    .into_iter()
    .map(|(from, to)| {
        let state = state.clone();
        tokio::spawn(async move { add_dependency(&state, edge(from, to)).await })
    })
    .collect();

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => accepted += 1,
            Err(err) => assert!(err.cycle_path().is_some()),
        }
    }

    assert_eq!(accepted, 3);
    let graph = load_graph(&state.pool, "proj1").await.unwrap();
    assert!(graph.is_acyclic());
}
