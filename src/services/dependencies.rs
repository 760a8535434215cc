//! Persisted skill dependencies.
//!
//! Writes go through [`DependencyGraph`] so the stored edge set of a project
//! never contains a cycle.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{DependencyEdge, DependencyInfo, SkillDependencyInfo};
use crate::services::graph::{DependencyGraph, GraphLocks};
use crate::services::validation::{validate_id, validate_user_id};
use crate::services::{now_millis, points, projects, skills};

/// Load the full graph of a project.
pub async fn load_graph(pool: &DbPool, project_id: &str) -> Result<DependencyGraph, AppError> {
    let edges: Vec<(String, String)> = sqlx::query_as(
        "SELECT from_skill_id, to_skill_id FROM skill_dependencies WHERE project_id = ?",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(DependencyGraph::from_edges(edges))
}

/// Add `from_skill_id requires to_skill_id`.
///
/// Fails with `CircularDependency` (carrying the cycle) when `to_skill_id`
/// already reaches `from_skill_id`; the stored edges are left untouched.
/// Adding an existing edge succeeds without changes.
pub async fn add_dependency(
    pool: &DbPool,
    locks: &GraphLocks,
    project_id: &str,
    from_skill_id: &str,
    to_skill_id: &str,
) -> Result<(), AppError> {
    validate_id(from_skill_id, "skillId")?;
    validate_id(to_skill_id, "dependentSkillId")?;
    if from_skill_id == to_skill_id {
        return Err(AppError::validation_field(
            format!("Skill [{}] cannot depend on itself", from_skill_id),
            "dependentSkillId",
        ));
    }

    skills::get_skill(pool, project_id, from_skill_id).await?;
    skills::get_skill(pool, project_id, to_skill_id).await?;

    let _guard = locks.lock(project_id).await;

    let mut graph = load_graph(pool, project_id).await?;
    if graph.contains_edge(from_skill_id, to_skill_id) {
        return Ok(());
    }
    if let Err(cycle) = graph.add_edge(from_skill_id, to_skill_id) {
        let err = AppError::circular_dependency(project_id, cycle);
        log::warn!("Rejected dependency {} -> {}: {}", from_skill_id, to_skill_id, err);
        return Err(err);
    }

    sqlx::query(
        r#"
        INSERT INTO skill_dependencies (project_id, from_skill_id, to_skill_id, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(from_skill_id)
    .bind(to_skill_id)
    .bind(now_millis())
    .execute(pool)
    .await?;

    log::info!(
        "Added dependency {}:{} -> {}:{}",
        project_id,
        from_skill_id,
        project_id,
        to_skill_id
    );
    Ok(())
}

/// Remove an edge. Removing an absent edge is a no-op.
///
/// # Returns
/// Whether an edge was removed
pub async fn remove_dependency(
    pool: &DbPool,
    project_id: &str,
    from_skill_id: &str,
    to_skill_id: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "DELETE FROM skill_dependencies WHERE project_id = ? AND from_skill_id = ? AND to_skill_id = ?",
    )
    .bind(project_id)
    .bind(from_skill_id)
    .bind(to_skill_id)
    .execute(pool)
    .await?;

    let removed = result.rows_affected() > 0;
    if removed {
        log::info!(
            "Removed dependency {}:{} -> {}:{}",
            project_id,
            from_skill_id,
            project_id,
            to_skill_id
        );
    }
    Ok(removed)
}

/// All edges of a project.
pub async fn list_dependencies(
    pool: &DbPool,
    project_id: &str,
) -> Result<Vec<DependencyEdge>, AppError> {
    projects::ensure_exists(pool, project_id).await?;

    let edges = sqlx::query_as::<_, DependencyEdge>(
        r#"
        SELECT project_id, from_skill_id, to_skill_id, created_at
        FROM skill_dependencies
        WHERE project_id = ?
        ORDER BY from_skill_id, to_skill_id
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(edges)
}

/// Direct prerequisites of a skill.
pub async fn list_skill_dependencies(
    pool: &DbPool,
    project_id: &str,
    skill_id: &str,
) -> Result<Vec<DependencyEdge>, AppError> {
    skills::get_skill(pool, project_id, skill_id).await?;

    let edges = sqlx::query_as::<_, DependencyEdge>(
        r#"
        SELECT project_id, from_skill_id, to_skill_id, created_at
        FROM skill_dependencies
        WHERE project_id = ? AND from_skill_id = ?
        ORDER BY to_skill_id
        "#,
    )
    .bind(project_id)
    .bind(skill_id)
    .fetch_all(pool)
    .await?;

    Ok(edges)
}

/// Every skill transitively required by `skill_id`, nearest first.
pub async fn prerequisites(
    pool: &DbPool,
    project_id: &str,
    skill_id: &str,
) -> Result<Vec<String>, AppError> {
    let graph = load_graph(pool, project_id).await?;
    Ok(graph.prerequisites(skill_id))
}

/// Direct and transitive prerequisites of a skill with the user's achievement.
pub async fn load_skill_dependency_info(
    pool: &DbPool,
    project_id: &str,
    user_id: &str,
    skill_id: &str,
) -> Result<SkillDependencyInfo, AppError> {
    validate_user_id(user_id, "userId")?;
    skills::get_skill(pool, project_id, skill_id).await?;

    let graph = load_graph(pool, project_id).await?;
    let progress = points::user_progress(pool, project_id, user_id).await?;
    let names: Vec<(String, String)> =
        sqlx::query_as("SELECT skill_id, name FROM skills WHERE project_id = ?")
            .bind(project_id)
            .fetch_all(pool)
            .await?;
    let name_of = |id: &str| {
        names
            .iter()
            .find(|(skill, _)| skill == id)
            .map(|(_, name)| name.clone())
            .unwrap_or_default()
    };

    // walk the prerequisite closure, emitting each edge once
    let mut dependencies = Vec::new();
    let mut declaring = vec![skill_id.to_string()];
    declaring.extend(graph.prerequisites(skill_id));
    for parent in &declaring {
        for child in graph.direct_prerequisites(parent) {
            dependencies.push(DependencyInfo {
                skill_id: parent.clone(),
                depends_on_name: name_of(&child),
                achieved: progress.get(&child).is_some_and(|p| p.is_achieved()),
                is_direct: parent == skill_id,
                depends_on_skill_id: child,
            });
        }
    }

    Ok(SkillDependencyInfo {
        project_id: project_id.to_string(),
        skill_id: skill_id.to_string(),
        user_id: user_id.to_string(),
        dependencies,
    })
}
