//! Self-report approval workflow tests.
//!
//! These tests walk the whole workflow through the commands:
//! 1. Users report skills; honor-system skills pay out right away
//! 2. Approval skills queue requests gated by prerequisites
//! 3. Approvers decide batches according to their workload rules
//! 4. Users see, and may dismiss, their rejections
//! 5. Single decisions report failures as errors
//!
//! Each test runs against its own SQLite database in a temp directory.

use skills_workflow_lib::commands::dependencies::DependencyInput;
use skills_workflow_lib::commands::projects::RoleInput;
use skills_workflow_lib::commands::self_report::{
    DecisionInput, ListRequestsInput, RejectionInput, SingleDecisionInput, SubmitInput,
};
use skills_workflow_lib::commands::skills::{SkillInput, UserPointsInput};
use skills_workflow_lib::commands::workload::UpsertRuleInput;
use skills_workflow_lib::commands::{
    add_dependency, approve_request, approve_requests, assign_role, create_project, create_skill,
    dismiss_rejection, get_user_points, list_decided_requests, list_pending_requests,
    list_rejections, reject_request, reject_requests, set_user_tag, submit_self_report,
    upsert_workload_rule,
};
use skills_workflow_lib::models::{
    ApprovalFilter, ApprovalOrderBy, DecisionOutcome, NewProject, Role, SelfReport,
    SelfReportingType, SkillRequest, UserTag, WorkloadCriterion, WorkloadRuleInput,
};
use skills_workflow_lib::{AppError, AppState};
use tempfile::tempdir;

/// Project `proj1` with:
/// - `basics` (approval), `advanced` (approval, requires `basics`)
/// - `reading` (honor system, 25 points x 4)
/// - approvers `alice` and `bob`
async fn setup_state() -> (tempfile::TempDir, AppState) {
    let dir = tempdir().unwrap();
    let state = AppState::open(dir.path()).await.unwrap();

    create_project(
        &state,
        NewProject {
            project_id: "proj1".into(),
            name: "Onboarding".into(),
        },
    )
    .await
    .unwrap();

    for (skill_id, points, reps, mode) in [
        ("basics", 100, 1, SelfReportingType::Approval),
        ("advanced", 100, 1, SelfReportingType::Approval),
        ("reading", 25, 4, SelfReportingType::HonorSystem),
    ] {
        create_skill(
            &state,
            SkillInput {
                project_id: "proj1".into(),
                skill: SkillRequest {
                    skill_id: skill_id.into(),
                    name: format!("Skill {}", skill_id),
                    point_increment: points,
                    num_perform_to_completion: reps,
                    self_reporting_type: mode,
                },
            },
        )
        .await
        .unwrap();
    }

    add_dependency(
        &state,
        DependencyInput {
            project_id: "proj1".into(),
            skill_id: "advanced".into(),
            dependent_skill_id: "basics".into(),
        },
    )
    .await
    .unwrap();

    for approver in ["alice", "bob"] {
        assign_role(
            &state,
            RoleInput {
                project_id: "proj1".into(),
                user_id: approver.into(),
                role: Role::Approver,
            },
        )
        .await
        .unwrap();
    }

    (dir, state)
}

async fn report(state: &AppState, skill_id: &str, user_id: &str, performed_on: i64) -> Result<Option<i64>, AppError> {
    let result = submit_self_report(
        state,
        SubmitInput {
            project_id: "proj1".into(),
            report: SelfReport {
                skill_id: skill_id.into(),
                user_id: user_id.into(),
                performed_on,
                message: Some("Done it".into()),
            },
        },
    )
    .await?;
    Ok(result.request_id)
}

fn decision(ids: &[i64], approver: &str, message: Option<&str>) -> DecisionInput {
    DecisionInput {
        project_id: "proj1".into(),
        request_ids: ids.to_vec(),
        approver_id: approver.into(),
        message: message.map(String::from),
    }
}

fn list_input(filter: ApprovalFilter) -> ListRequestsInput {
    ListRequestsInput {
        project_id: "proj1".into(),
        filter,
        page: None,
        page_size: None,
        order_by: ApprovalOrderBy::default(),
    }
}

async fn points_of(state: &AppState, skill_id: &str, user_id: &str) -> (i64, bool) {
    let response = get_user_points(
        state,
        UserPointsInput {
            project_id: "proj1".into(),
            skill_id: skill_id.into(),
            user_id: user_id.into(),
        },
    )
    .await
    .unwrap();
    (response.points, response.achieved)
}

#[tokio::test]
async fn test_honor_system_completes_after_enough_reports() {
    let (_dir, state) = setup_state().await;

    for day in 1..=4 {
        let request_id = report(&state, "reading", "u1", day * 86_400_000).await.unwrap();
        assert!(request_id.is_none());
    }

    assert_eq!(points_of(&state, "reading", "u1").await, (100, true));
}

#[tokio::test]
async fn test_prerequisite_gates_submission_until_approved() {
    let (_dir, state) = setup_state().await;

    let err = report(&state, "advanced", "u1", 1).await.unwrap_err();
    match err {
        AppError::DependencyNotMet { unmet, .. } => assert_eq!(unmet, vec!["basics".to_string()]),
        other => panic!("expected DependencyNotMet, got {:?}", other),
    }

    let basics = report(&state, "basics", "u1", 2).await.unwrap().unwrap();
    // pending is not achieved
    assert!(report(&state, "advanced", "u1", 3).await.is_err());

    let batch = approve_requests(&state, decision(&[basics], "alice", None)).await.unwrap();
    assert_eq!(batch.decided, 1);
    assert_eq!(points_of(&state, "basics", "u1").await, (100, true));

    let advanced = report(&state, "advanced", "u1", 4).await.unwrap();
    assert!(advanced.is_some());
}

#[tokio::test]
async fn test_batch_mixes_outcomes() {
    let (_dir, state) = setup_state().await;

    let id1 = report(&state, "basics", "u1", 1).await.unwrap().unwrap();
    let id2 = report(&state, "basics", "u2", 2).await.unwrap().unwrap();
    let id3 = report(&state, "basics", "u3", 3).await.unwrap().unwrap();

    approve_requests(&state, decision(&[id2], "bob", None)).await.unwrap();
    let batch = approve_requests(&state, decision(&[id1, id2, id3], "alice", None))
        .await
        .unwrap();

    let outcomes: Vec<_> = batch.outcomes.iter().map(|o| (o.request_id, o.outcome)).collect();
    assert_eq!(
        outcomes,
        vec![
            (id1, DecisionOutcome::Success),
            (id2, DecisionOutcome::AlreadyDecided),
            (id3, DecisionOutcome::Success),
        ]
    );
    assert_eq!(batch.decided, 2);

    let history = list_decided_requests(&state, list_input(ApprovalFilter::default()))
        .await
        .unwrap();
    assert_eq!(history.total_count, 3);
    // latest decision first, newest id breaking ties
    assert_eq!(history.items[0].id, id3);
}

#[tokio::test]
async fn test_racing_approvers_single_winner() {
    let (_dir, state) = setup_state().await;
    let id = report(&state, "basics", "u1", 1).await.unwrap().unwrap();

    let approve = {
        let state = state.clone();
        tokio::spawn(async move { approve_requests(&state, decision(&[id], "alice", None)).await })
    };
    let reject = {
        let state = state.clone();
        tokio::spawn(async move {
            reject_requests(&state, decision(&[id], "bob", Some("Not convincing"))).await
        })
    };

    let approved = approve.await.unwrap().unwrap();
    let rejected = reject.await.unwrap().unwrap();
    assert_eq!(approved.decided + rejected.decided, 1);

    let (points, _) = points_of(&state, "basics", "u1").await;
    if approved.decided == 1 {
        assert_eq!(rejected.outcome_for(id), Some(DecisionOutcome::AlreadyDecided));
        assert_eq!(points, 100);
    } else {
        assert_eq!(approved.outcome_for(id), Some(DecisionOutcome::AlreadyDecided));
        assert_eq!(points, 0);
    }
}

#[tokio::test]
async fn test_workload_rules_route_requests() {
    let (_dir, state) = setup_state().await;

    set_user_tag(
        &state,
        UserTag {
            user_id: "u1".into(),
            tag_key: "team".into(),
            tag_value: "red".into(),
        },
    )
    .await
    .unwrap();
    upsert_workload_rule(
        &state,
        UpsertRuleInput {
            project_id: "proj1".into(),
            rule: WorkloadRuleInput {
                id: None,
                approver_id: "alice".into(),
                criterion: WorkloadCriterion::Tag {
                    tag_key: "team".into(),
                    tag_value: "red".into(),
                },
            },
        },
    )
    .await
    .unwrap();

    let red = report(&state, "basics", "u1", 1).await.unwrap().unwrap();
    let other = report(&state, "basics", "u2", 2).await.unwrap().unwrap();

    let alice_view = list_pending_requests(
        &state,
        list_input(ApprovalFilter {
            approver_id: Some("alice".into()),
            ..ApprovalFilter::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(alice_view.items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![red]);

    let bob_view = list_pending_requests(
        &state,
        list_input(ApprovalFilter {
            approver_id: Some("bob".into()),
            ..ApprovalFilter::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(bob_view.items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![other]);

    let batch = approve_requests(&state, decision(&[red, other], "alice", None))
        .await
        .unwrap();
    assert_eq!(batch.outcome_for(red), Some(DecisionOutcome::Success));
    assert_eq!(batch.outcome_for(other), Some(DecisionOutcome::NotAuthorized));
}

#[tokio::test]
async fn test_rejection_visible_until_dismissed() {
    let (_dir, state) = setup_state().await;
    let id = report(&state, "basics", "u1", 1).await.unwrap().unwrap();

    reject_requests(&state, decision(&[id], "alice", Some("Please attach a certificate")))
        .await
        .unwrap();

    let pending = list_pending_requests(&state, list_input(ApprovalFilter::default()))
        .await
        .unwrap();
    assert_eq!(pending.total_count, 0);

    let view = RejectionInput {
        project_id: "proj1".into(),
        user_id: "u1".into(),
        request_id: None,
    };
    let rejections = list_rejections(&state, view).await.unwrap();
    assert_eq!(rejections.len(), 1);
    assert_eq!(
        rejections[0].decision_msg.as_deref(),
        Some("Please attach a certificate")
    );

    dismiss_rejection(
        &state,
        RejectionInput {
            project_id: "proj1".into(),
            user_id: "u1".into(),
            request_id: Some(id),
        },
    )
    .await
    .unwrap();

    let rejections = list_rejections(
        &state,
        RejectionInput {
            project_id: "proj1".into(),
            user_id: "u1".into(),
            request_id: None,
        },
    )
    .await
    .unwrap();
    assert!(rejections.is_empty());

    // a rejected user may try again
    assert!(report(&state, "basics", "u1", 2).await.unwrap().is_some());
}

#[tokio::test]
async fn test_page_size_bounds() {
    let (_dir, state) = setup_state().await;

    let mut input = list_input(ApprovalFilter::default());
    input.page_size = Some(10_000);
    let err = list_pending_requests(&state, input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

fn single(request_id: i64, approver: &str) -> SingleDecisionInput {
    SingleDecisionInput {
        project_id: "proj1".into(),
        request_id,
        approver_id: approver.into(),
        message: None,
    }
}

#[tokio::test]
async fn test_single_decision_errors() {
    let (_dir, state) = setup_state().await;
    let id = report(&state, "basics", "u1", 1).await.unwrap().unwrap();

    let err = approve_request(&state, single(id, "mallory")).await.unwrap_err();
    assert!(matches!(err, AppError::NotAuthorized { .. }));

    approve_request(&state, single(id, "alice")).await.unwrap();
    assert_eq!(points_of(&state, "basics", "u1").await, (100, true));

    let err = reject_request(&state, single(id, "bob")).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyDecided { request_id } if request_id == id));

    let err = approve_request(&state, single(9_999, "alice")).await.unwrap_err();
    assert!(err.is_not_found());
}
