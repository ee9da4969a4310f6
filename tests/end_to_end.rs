// tests/end_to_end.rs

mod common;
use crate::common::fixtures::{DEFAULT_PARAMS, write_metrics_report, write_project};
use crate::common::{FAST_RETRY, FakeHealthCheck, TestProject, init_tracing, with_timeout};

use std::sync::Arc;

use flowdag::backend::ensure_backend;
use flowdag::cli::FlowCommand;
use flowdag::errors::FlowdagError;
use flowdag::flows::{
    REPRO_FAIL_ONCE_KEY, ReproOptions, StageOptions, TRAIN_FAIL_ONCE_KEY, metrics_summary,
    repro_flow, stage_flow,
};
use flowdag::task::{MarkerStore, RetryPolicy, Task, TaskBody, TaskOutcome};
use flowdag::{EXIT_BACKEND_UNAVAILABLE, EXIT_FAILURE, EXIT_OK, execute_command};

fn fast_stages(fail_once: bool) -> StageOptions {
    StageOptions {
        fail_once,
        retry_delay: FAST_RETRY,
    }
}

#[tokio::test]
async fn stages_flow_recovers_from_injected_train_failure() {
    init_tracing();
    let project = TestProject::new();
    let layout = write_project(project.dir.path(), DEFAULT_PARAMS, 30);

    let flow = stage_flow(&project.ctx, &fast_stages(true));
    let result = with_timeout(flow.execute()).await;

    assert!(result.is_success(), "{result:?}");
    assert_eq!(result.len(), 3);
    assert!(project.markers.is_set(TRAIN_FAIL_ONCE_KEY).unwrap());

    let text = std::fs::read_to_string(layout.metrics()).unwrap();
    let metrics: serde_json::Value = serde_json::from_str(&text).unwrap();
    for key in ["accuracy", "f1_macro"] {
        let value = metrics[key].as_f64().unwrap_or_else(|| panic!("{key} missing"));
        assert!((0.0..=1.0).contains(&value), "{key} = {value}");
    }
    assert!(metrics["accuracy"].as_f64().unwrap() > 0.8);
    assert!(text.ends_with('\n'));

    assert!(layout.train_data().exists());
    assert!(layout.test_data().exists());
    assert!(layout.model().exists());
}

#[tokio::test]
async fn rerun_after_success_does_not_fail_again() {
    init_tracing();
    let project = TestProject::new();
    write_project(project.dir.path(), DEFAULT_PARAMS, 20);

    let first = with_timeout(stage_flow(&project.ctx, &fast_stages(true)).execute()).await;
    assert!(first.is_success());

    // Single-attempt policy would fail if the marker were consumed again.
    let mut train_again = Task::new("train")
        .with_fail_once(flowdag::task::FailOnce::new(
            Arc::clone(&project.markers) as Arc<dyn MarkerStore>,
            TRAIN_FAIL_ONCE_KEY,
        ));
    assert_eq!(with_timeout(train_again.execute()).await, TaskOutcome::Success);

    let second = with_timeout(stage_flow(&project.ctx, &fast_stages(true)).execute()).await;
    assert!(second.is_success());
}

#[tokio::test]
async fn stages_flow_stops_when_raw_data_is_missing() {
    init_tracing();
    let project = TestProject::new();
    std::fs::write(project.dir.path().join("params.toml"), DEFAULT_PARAMS).unwrap();

    let result = with_timeout(stage_flow(&project.ctx, &fast_stages(false)).execute()).await;

    assert!(!result.is_success());
    assert_eq!(result.len(), 1);
    assert_eq!(result.failed_task(), Some("prepare"));
}

#[tokio::test]
async fn unavailable_backend_aborts_before_any_task() {
    init_tracing();
    let project = TestProject::new();
    let layout = write_project(project.dir.path(), DEFAULT_PARAMS, 10);
    let check = FakeHealthCheck::down();

    let err = ensure_backend(&check).await.unwrap_err();
    assert!(matches!(err, FlowdagError::BackendUnavailable { .. }));

    let code = with_timeout(execute_command(
        project.ctx.clone(),
        &check,
        &FlowCommand::Stages { fail_once: true },
    ))
    .await
    .unwrap();

    assert_eq!(code, EXIT_BACKEND_UNAVAILABLE);
    assert!(!layout.train_data().exists(), "prepare must not have run");
    assert!(!project.markers.is_set(TRAIN_FAIL_ONCE_KEY).unwrap());
}

#[tokio::test]
async fn available_backend_runs_the_selected_flow() {
    init_tracing();
    let project = TestProject::new();
    let layout = write_project(project.dir.path(), DEFAULT_PARAMS, 10);
    let check = FakeHealthCheck::up();

    let code = with_timeout(execute_command(
        project.ctx.clone(),
        &check,
        &FlowCommand::Stages { fail_once: false },
    ))
    .await
    .unwrap();

    assert_eq!(code, EXIT_OK);
    assert_eq!(check.calls(), 1);
    assert!(layout.metrics().exists());
}

#[tokio::test]
async fn metrics_summary_fails_once_when_report_is_missing() {
    init_tracing();
    let project = TestProject::new();
    let metrics_path = project.ctx.layout().metrics();

    let mut task = Task::new("metrics summary")
        .with_retry(RetryPolicy::new(3, FAST_RETRY).unwrap())
        .with_body(TaskBody::native(move || metrics_summary(&metrics_path)));

    match with_timeout(task.execute()).await {
        TaskOutcome::Failed {
            reason,
            attempts_used,
        } => {
            assert_eq!(attempts_used, 1);
            assert!(reason.contains("Artifact not found"), "{reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn metrics_summary_reads_an_existing_report() {
    init_tracing();
    let project = TestProject::new();
    write_metrics_report(
        project.ctx.layout(),
        "{\"f1_macro\": 0.9, \"accuracy\": 0.95}\n",
    );

    metrics_summary(&project.ctx.layout().metrics()).unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn repro_flow_retries_the_command_once() {
    init_tracing();
    let project = TestProject::new();
    write_metrics_report(project.ctx.layout(), "{\"accuracy\": 1.0, \"f1_macro\": 1.0}\n");

    let opts = ReproOptions {
        fail_once: true,
        show_metrics: true,
        command: vec!["sh".into(), "-c".into(), "echo reproduced".into()],
        retry_delay: FAST_RETRY,
    };
    let flow = repro_flow(&project.ctx, &opts).unwrap();
    let result = with_timeout(flow.execute()).await;

    assert!(result.is_success(), "{result:?}");
    assert_eq!(result.len(), 2);
    assert!(project.markers.is_set(REPRO_FAIL_ONCE_KEY).unwrap());
    assert_eq!(project.sink.lines(), vec!["reproduced".to_string()]);
}

#[cfg(unix)]
#[tokio::test]
async fn repro_flow_skips_summary_unless_requested() {
    init_tracing();
    let project = TestProject::new();

    let opts = ReproOptions {
        command: vec!["true".into()],
        retry_delay: FAST_RETRY,
        ..ReproOptions::default()
    };
    let result = with_timeout(repro_flow(&project.ctx, &opts).unwrap().execute()).await;

    assert!(result.is_success());
    assert_eq!(result.len(), 1);
    assert!(result.outcome_of("metrics summary").is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn failing_repro_command_fails_the_flow() {
    init_tracing();
    let project = TestProject::new();

    let code = with_timeout(execute_command(
        project.ctx.clone(),
        &FakeHealthCheck::up(),
        &FlowCommand::Repro {
            fail_once: false,
            show_metrics: true,
            command: Some(vec!["false".into()]),
        },
    ))
    .await
    .unwrap();

    assert_eq!(code, EXIT_FAILURE);
}
