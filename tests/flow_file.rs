// tests/flow_file.rs

mod common;
use crate::common::builders::{FlowFileBuilder, TaskConfigBuilder};
use crate::common::{TestProject, init_tracing, with_timeout};

use flowdag::config::{FlowFile, load_and_validate};
use flowdag::errors::FlowdagError;
use flowdag::flows::file_flow;

fn position(file: &FlowFile, name: &str) -> usize {
    file.task_names().position(|n| n == name).unwrap()
}

#[test]
fn tasks_come_after_their_dependencies() {
    let file = FlowFileBuilder::new("chain")
        .with_task("report", TaskConfigBuilder::new("echo report").after("train").build())
        .with_task("train", TaskConfigBuilder::new("echo train").after("fetch").build())
        .with_task("fetch", TaskConfigBuilder::new("echo fetch").build())
        .with_task("lint", TaskConfigBuilder::new("echo lint").build())
        .build();

    assert_eq!(file.tasks.len(), 4);
    assert!(position(&file, "fetch") < position(&file, "train"));
    assert!(position(&file, "train") < position(&file, "report"));
}

#[test]
fn unknown_dependency_is_rejected() {
    let raw = FlowFileBuilder::new("bad")
        .with_task("a", TaskConfigBuilder::new("true").after("ghost").build())
        .raw();

    let err = FlowFile::try_from(raw).unwrap_err();
    assert!(
        matches!(&err, FlowdagError::ConfigError(msg) if msg.contains("unknown dependency 'ghost'")),
        "got {err:?}"
    );
}

#[test]
fn self_dependency_is_rejected() {
    let raw = FlowFileBuilder::new("bad")
        .with_task("a", TaskConfigBuilder::new("true").after("a").build())
        .raw();

    let err = FlowFile::try_from(raw).unwrap_err();
    assert!(matches!(&err, FlowdagError::ConfigError(msg) if msg.contains("itself")));
}

#[test]
fn cycles_are_rejected() {
    let raw = FlowFileBuilder::new("loop")
        .with_task("a", TaskConfigBuilder::new("true").after("c").build())
        .with_task("b", TaskConfigBuilder::new("true").after("a").build())
        .with_task("c", TaskConfigBuilder::new("true").after("b").build())
        .raw();

    let err = FlowFile::try_from(raw).unwrap_err();
    assert!(matches!(err, FlowdagError::DagCycle(_)), "got {err:?}");
}

#[test]
fn loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Flowdag.toml");
    std::fs::write(
        &path,
        r#"
[flow]
name = "nightly"

[task.build]
cmd = "make"
retries = 1
retry_delay = "1s"

[task.publish]
cmd = "make publish"
after = ["build"]
enabled = false
"#,
    )
    .unwrap();

    let file = load_and_validate(&path).unwrap();
    assert_eq!(file.name, "nightly");
    assert_eq!(file.task_names().collect::<Vec<_>>(), ["build", "publish"]);
    assert!(!file.task("publish").unwrap().enabled);
    assert_eq!(file.task("build").unwrap().policy.max_attempts(), 2);
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, FlowdagError::ConfigError(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn file_flow_runs_shell_tasks_in_order() {
    init_tracing();
    let project = TestProject::new();

    let file = FlowFileBuilder::new("demo")
        .with_task("second", TaskConfigBuilder::new("echo second").after("first").build())
        .with_task("first", TaskConfigBuilder::new("echo first").build())
        .with_task(
            "skipped",
            TaskConfigBuilder::new("echo skipped").after("second").disabled().build(),
        )
        .with_task(
            "flaky",
            TaskConfigBuilder::new("echo flaky")
                .after("second")
                .retries(1, "10ms")
                .fail_once()
                .build(),
        )
        .build();

    let flow = file_flow(&project.ctx, &file).unwrap();
    let result = with_timeout(flow.execute()).await;

    assert!(result.is_success(), "{result:?}");
    let names: Vec<&str> = result.outcomes().iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["first", "second", "flaky"]);
    assert_eq!(
        project.sink.lines(),
        vec!["first".to_string(), "second".to_string(), "flaky".to_string()]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn file_tasks_see_the_backend_environment() {
    init_tracing();
    let project = TestProject::new();

    let file = FlowFileBuilder::new("env")
        .with_task("show", TaskConfigBuilder::new("echo \"$FLOWDAG_API_URL\"").build())
        .build();

    let result = with_timeout(file_flow(&project.ctx, &file).unwrap().execute()).await;

    assert!(result.is_success());
    assert_eq!(project.sink.lines(), vec!["http://127.0.0.1:4200/api".to_string()]);
}
