// src/flows/file.rs

use crate::config::FlowFile;
use crate::errors::Result;
use crate::exec::Command;
use crate::flow::Flow;
use crate::flows::FlowContext;
use crate::task::{FailOnce, Task, TaskBody};

/// Build a flow running the file's shell tasks in dependency order.
///
/// Fail-once markers are keyed by flow and task name so two flow files do not
/// share a marker.
pub fn file_flow(ctx: &FlowContext, file: &FlowFile) -> Result<Flow> {
    let root = ctx.layout().root();
    let mut flow = Flow::new(file.name.clone());

    for entry in &file.tasks {
        let cwd = match &entry.cwd {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        };
        let command = Command::shell(&entry.cmd, cwd)?;

        let mut task = Task::new(entry.name.clone())
            .with_description(entry.description.clone().unwrap_or_else(|| entry.cmd.clone()))
            .with_retry(entry.policy)
            .with_body(TaskBody::shell(command))
            .with_runner(ctx.runner())
            .enabled(entry.enabled);
        if entry.fail_once {
            let key = format!("flowdag_{}_{}_fail_once", file.name, entry.name);
            task = task.with_fail_once(FailOnce::new(ctx.markers(), key));
        }

        flow = flow.add(task);
    }

    Ok(flow)
}
