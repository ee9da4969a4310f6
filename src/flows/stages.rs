// src/flows/stages.rs

use std::time::Duration;

use crate::flow::Flow;
use crate::flows::FlowContext;
use crate::pipeline::{self, load_params};
use crate::task::{FailOnce, RetryPolicy, Task, TaskBody};

pub const TRAIN_FAIL_ONCE_KEY: &str = "flowdag_train_fail_once";

#[derive(Debug, Clone)]
pub struct StageOptions {
    /// Fail the first train attempt ever made against the marker store.
    pub fail_once: bool,
    pub retry_delay: Duration,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            fail_once: false,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// `prepare -> train -> evaluate`, each reading `params.toml` afresh.
/// Only `train` retries (once).
pub fn stage_flow(ctx: &FlowContext, opts: &StageOptions) -> Flow {
    let layout = ctx.layout().clone();

    let prepare = {
        let l = layout.clone();
        Task::new("prepare")
            .with_description("prepare train/test splits")
            .with_body(TaskBody::native(move || {
                let params = load_params(&l.params())?;
                pipeline::prepare(&l.raw_data(), &l.train_data(), &l.test_data(), &params)
            }))
    };

    let mut train = {
        let l = layout.clone();
        Task::new("train")
            .with_description("train model")
            .with_retry(RetryPolicy::with_retries(1, opts.retry_delay))
            .with_body(TaskBody::native(move || {
                let params = load_params(&l.params())?;
                pipeline::train(&l.train_data(), &l.model(), &params)
            }))
    };
    if opts.fail_once {
        train = train.with_fail_once(FailOnce::new(ctx.markers(), TRAIN_FAIL_ONCE_KEY));
    }

    let evaluate = {
        let l = layout;
        Task::new("evaluate")
            .with_description("evaluate model")
            .with_body(TaskBody::native(move || {
                let params = load_params(&l.params())?;
                pipeline::evaluate(&l.test_data(), &l.model(), &l.metrics(), &params)?;
                Ok(())
            }))
    };

    Flow::new("stages").add(prepare).add(train).add(evaluate)
}
