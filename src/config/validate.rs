// src/config/validate.rs

use std::time::Duration;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{FlowFile, FlowTask, RawFlowFile};
use crate::errors::{FlowdagError, Result};
use crate::task::RetryPolicy;

impl TryFrom<RawFlowFile> for FlowFile {
    type Error = FlowdagError;

    fn try_from(raw: RawFlowFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_flow_file(&raw)?;
        let order = execution_order(&raw)?;

        let mut task = raw.task;
        let mut tasks = Vec::with_capacity(order.len());
        for name in order {
            let Some(cfg) = task.remove(&name) else {
                continue;
            };
            let delay = match cfg.retry_delay.as_deref() {
                Some(s) => parse_duration(s).map_err(|e| {
                    FlowdagError::ConfigError(format!("task '{name}': retry_delay: {e}"))
                })?,
                None => Duration::ZERO,
            };
            tasks.push(FlowTask {
                policy: RetryPolicy::with_retries(cfg.retries, delay),
                name,
                cmd: cfg.cmd,
                description: cfg.description,
                cwd: cfg.cwd,
                after: cfg.after,
                enabled: cfg.enabled,
                fail_once: cfg.fail_once,
            });
        }

        Ok(FlowFile::new_unchecked(raw.flow.name, tasks))
    }
}

fn validate_raw_flow_file(cfg: &RawFlowFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_task_fields(cfg)?;
    validate_task_dependencies(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawFlowFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(FlowdagError::ConfigError(
            "flow file must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_fields(cfg: &RawFlowFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(FlowdagError::ConfigError(format!(
                "task '{}' has an empty `cmd`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawFlowFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == name {
                return Err(FlowdagError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(FlowdagError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

/// Task names in an order where every task follows its dependencies.
///
/// Edge direction is dep -> task, so for `[task.B] after = ["A"]` we add
/// `A -> B`. Fails with [`FlowdagError::DagCycle`] if no such order exists.
pub fn execution_order(cfg: &RawFlowFile) -> Result<Vec<String>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(FlowdagError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                node
            )))
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_text: &str) -> RawFlowFile {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn durations_accept_known_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 2s "), Ok(Duration::from_secs(2)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("5d").is_err());
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        let err = parse_duration("6000000000000000h").unwrap_err();
        assert!(err.contains("too large"), "{err}");
    }

    #[test]
    fn oversized_retry_delay_is_a_config_error() {
        let err = FlowFile::try_from(raw(
            r#"
[task.a]
cmd = "true"
retry_delay = "6000000000000000h"
"#,
        ))
        .unwrap_err();
        assert!(matches!(err, FlowdagError::ConfigError(msg) if msg.contains("too large")));
    }

    #[test]
    fn retries_and_delay_become_a_policy() {
        let file = FlowFile::try_from(raw(
            r#"
[task.a]
cmd = "true"
retries = 2
retry_delay = "500ms"
"#,
        ))
        .unwrap();

        let policy = file.task("a").unwrap().policy;
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_millis(500));
        assert_eq!(file.name, "flowfile");
    }

    #[test]
    fn bad_retry_delay_is_a_config_error() {
        let err = FlowFile::try_from(raw(
            r#"
[task.a]
cmd = "true"
retry_delay = "soon"
"#,
        ))
        .unwrap_err();
        assert!(matches!(err, FlowdagError::ConfigError(msg) if msg.contains("retry_delay")));
    }

    #[test]
    fn empty_flow_file_is_rejected() {
        let err = FlowFile::try_from(raw("[flow]\nname = \"x\"\n")).unwrap_err();
        assert!(matches!(err, FlowdagError::ConfigError(_)));
    }
}
