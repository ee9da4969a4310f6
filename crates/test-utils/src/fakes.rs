use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use flowdag::backend::HealthCheck;
use flowdag::exec::LogSink;

/// A sink that keeps every line it receives, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// A health check with a fixed answer that counts how often it was asked.
#[derive(Debug)]
pub struct FakeHealthCheck {
    up: bool,
    calls: AtomicUsize,
}

impl FakeHealthCheck {
    pub fn up() -> Self {
        Self {
            up: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn down() -> Self {
        Self {
            up: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HealthCheck for FakeHealthCheck {
    fn is_up(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let up = self.up;
        Box::pin(async move { up })
    }

    fn target(&self) -> String {
        "http://fake.invalid/api/health".to_string()
    }
}
