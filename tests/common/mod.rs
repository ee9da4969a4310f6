#![allow(dead_code)]

pub use flowdag_test_utils::builders;
pub use flowdag_test_utils::fixtures;
pub use flowdag_test_utils::{FakeHealthCheck, RecordingSink, init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use flowdag::backend::BackendConfig;
use flowdag::flows::FlowContext;
use flowdag::task::{MarkerStore, MemoryMarkerStore};
use tempfile::TempDir;

/// A throwaway project root with a resolved backend and in-memory markers.
pub struct TestProject {
    pub dir: TempDir,
    pub ctx: FlowContext,
    pub markers: Arc<MemoryMarkerStore>,
    pub sink: RecordingSink,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = BackendConfig::for_project(dir.path()).expect("resolve backend");
        let markers = Arc::new(MemoryMarkerStore::new());
        let sink = RecordingSink::new();
        let ctx = FlowContext::new(backend)
            .with_markers(Arc::clone(&markers) as Arc<dyn MarkerStore>)
            .with_sink(Arc::new(sink.clone()));
        Self {
            dir,
            ctx,
            markers,
            sink,
        }
    }
}

/// Retry delay short enough to keep tests fast.
pub const FAST_RETRY: Duration = Duration::from_millis(10);
