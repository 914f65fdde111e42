//! Live-task counting backed by the tokio runtime

use std::fmt::Write;
use tokio::runtime::Handle;

use crate::error::{HarnessError, HarnessResult, SetupStep};
use crate::traits::TaskCounter;

/// Counts tasks alive on a tokio runtime
pub struct RuntimeTaskCounter {
    handle: Handle,
}

impl RuntimeTaskCounter {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Counter for the runtime the caller is running on
    pub fn current() -> HarnessResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| HarnessError::setup(SetupStep::TaskCounter, e))
    }
}

impl TaskCounter for RuntimeTaskCounter {
    fn live_tasks(&self) -> usize {
        self.handle.metrics().num_alive_tasks()
    }

    fn dump(&self) -> String {
        let metrics = self.handle.metrics();
        let mut out = String::new();
        let _ = writeln!(out, "runtime flavor: {:?}", self.handle.runtime_flavor());
        let _ = writeln!(out, "workers: {}", metrics.num_workers());
        let _ = writeln!(out, "alive tasks: {}", metrics.num_alive_tasks());
        let _ = writeln!(out, "global queue depth: {}", metrics.global_queue_depth());

        let threads = thread_names();
        let _ = writeln!(out, "threads: {}", threads.len());
        for name in threads {
            let _ = writeln!(out, "  {name}");
        }
        out
    }
}

/// Names of the threads of this process
#[cfg(target_os = "linux")]
fn thread_names() -> Vec<String> {
    let Ok(entries) = std::fs::read_dir("/proc/self/task") else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| {
            let tid = entry.file_name().to_string_lossy().into_owned();
            let comm = std::fs::read_to_string(entry.path().join("comm")).unwrap_or_default();
            format!("{tid} {}", comm.trim())
        })
        .collect();
    names.sort();
    names
}

#[cfg(not(target_os = "linux"))]
fn thread_names() -> Vec<String> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_current_outside_runtime_fails() {
        let err = RuntimeTaskCounter::current().err().unwrap();
        assert!(err.is_environment_setup());
    }

    #[tokio::test]
    async fn test_counts_spawned_tasks() {
        let counter = RuntimeTaskCounter::current().unwrap();
        let baseline = counter.live_tasks();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _ = rx.await;
        });
        assert_eq!(counter.live_tasks(), baseline + 1);

        tx.send(()).unwrap();
        task.await.unwrap();
        for _ in 0..100 {
            if counter.live_tasks() == baseline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(counter.live_tasks(), baseline);
    }

    #[tokio::test]
    async fn test_dump_mentions_alive_tasks() {
        let counter = RuntimeTaskCounter::current().unwrap();
        let dump = counter.dump();
        assert!(dump.contains("alive tasks:"));
        assert!(dump.contains("workers:"));
    }
}
