//! Post-run task leak detection
//!
//! After the suite and teardown, background tasks spawned by the client may
//! still be winding down. The sentinel keeps sampling the live-task count
//! until it is back at the baseline or the grace window runs out.

use std::time::Duration;
use tokio::time::{Instant, sleep};

use shared::RunStage;
use shared::{stage_error, stage_info};

use crate::traits::TaskCounter;

/// Total time allowed for tasks to settle
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_secs(1);
/// Pause between two samples
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakPolicy {
    pub grace_window: Duration,
    pub poll_interval: Duration,
}

impl Default for LeakPolicy {
    fn default() -> Self {
        Self {
            grace_window: DEFAULT_GRACE_WINDOW,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl LeakPolicy {
    pub fn with_grace_window(mut self, grace_window: Duration) -> Self {
        self.grace_window = grace_window;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// One reading of the live-task count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakSample {
    pub task_count: usize,
    pub taken_at: Instant,
}

impl LeakSample {
    pub fn take(counter: &dyn TaskCounter) -> Self {
        Self {
            task_count: counter.live_tasks(),
            taken_at: Instant::now(),
        }
    }
}

/// Outcome of a leak check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakReport {
    pub baseline: LeakSample,
    pub final_sample: LeakSample,
    pub leaked: bool,
    pub polls: u32,
}

impl LeakReport {
    pub fn summary(&self) -> String {
        format!(
            "{} before {} {} after",
            self.baseline.task_count,
            if self.leaked { "!=" } else { "==" },
            self.final_sample.task_count
        )
    }
}

/// Wait for the live-task count to return to `baseline`
///
/// The scheduler is yielded to before every sample so tasks that are about to
/// finish get a chance to. Returns as soon as a sample equals the baseline.
/// Otherwise the last sample taken once the grace window has passed decides;
/// any difference from the baseline, above or below, counts as a leak.
pub async fn detect_leak(counter: &dyn TaskCounter, baseline: LeakSample, policy: &LeakPolicy) -> LeakReport {
    let deadline = Instant::now() + policy.grace_window;
    let mut polls = 0u32;

    let final_sample = loop {
        tokio::task::yield_now().await;
        let sample = LeakSample::take(counter);
        polls += 1;

        if sample.task_count == baseline.task_count || Instant::now() >= deadline {
            break sample;
        }
        sleep(policy.poll_interval).await;
    };

    LeakReport {
        baseline,
        final_sample,
        leaked: final_sample.task_count != baseline.task_count,
        polls,
    }
}

/// Log the verdict, writing the task dump to stdout on a leak
pub fn report_verdict(report: &LeakReport, counter: &dyn TaskCounter) {
    if report.leaked {
        stage_error!(
            RunStage::LeakCheck,
            baseline = report.baseline.task_count,
            remaining = report.final_sample.task_count,
            polls = report.polls,
            "Tasks appear to have leaked ({})",
            report.summary()
        );
        println!("{}", counter.dump());
    } else {
        stage_info!(
            RunStage::LeakCheck,
            polls = report.polls,
            "No tasks appear to have leaked ({})",
            report.summary()
        );
    }
}
