//! Concrete implementations behind the harness traits

pub mod mock_launcher;
pub mod observability;
pub mod task_counter;

pub use mock_launcher::RealMockLauncher;
pub use observability::{RecordedSpan, TestMeter, TestTracer};
pub use task_counter::RuntimeTaskCounter;
