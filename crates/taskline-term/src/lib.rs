//! Live terminal progress rendering for concurrent named tasks.
//!
//! One status line per task (spinner/✔/✘ + title), optionally followed by a
//! bounded tail of the task's recent output, repainted in place on every
//! tick; finished and hidden tasks' output scrolls back above the live
//! region instead. Producer threads log through [`Task`] handles while the
//! [`OutputManager`]'s render loop turns the shared state into frames, so
//! logging never waits on rendering.
//!
//! # Quickstart
//!
//! ```no_run
//! use taskline_term::OutputManager;
//!
//! # fn main() -> taskline_term::Result<()> {
//! let manager = OutputManager::builder()
//!     .keep_output(true)
//!     .keep_completed_summary(true)
//!     .build()?;
//! manager.start()?;
//!
//! let task = manager.create_task("fetch", "fetching sources")?;
//! task.infoln("resolving index");
//! task.set_status("fetching sources (3/12)");
//! manager.complete_task("fetch");
//!
//! manager.stop();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod manager;
pub mod style;
pub mod terminal;

pub use error::{Error, Result};
pub use manager::{
    DEFAULT_REFRESH_INTERVAL, DEFAULT_TASK_TAIL_ROWS, OutputManager, OutputManagerBuilder,
    SizeProbe, TaskOptions,
};
pub use taskline_core::{Task, TaskConfig, TaskRegistry, TaskWriter, Verbosity};
