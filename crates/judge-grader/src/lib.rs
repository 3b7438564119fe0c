//! Standard per-case grading loop (spec.md §4.3/§4.4/§4.5).

mod grader;
mod limits;
mod runner;
mod rusage;
mod symlinks;

pub use grader::StandardGrader;
pub use runner::{kill_by_pid, run_case, CurrentPid, RunOutcome, OUTPUT_LIMIT_BYTES};
pub use symlinks::create_symlinks;
