//! Per-submission worker process (spec.md §4.5): grading loop plus a
//! background abort listener sharing the same duplex socket.

mod abort_listener;
mod compile;
mod entrypoint;
mod worker;

pub use entrypoint::worker_entrypoint;
pub use worker::run_worker;
