//! Supervisor: spawns one worker process per submission and drives the
//! IPC protocol to completion (spec.md §4.5/§5).

mod current;
mod supervisor;

pub use supervisor::Supervisor;
