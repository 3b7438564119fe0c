//! CPU time and peak memory accounting via `getrusage(RUSAGE_CHILDREN)`,
//! grounded on the prepare-worker's own getrusage-based CPU accounting.
//!
//! Cases are run strictly one at a time within a worker process, so the
//! cumulative `RUSAGE_CHILDREN` counters before and after a single case's
//! child reflect exactly that child's usage.

use std::mem::MaybeUninit;

#[derive(Debug, Clone, Copy, Default)]
pub struct Rusage {
    pub cpu_time_secs: f64,
    pub max_memory_kb: u64,
}

fn read_rusage_children() -> Rusage {
    unsafe {
        let mut usage = MaybeUninit::<libc::rusage>::zeroed();
        if libc::getrusage(libc::RUSAGE_CHILDREN, usage.as_mut_ptr()) != 0 {
            return Rusage::default();
        }
        let usage = usage.assume_init();
        let user = usage.ru_utime.tv_sec as f64 + usage.ru_utime.tv_usec as f64 / 1_000_000.0;
        let sys = usage.ru_stime.tv_sec as f64 + usage.ru_stime.tv_usec as f64 / 1_000_000.0;
        // ru_maxrss is KiB on Linux, bytes on macOS; the workspace targets Linux workers.
        Rusage { cpu_time_secs: user + sys, max_memory_kb: usage.ru_maxrss as u64 }
    }
}

/// Captures a baseline before spawning the case's child.
pub fn baseline() -> Rusage {
    read_rusage_children()
}

/// Diffs the post-wait reading against `before` to get this child's usage.
/// `max_memory_kb` is not diffed (it is already the peak across the single
/// child that ran since `before`).
pub fn since(before: Rusage) -> Rusage {
    let after = read_rusage_children();
    Rusage {
        cpu_time_secs: (after.cpu_time_secs - before.cpu_time_secs).max(0.0),
        max_memory_kb: after.max_memory_kb,
    }
}
