//! Resource limit installation for a freshly-forked child, applied via
//! `pre_exec` (spec.md §4.5 launch step). The wall-clock deadline enforced
//! by [`crate::grader`] remains the authoritative TLE signal, matching
//! `dmoj/graders/standard.py::_interact_with_process`'s
//! `subprocess.TimeoutExpired` handling; `RLIMIT_CPU` here is a generous
//! backstop against a process that ignores SIGKILL delivery races.
use std::io;

use nix::sys::resource::{setrlimit, Resource};

/// Installs `RLIMIT_AS` (address space, bounding resident memory) and a
/// `RLIMIT_CPU` backstop. Must run after fork, before exec.
pub fn install_rlimits(memory_limit_kb: u64, cpu_limit_secs: u64) -> io::Result<()> {
    let bytes = memory_limit_kb.saturating_mul(1024);
    setrlimit(Resource::RLIMIT_AS, bytes, bytes).map_err(to_io_error)?;
    let cpu = cpu_limit_secs.max(1);
    setrlimit(Resource::RLIMIT_CPU, cpu, cpu).map_err(to_io_error)?;
    Ok(())
}

fn to_io_error(err: nix::Error) -> io::Error {
    io::Error::from_raw_os_error(err as i32)
}
