//! Resource-limit backstop for a compiler child, installed via `pre_exec`.
//! Kept independent of `judge-grader`'s own `limits.rs` (cases and compiles
//! are limited from different crates; this one exists so `judge-executor`
//! doesn't have to depend on `judge-grader`).

use std::io;

use nix::sys::resource::{setrlimit, Resource};

/// Bounds a compiler child's address space and the size of any file it
/// writes (the produced binary, object files, ...) to `compiler_size_limit`.
/// The wall-clock deadline a caller enforces around the child remains the
/// authoritative timeout; this is a backstop against a compiler that
/// allocates or writes unboundedly before ever reaching it.
pub fn install_compile_rlimits(size_limit_bytes: u64) -> io::Result<()> {
    setrlimit(Resource::RLIMIT_AS, size_limit_bytes, size_limit_bytes).map_err(to_io_error)?;
    setrlimit(Resource::RLIMIT_FSIZE, size_limit_bytes, size_limit_bytes).map_err(to_io_error)?;
    Ok(())
}

fn to_io_error(err: nix::Error) -> io::Error {
    io::Error::from_raw_os_error(err as i32)
}
