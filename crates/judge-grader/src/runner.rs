//! Launches one case's process and drives it to completion under a
//! wall-clock deadline, grounded on
//! `dmoj/graders/standard.py::_launch_process`/`_interact_with_process`.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::os::unix::process::CommandExt;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use judge_common::{JudgeError, ResultFlags};
use judge_executor::ExecutorInstance;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::limits::install_rlimits;
use crate::rusage;
use crate::symlinks::create_symlinks;

/// Output bytes retained before a case is flagged `OLE` and killed.
pub const OUTPUT_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// Slot the worker's abort-listener thread reaches into to kill whatever
/// case is currently running (spec.md §4.5/§5 `REQUEST_ABORT` handling).
pub type CurrentPid = Arc<Mutex<Option<i32>>>;

pub struct RunOutcome {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub wall_clock_time_secs: f64,
    pub cpu_time_secs: f64,
    pub max_memory_kb: u64,
    pub flags: ResultFlags,
}

/// Runs `instance` against `input`, killing it if `wall_limit_secs` elapses,
/// `abort` flips true, or it breaches the output cap. `memory_limit_kb`/
/// `cpu_limit_secs` are installed as hard rlimits in the child before exec.
/// `symlinks` are created under a fresh per-case working directory before
/// the process is launched (spec.md §4.1 "Symlink setup").
#[allow(clippy::too_many_arguments)]
pub fn run_case(
    instance: &ExecutorInstance,
    env: &judge_common::Environment,
    input: &[u8],
    symlinks: &BTreeMap<String, String>,
    memory_limit_kb: u64,
    cpu_limit_secs: u64,
    wall_limit_secs: f64,
    current_pid: &CurrentPid,
    abort: &AtomicBool,
) -> Result<RunOutcome, JudgeError> {
    let workdir = tempfile::tempdir().map_err(JudgeError::Io)?;
    create_symlinks(workdir.path(), symlinks)?;

    let mut command = instance.launch_command(env)?;
    command
        .current_dir(workdir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // SAFETY: the closure only calls async-signal-safe libc functions
    // (setrlimit) between fork and exec.
    unsafe {
        command.pre_exec(move || install_rlimits(memory_limit_kb, cpu_limit_secs));
    }

    let rusage_before = rusage::baseline();
    let mut child = command.spawn().map_err(JudgeError::Io)?;
    *current_pid.lock().unwrap() = Some(child.id() as i32);

    let mut stdin = child.stdin.take().expect("piped stdin");
    let input_owned = input.to_vec();
    let stdin_thread = std::thread::spawn(move || {
        let _ = stdin.write_all(&input_owned);
    });

    let output_limit_hit = Arc::new(AtomicBool::new(false));
    let mut stdout = child.stdout.take().expect("piped stdout");
    let stdout_thread = {
        let output_limit_hit = Arc::clone(&output_limit_hit);
        std::thread::spawn(move || drain_capped(&mut stdout, OUTPUT_LIMIT_BYTES, Some(&output_limit_hit)))
    };

    let mut stderr = child.stderr.take().expect("piped stderr");
    let stderr_thread = std::thread::spawn(move || drain_capped(&mut stderr, OUTPUT_LIMIT_BYTES, None).0);

    let start = Instant::now();
    let deadline = start + Duration::from_secs_f64(wall_limit_secs.max(0.0));
    let mut flags = ResultFlags::empty();

    let status = loop {
        if abort.load(Ordering::SeqCst) {
            kill_child(&mut child, current_pid);
            break child.wait().map_err(JudgeError::Io)?;
        }
        if output_limit_hit.load(Ordering::SeqCst) {
            flags |= ResultFlags::OLE;
            kill_child(&mut child, current_pid);
            break child.wait().map_err(JudgeError::Io)?;
        }
        if let Some(status) = child.try_wait().map_err(JudgeError::Io)? {
            break status;
        }
        if Instant::now() >= deadline {
            flags |= ResultFlags::TLE;
            kill_child(&mut child, current_pid);
            break child.wait().map_err(JudgeError::Io)?;
        }
        std::thread::sleep(Duration::from_millis(5));
    };
    let wall_clock_time_secs = start.elapsed().as_secs_f64();
    *current_pid.lock().unwrap() = None;

    let _ = stdin_thread.join();
    let (stdout_bytes, truncated) = stdout_thread.join().unwrap_or_default();
    let mut stderr_bytes = stderr_thread.join().unwrap_or_default();
    if truncated {
        flags |= ResultFlags::OLE;
    }

    // spec.md §4.4 step 4: on a limit kill, the recorded stderr is empty,
    // not whatever happened to be captured before the kill landed.
    if flags.intersects(ResultFlags::TLE | ResultFlags::OLE) {
        stderr_bytes = Vec::new();
    }

    let usage = rusage::since(rusage_before);

    Ok(RunOutcome {
        status,
        stdout: stdout_bytes,
        stderr: stderr_bytes,
        wall_clock_time_secs,
        cpu_time_secs: usage.cpu_time_secs,
        max_memory_kb: usage.max_memory_kb,
        flags,
    })
}

fn kill_child(child: &mut std::process::Child, current_pid: &CurrentPid) {
    let _ = child.kill();
    *current_pid.lock().unwrap() = None;
}

/// Also exposed so the worker's abort thread can kill a case without
/// racing the grader's own `child.kill()` above: it signals by pid instead
/// of owning the `Child`.
pub fn kill_by_pid(pid: i32) {
    let _ = kill(Pid::from_raw(pid), Signal::SIGKILL);
}

/// Drains `reader` into a capped buffer, flipping `limit_hit` the instant
/// the cap is breached so the caller's poll loop can kill the process
/// immediately instead of waiting for it to exit (or block forever) on its
/// own — spec.md §4.4 step 4 ("On output-limit-exceeded: kill...").
fn drain_capped<R: Read>(reader: &mut R, cap: usize, limit_hit: Option<&AtomicBool>) -> (Vec<u8>, bool) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return (buf, false),
            Ok(n) => {
                if buf.len() + n > cap {
                    let remaining = cap.saturating_sub(buf.len());
                    buf.extend_from_slice(&chunk[..remaining]);
                    if let Some(flag) = limit_hit {
                        flag.store(true, Ordering::SeqCst);
                    }
                    return (buf, true);
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => return (buf, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_executor::recipes::ShellRecipe;
    use judge_executor::ExecutorInstance;

    fn shell_instance(script: &[u8]) -> ExecutorInstance {
        let env = judge_common::Environment::default();
        let workdir = tempfile::tempdir().unwrap();
        let recipe: Arc<dyn judge_executor::ExecutorRecipe> = Arc::new(ShellRecipe);
        let artifact = recipe.compile(script, workdir.path(), &env).unwrap();
        // leak the workdir so the staged script outlives this helper
        std::mem::forget(workdir);
        ExecutorInstance::from_parts(recipe, artifact).unwrap()
    }

    #[test]
    fn kills_immediately_once_the_output_cap_is_breached() {
        let instance = shell_instance(b"#!/bin/sh\nyes\n");
        let env = judge_common::Environment::default();
        let current_pid = Arc::new(Mutex::new(None));
        let abort = AtomicBool::new(false);

        let outcome = run_case(&instance, &env, &[], &BTreeMap::new(), 262_144, 30, 30.0, &current_pid, &abort).unwrap();

        assert!(outcome.flags.contains(ResultFlags::OLE));
        assert!(outcome.stderr.is_empty());
        assert!(outcome.wall_clock_time_secs < 10.0, "a cap breach must be caught well before the wall deadline");
    }

    #[test]
    fn creates_declared_symlinks_under_the_case_working_directory() {
        let target_dir = tempfile::tempdir().unwrap();
        let target = target_dir.path().join("fixture.txt");
        std::fs::write(&target, b"linked\n").unwrap();

        let instance = shell_instance(b"#!/bin/sh\ncat linked.txt\n");
        let env = judge_common::Environment::default();
        let current_pid = Arc::new(Mutex::new(None));
        let abort = AtomicBool::new(false);

        let mut symlinks = BTreeMap::new();
        symlinks.insert("linked.txt".to_string(), target.to_string_lossy().to_string());

        let outcome = run_case(&instance, &env, &[], &symlinks, 262_144, 10, 5.0, &current_pid, &abort).unwrap();
        assert_eq!(outcome.stdout, b"linked\n");
    }

    #[test]
    fn rejects_a_symlink_that_escapes_the_working_directory() {
        let instance = shell_instance(b"#!/bin/sh\necho hi\n");
        let env = judge_common::Environment::default();
        let current_pid = Arc::new(Mutex::new(None));
        let abort = AtomicBool::new(false);

        let mut symlinks = BTreeMap::new();
        symlinks.insert("../escape.txt".to_string(), "/etc/passwd".to_string());

        let result = run_case(&instance, &env, &[], &symlinks, 262_144, 10, 5.0, &current_pid, &abort);
        assert!(result.is_err());
    }
}
