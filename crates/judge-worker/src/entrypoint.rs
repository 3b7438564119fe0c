//! Wires a connected socket, the handoff file and a recipe/checker
//! registry into a full worker run (spec.md §4.5).

use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use judge_checker::CheckerRegistry;
use judge_common::{Environment, WorkerHandoff};
use judge_executor::ExecutorRegistry;

use crate::abort_listener;
use crate::worker::run_worker;

/// Connects to `socket_path`, reads the handoff at `handoff_path`, and
/// grades it to completion. This is the function a real deployment's own
/// worker binary calls with its own [`ExecutorRegistry`]; the `judge-worker`
/// bin in this crate wires up only the reference recipes for demonstration.
pub fn worker_entrypoint(
    socket_path: &Path,
    handoff_path: &Path,
    registry: &ExecutorRegistry,
    checkers: &CheckerRegistry,
    env: &Environment,
) -> std::io::Result<()> {
    let handoff = WorkerHandoff::read_from_file(handoff_path)?;

    let stream = UnixStream::connect(socket_path)?;
    let reader = stream.try_clone()?;
    let mut writer = stream;

    let abort = Arc::new(AtomicBool::new(false));
    let current_pid: judge_grader::CurrentPid = Arc::new(Mutex::new(None));

    let listener = abort_listener::spawn(reader, Arc::clone(&abort), Arc::clone(&current_pid));

    run_worker(
        &mut writer,
        &handoff.submission,
        &handoff.problem,
        registry,
        checkers,
        env,
        &current_pid,
        &abort,
    )?;

    drop(writer);
    let _ = listener.join();
    Ok(())
}
