//! Per-submission worker lifecycle (spec.md §4.5/§5), grounded on
//! `dmoj/judge.py`'s `Judge.begin_grading`/`_do_abort`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use judge_common::config::IPC_TIMEOUT_SECS;
use judge_common::ipc::{recv_async, send_async, IpcMessage};
use judge_common::{Environment, JudgeError, Problem, ProtocolViolation, Submission, TimeoutError, WorkerHandoff};
use tokio::io::AsyncRead;
use tokio::net::UnixListener;
use tokio::sync::Mutex;

use crate::current::CurrentSubmission;

/// Owns the worker-spawning side of one grading pipeline. One `Supervisor`
/// is meant to live for the lifetime of the embedding process; submissions
/// are graded one at a time (`grading_lock`), matching spec.md §5's single
/// in-flight-submission rule.
pub struct Supervisor {
    worker_bin: PathBuf,
    env: Environment,
    grading_lock: Mutex<()>,
    current: Mutex<Option<Arc<CurrentSubmission>>>,
}

impl Supervisor {
    pub fn new(worker_bin: PathBuf, env: Environment) -> Self {
        Self { worker_bin, env, grading_lock: Mutex::new(()), current: Mutex::new(None) }
    }

    /// Grades `submission` against the already-resolved `problem`, invoking
    /// `on_event` for every IPC message in arrival order, including the
    /// terminating `BYE`. Returns once the worker process has been reaped,
    /// on every exit path (clean `BYE`, abort, or timeout) — callers never
    /// need to clean up a worker process themselves.
    pub async fn begin_grading<F>(&self, submission: Submission, problem: Problem, mut on_event: F) -> Result<(), JudgeError>
    where
        F: FnMut(IpcMessage) + Send,
    {
        let _serialize = self.grading_lock.lock().await;
        let time_limit = problem.time_limit.0;

        let workdir = tempfile::tempdir().map_err(JudgeError::Io)?;
        let socket_path = workdir.path().join("worker.sock");
        let handoff_path = workdir.path().join("handoff.bin");
        WorkerHandoff { submission: submission.clone(), problem }
            .write_to_file(&handoff_path)
            .map_err(JudgeError::Io)?;

        let listener = UnixListener::bind(&socket_path).map_err(JudgeError::Io)?;

        let child = tokio::process::Command::new(&self.worker_bin)
            .arg("--socket")
            .arg(&socket_path)
            .arg("--handoff")
            .arg(&handoff_path)
            .kill_on_drop(true)
            .spawn()
            .map_err(JudgeError::Io)?;

        let accept_deadline = Duration::from_secs_f64(self.env.receive_deadline_secs(time_limit));
        let (stream, _addr) = tokio::time::timeout(accept_deadline, listener.accept())
            .await
            .map_err(|_| JudgeError::from(TimeoutError))?
            .map_err(JudgeError::Io)?;

        let (mut read_half, write_half) = stream.into_split();

        let current = Arc::new(CurrentSubmission {
            id: submission.id,
            writer: Mutex::new(write_half),
            child: Mutex::new(child),
        });
        *self.current.lock().await = Some(Arc::clone(&current));

        let result = self.receive_loop(&mut read_half, &current, time_limit, &mut on_event).await;

        {
            let mut child_guard = current.child.lock().await;
            if result.is_err() {
                let _ = child_guard.kill().await;
            }
            let _ = child_guard.wait().await;
        }
        *self.current.lock().await = None;

        result
    }

    async fn receive_loop<R, F>(
        &self,
        reader: &mut R,
        current: &CurrentSubmission,
        time_limit: f64,
        on_event: &mut F,
    ) -> Result<(), JudgeError>
    where
        R: AsyncRead + Unpin,
        F: FnMut(IpcMessage),
    {
        let deadline = Duration::from_secs_f64(self.env.receive_deadline_secs(time_limit));
        loop {
            let message = tokio::time::timeout(deadline, recv_async(reader))
                .await
                .map_err(|_| JudgeError::from(TimeoutError))?
                .map_err(JudgeError::Io)?;

            let Some(message) = message else {
                return Err(ProtocolViolation("worker closed its socket before sending BYE".to_string()).into());
            };

            let is_bye = matches!(message, IpcMessage::Bye);
            on_event(message);
            if is_bye {
                // spec.md §4.6 step 3: acknowledge with BYE back to the
                // worker before returning, completing the handshake.
                let mut writer = current.writer.lock().await;
                send_async(&mut *writer, &IpcMessage::Bye).await.map_err(JudgeError::Io)?;
                return Ok(());
            }
        }
    }

    /// Requests the in-flight submission abort (spec.md §5 `REQUEST_ABORT`).
    /// A no-op if nothing is being graded. Sends the request and schedules
    /// a background hard-kill after `IPC_TIMEOUT_SECS` in case the worker
    /// never reacts; `begin_grading`'s own receive loop reaps the process
    /// either way once it exits.
    pub async fn abort_grading(&self) -> Result<(), JudgeError> {
        let Some(current) = self.current.lock().await.clone() else { return Ok(()) };

        {
            let mut writer = current.writer.lock().await;
            send_async(&mut *writer, &IpcMessage::RequestAbort).await.map_err(JudgeError::Io)?;
        }

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs_f64(IPC_TIMEOUT_SECS)).await;
            let mut child = current.child.lock().await;
            if matches!(child.try_wait(), Ok(None)) {
                tracing::warn!(id = current.id, "worker did not exit after abort; hard-killing");
                let _ = child.kill().await;
            }
        });

        Ok(())
    }

    /// The id of the submission currently being graded, if any.
    pub async fn current_submission_id(&self) -> Option<u64> {
        self.current.lock().await.as_ref().map(|c| c.id)
    }
}
