//! Background abort listener (spec.md §4.5/§5): a second concurrent
//! activity reading the same duplex socket as the grading loop writes to,
//! watching for `REQUEST_ABORT` while the main thread may be blocked
//! inside a single case's run.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use judge_common::ipc::{recv_blocking, IpcMessage};
use judge_grader::{kill_by_pid, CurrentPid};

/// Spawns the listener thread. Returns its `JoinHandle`; the worker joins
/// it after the grading loop finishes (the peer closing its write half
/// unblocks the listener's final `recv_blocking` with a clean EOF).
pub fn spawn<R>(mut reader: R, abort: Arc<AtomicBool>, current_pid: CurrentPid) -> std::thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || loop {
        match recv_blocking(&mut reader) {
            Ok(Some(IpcMessage::RequestAbort)) => {
                abort.store(true, Ordering::SeqCst);
                if let Some(pid) = *current_pid.lock().unwrap() {
                    kill_by_pid(pid);
                }
            }
            Ok(Some(IpcMessage::Bye)) => return,
            Ok(Some(_)) => {
                // The supervisor only ever sends REQUEST_ABORT or BYE;
                // anything else is ignored rather than treated as fatal.
            }
            Ok(None) => return,
            Err(_) => return,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_common::ipc::send_blocking;
    use std::os::unix::net::UnixStream;

    #[test]
    fn returns_on_an_explicit_bye_without_waiting_for_eof() {
        let (mut local, remote) = UnixStream::pair().unwrap();
        let abort = Arc::new(AtomicBool::new(false));
        let current_pid = Arc::new(std::sync::Mutex::new(None));

        let handle = spawn(remote, Arc::clone(&abort), current_pid);

        send_blocking(&mut local, &IpcMessage::Bye).unwrap();
        // the stream is left open deliberately: the listener must return on
        // the BYE payload itself, not because its peer went away.
        handle.join().unwrap();
        assert!(!abort.load(Ordering::SeqCst));
    }
}
