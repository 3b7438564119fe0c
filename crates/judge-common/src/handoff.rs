//! Submission hand-off from supervisor to worker process.
//!
//! spec.md's worker flow assumes the submission and its resolved problem
//! data are already available to the freshly-spawned worker; on-disk
//! problem format parsing is out of scope (spec.md §2 Non-goals), but
//! *something* has to carry the already-resolved [`Problem`] across the
//! process boundary once the supervisor's caller has produced it via a
//! [`crate::ProblemSource`]. We do that with a small encoded file instead
//! of inventing a new IPC tag, keeping the wire event grammar in spec.md §5
//! exactly as specified (`HELLO` really is the worker's first event).

use std::io;
use std::path::Path;

use codec::{Decode, Encode};

use crate::model::{Problem, Submission};

#[derive(Debug, Clone, Encode, Decode)]
pub struct WorkerHandoff {
    pub submission: Submission,
    pub problem: Problem,
}

impl WorkerHandoff {
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.encode())
    }

    pub fn read_from_file(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        WorkerHandoff::decode(&mut &bytes[..])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }
}
