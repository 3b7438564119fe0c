//! Error taxonomy shared across the grading engine (spec.md §7).
//!
//! Each crate boundary gets its own concrete error enum; this module only
//! defines the leaf error types that are common to more than one crate, plus
//! the top-level [`JudgeError`] the supervisor ultimately surfaces to callers.

use std::fmt;

/// Bounded, expected failure: the submission did not compile.
///
/// Terminates grading cleanly and surfaces as `COMPILE_ERROR` on the wire.
#[derive(Debug, Clone, thiserror::Error)]
#[error("compile error")]
pub struct CompileError {
    /// Compiler stdout/stderr, truncated to `compiler_output_character_limit`.
    pub message: Vec<u8>,
}

impl CompileError {
    pub fn new(message: impl Into<Vec<u8>>) -> Self {
        Self { message: message.into() }
    }
}

/// Raised while draining a child's stdout/stderr past the configured cap.
#[derive(Debug, Clone, Copy, Default, thiserror::Error)]
#[error("output limit exceeded")]
pub struct OutputLimitExceeded;

/// Programmer or environment bug (e.g. a symlink escaping the working
/// directory). Bubbles up to `UNHANDLED_EXCEPTION`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("internal error: {0}")]
pub struct InternalError(pub String);

impl InternalError {
    pub fn new(msg: impl fmt::Display) -> Self {
        Self(msg.to_string())
    }
}

/// Supervisor-level: the worker did not send a message before the receive
/// deadline (`max(60s, 2 * time_limit)`) elapsed.
#[derive(Debug, Clone, Copy, Default, thiserror::Error)]
#[error("worker timed out")]
pub struct TimeoutError;

/// The worker emitted an event sequence that does not match the grammar in
/// spec.md §8 invariant 1.
#[derive(Debug, Clone, thiserror::Error)]
#[error("protocol violation: {0}")]
pub struct ProtocolViolation(pub String);

/// Top-level error the supervisor's public API surfaces to its caller.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Internal(#[from] InternalError),
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode IPC payload: {0}")]
    Decode(String),
}
