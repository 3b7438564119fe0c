//! Shared data model, IPC framing, configuration and error taxonomy for the
//! judge grading engine. Every other crate in the workspace depends on this
//! one; it depends on nothing else in the workspace.

pub mod config;
pub mod error;
pub mod handoff;
pub mod ipc;
pub mod model;
pub mod problem_source;

pub use config::Environment;
pub use error::{CompileError, InternalError, JudgeError, OutputLimitExceeded, ProtocolViolation, TimeoutError};
pub use handoff::WorkerHandoff;
pub use ipc::IpcMessage;
pub use model::{
    Batch, CaseRef, CheckerRef, CompiledArtifact, GradeResult, GraderClass, PlainCase, Problem,
    Real, ResultFlags, Submission, TestCase,
};
pub use problem_source::{ProblemSource, StaticProblemSource};
