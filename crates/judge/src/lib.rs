//! Online-judge grading engine (spec.md).
//!
//! This crate is a thin facade re-exporting the public surface of each
//! workspace member. Embedding applications typically only need this
//! crate plus their own [`judge_common::ProblemSource`] and
//! [`judge_executor::ExecutorRecipe`] implementations.

pub use judge_cache::{ArtifactCache, CacheKey};
pub use judge_checker::{Checker, CheckerOptions, CheckerRegistry, CheckerResult, IdenticalChecker, StandardChecker};
pub use judge_common::{
    Batch, CaseRef, CheckerRef, CompiledArtifact, Environment, GradeResult, GraderClass, InternalError, IpcMessage,
    JudgeError, PlainCase, Problem, ProblemSource, Real, ResultFlags, StaticProblemSource, Submission, TestCase,
    WorkerHandoff,
};
pub use judge_executor::{probe_version, ExecutorInstance, ExecutorRecipe, ExecutorRegistry, RuntimeVersion};
pub use judge_grader::{run_case, CurrentPid, RunOutcome, StandardGrader};
pub use judge_supervisor::Supervisor;
