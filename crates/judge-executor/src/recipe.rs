//! The per-language executor contract (spec.md §4.2), grounded on
//! `dmoj/executors/base_executor.py` (`BaseExecutor`) and
//! `dmoj/executors/compiled_executor.py` (`CompiledExecutor`).

use std::path::Path;
use std::process::Command;

use judge_common::{CompiledArtifact, Environment, GradeResult, JudgeError};

use crate::version::RuntimeVersion;

/// A language recipe: knows how to turn submission source into a launchable
/// command. One implementation per supported language; registered once in
/// an [`crate::registry::ExecutorRegistry`].
///
/// Compiled and interpreted languages share this contract: an interpreted
/// recipe's `compile` is typically a cheap no-op that just writes the
/// source to a file and returns it as the "artifact".
pub trait ExecutorRecipe: Send + Sync {
    /// Stable identity used both for error messages and as half of the
    /// artifact cache key (spec.md §4.6: `executor_identity || binary_cache_key`).
    fn name(&self) -> &str;

    /// `true` for recipes whose `compile` does real work worth caching
    /// (gcc, javac, ...); `false` for recipes that merely stage source
    /// (python, a shell script).
    fn is_compiled(&self) -> bool;

    /// The part of the cache key this recipe contributes beyond its own
    /// `name()` — defaults to `problem_id ‖ source` (spec.md §4.2) so that
    /// two problems whose submitted source happens to collide (e.g. a
    /// shared boilerplate stub) don't share a cached binary; a recipe may
    /// fold in more, e.g. its own compiler flags.
    fn binary_cache_key(&self, problem_id: &str, source: &[u8]) -> Vec<u8> {
        let mut key = problem_id.as_bytes().to_vec();
        key.extend_from_slice(source);
        key
    }

    /// Compile (or stage) `source` into a working directory under
    /// `workdir`, returning the resulting artifact. Errors here are always
    /// surfaced as `COMPILE_ERROR`, never `UNHANDLED_EXCEPTION` — a
    /// submission that fails to build is an expected outcome, not a bug.
    fn compile(&self, source: &[u8], workdir: &Path, env: &Environment) -> Result<CompiledArtifact, JudgeError>;

    /// Build (but do not spawn) the command that runs `artifact`. The
    /// caller is responsible for stdio wiring and for installing resource
    /// limits before exec (spec.md §4.5 launch step).
    fn launch_command(&self, artifact: &CompiledArtifact, env: &Environment) -> Result<Command, JudgeError>;

    /// Release any resources the recipe itself owns outside of `artifact`'s
    /// directory (e.g. a scratch mount). Called exactly once per submission,
    /// after the last case has been graded or grading was aborted.
    fn cleanup(&self, _artifact: &CompiledArtifact) {}

    /// Probe the toolchain(s) this recipe depends on (spec.md §4.2 version
    /// probing). Never fails: an unprobeable toolchain just yields an empty
    /// list.
    fn runtime_versions(&self, env: &Environment) -> Vec<RuntimeVersion>;

    /// Give the recipe a chance to annotate a finished case's result, e.g.
    /// with the interpreter version actually used. Default is a no-op.
    fn populate_result(&self, _artifact: &CompiledArtifact, _result: &mut GradeResult) {}

    /// A trivial `(source, expected_stdout)` fixture used to sanity-check
    /// the toolchain before the recipe is trusted with real submissions
    /// (spec.md §4.2 self-test protocol). `None` opts the recipe out.
    fn self_test_fixture(&self) -> Option<(&'static [u8], &'static [u8])> {
        None
    }
}
