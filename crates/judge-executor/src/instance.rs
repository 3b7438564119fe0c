//! A compiled recipe bound to one submission's artifact — the Rust
//! analogue of a `BaseExecutor` instance in the original source, where
//! `compile()` returns an object that is then repeatedly `launch()`ed.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use judge_common::{CompiledArtifact, Environment, GradeResult, InternalError, JudgeError};

use crate::recipe::ExecutorRecipe;
use crate::version::RuntimeVersion;

/// Binds an [`ExecutorRecipe`] to the artifact produced for one submission.
/// Cheap to clone; `artifact.binary_path` may be shared with other
/// in-flight submissions when served from the cache, so [`Self::cleanup`]
/// must only be called once grading for this submission is fully done.
pub struct ExecutorInstance {
    recipe: Arc<dyn ExecutorRecipe>,
    artifact: CompiledArtifact,
}

impl ExecutorInstance {
    /// Compiles `source` with `recipe` into `workdir`.
    pub fn compile(
        recipe: Arc<dyn ExecutorRecipe>,
        source: &[u8],
        workdir: &Path,
        env: &Environment,
    ) -> Result<Self, JudgeError> {
        let artifact = recipe.compile(source, workdir, env)?;
        validate_compiled_artifact(recipe.as_ref(), &artifact)?;
        Ok(Self { recipe, artifact })
    }

    /// Binds an already-resolved artifact (e.g. served from a cache the
    /// recipe itself knows nothing about) to `recipe`.
    pub fn from_parts(recipe: Arc<dyn ExecutorRecipe>, artifact: CompiledArtifact) -> Result<Self, JudgeError> {
        validate_compiled_artifact(recipe.as_ref(), &artifact)?;
        Ok(Self { recipe, artifact })
    }

    pub fn artifact(&self) -> &CompiledArtifact {
        &self.artifact
    }

    pub fn launch_command(&self, env: &Environment) -> Result<Command, JudgeError> {
        self.recipe.launch_command(&self.artifact, env)
    }

    pub fn populate_result(&self, result: &mut GradeResult) {
        self.recipe.populate_result(&self.artifact, result)
    }

    pub fn runtime_versions(&self, env: &Environment) -> Vec<RuntimeVersion> {
        self.recipe.runtime_versions(env)
    }

    pub fn cleanup(&self) {
        self.recipe.cleanup(&self.artifact)
    }
}

/// Guards against a recipe reporting success while leaving behind something
/// that can't actually be executed, mirroring the permission check
/// `dmoj/executors/compiled_executor.py` runs over its compiled binary.
fn validate_compiled_artifact(recipe: &dyn ExecutorRecipe, artifact: &CompiledArtifact) -> Result<(), JudgeError> {
    if recipe.is_compiled() && !is_executable::is_executable(&artifact.binary_path) {
        return Err(InternalError::new(format!(
            "{}: compiled artifact at {} is not executable",
            recipe.name(),
            artifact.binary_path.display()
        ))
        .into());
    }
    Ok(())
}
