//! Bridges the executor contract to the content-addressed artifact cache
//! (spec.md §4.2/§4.6). Interpreted recipes ([`judge_executor::ExecutorRecipe::is_compiled`]
//! `== false`) or a disabled cache (`compiled_binary_cache_dir: None`) skip
//! the cache entirely, matching `CompiledExecutor`-only caching upstream.

use std::path::Path;
use std::sync::Arc;

use judge_cache::{ArtifactCache, CacheKey, BINARY_FILE_NAME};
use judge_common::{CompiledArtifact, Environment, JudgeError};
use judge_executor::ExecutorRecipe;

pub fn compile_with_cache(
    recipe: &Arc<dyn ExecutorRecipe>,
    problem_id: &str,
    source: &[u8],
    workdir: &Path,
    env: &Environment,
) -> Result<CompiledArtifact, JudgeError> {
    let Some(cache_dir) = (recipe.is_compiled().then_some(()).and(env.compiled_binary_cache_dir.as_ref())) else {
        return recipe.compile(source, workdir, env);
    };

    let key = CacheKey::derive(recipe.name(), &recipe.binary_cache_key(problem_id, source));
    let mut cache = ArtifactCache::open(cache_dir, env.compiled_binary_cache_size)?;
    let recipe = Arc::clone(recipe);
    let source = source.to_vec();
    let env_for_closure = env.clone();

    cache.get_or_compile(key, move |scratch_dir| {
        let artifact = recipe.compile(&source, scratch_dir, &env_for_closure)?;
        let canonical = scratch_dir.join(BINARY_FILE_NAME);
        if artifact.binary_path != canonical {
            std::fs::rename(&artifact.binary_path, &canonical).map_err(JudgeError::Io)?;
        }
        Ok(())
    })
}
