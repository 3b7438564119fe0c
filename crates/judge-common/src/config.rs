//! Environment configuration (spec.md §3 `Environment`, grounded on
//! `dmoj/judgeenv.py`'s `env` `ConfigNode` defaults).

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Tunables every crate in the workspace reads instead of hardcoding a
/// constant. Constructed once by the embedding application and threaded
/// through by reference; never mutated after startup.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Environment {
    /// Wall-clock seconds allowed for an executor's self-test.
    pub selftest_time_limit: f64,
    /// KiB of resident memory allowed for an executor's self-test.
    pub selftest_memory_limit: u64,
    /// Wall-clock seconds allowed for compiling a submission.
    pub compiler_time_limit: f64,
    /// KiB the compiled artifact may occupy on disk.
    pub compiler_size_limit: u64,
    /// Bytes of combined compiler stdout/stderr retained before truncation.
    pub compiler_output_character_limit: usize,
    /// Directory compiled artifacts are cached under; `None` disables the
    /// cache entirely and every grading run recompiles from scratch.
    pub compiled_binary_cache_dir: Option<PathBuf>,
    /// Maximum number of distinct cache keys retained (LRU-evicted).
    pub compiled_binary_cache_size: usize,
    /// Per-language path overrides for the runtime used to execute a
    /// submission (compiler path, interpreter path, ...).
    pub runtime: BTreeMap<String, PathBuf>,
    /// Extra filesystem paths an executor's launched process may read,
    /// keyed by executor name.
    pub extra_fs: BTreeMap<String, Vec<String>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            selftest_time_limit: 10.0,
            selftest_memory_limit: 131_072,
            compiler_time_limit: 10.0,
            compiler_size_limit: 131_072,
            compiler_output_character_limit: 65_536,
            compiled_binary_cache_dir: None,
            compiled_binary_cache_size: 100,
            runtime: BTreeMap::new(),
            extra_fs: BTreeMap::new(),
        }
    }
}

/// Hard floor on how long a supervisor waits for the next worker message,
/// regardless of the submission's own time limit (spec.md §5).
pub const IPC_TIMEOUT_SECS: f64 = 60.0;

impl Environment {
    /// `max(IPC_TIMEOUT_SECS, 2 * time_limit)`, per spec.md §5's receive-loop
    /// deadline rule.
    pub fn receive_deadline_secs(&self, time_limit: f64) -> f64 {
        IPC_TIMEOUT_SECS.max(2.0 * time_limit)
    }
}
