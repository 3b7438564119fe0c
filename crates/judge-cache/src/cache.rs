//! Content-addressed compiled-artifact cache (spec.md §4.6), grounded on
//! `dmoj/executors/compiled_executor.py`'s `_CompiledExecutorMeta` (a pylru
//! LRU keyed by a sha384 digest, with an eviction callback that deletes the
//! evicted binary). Our redesign (DESIGN.md) promotes the single-flight
//! compile guard from SHOULD to MUST and makes it cross-process via an
//! `flock` on the cache directory, since each submission's worker is now a
//! genuine OS process rather than a thread sharing the cache in memory.

use std::fs;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use judge_common::{CompiledArtifact, InternalError, JudgeError};
use nix::fcntl::{flock, FlockArg};

use crate::key::CacheKey;
use crate::lru::LruIndex;

/// Name a `compile` callback passed to [`ArtifactCache::get_or_compile`]
/// must write its output binary as, inside the scratch directory it is
/// given.
pub const BINARY_FILE_NAME: &str = "bin";
const LAST_USED_MARKER: &str = ".last_used";

/// A directory-backed LRU cache of compiled artifacts, shared by every
/// worker process that points `compiled_binary_cache_dir` at the same path.
pub struct ArtifactCache {
    root: PathBuf,
    capacity: usize,
    index: LruIndex,
    _lock_file: fs::File,
}

impl ArtifactCache {
    /// Opens (creating if necessary) the cache directory at `root`,
    /// rebuilding the LRU order from each entry's last-modified time.
    pub fn open(root: &Path, capacity: usize) -> Result<Self, JudgeError> {
        fs::create_dir_all(root).map_err(JudgeError::Io)?;
        let lock_file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(root.join(".lock"))
            .map_err(JudgeError::Io)?;

        let mut entries: Vec<(CacheKey, PathBuf, SystemTime)> = Vec::new();
        for entry in fs::read_dir(root).map_err(JudgeError::Io)? {
            let entry = entry.map_err(JudgeError::Io)?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
            let Some(key) = parse_hex_key(name) else { continue };
            let marker = path.join(LAST_USED_MARKER);
            let mtime = fs::metadata(&marker)
                .or_else(|_| fs::metadata(&path))
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((key, path, mtime));
        }
        entries.sort_by_key(|(_, _, mtime)| std::cmp::Reverse(*mtime));

        let mut index = LruIndex::default();
        for (key, _, _) in entries {
            index.insert_front(key);
        }

        Ok(Self { root: root.to_path_buf(), capacity, index, _lock_file: lock_file })
    }

    fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.to_hex())
    }

    /// Returns the cached artifact for `key`, compiling it with `compile`
    /// on a miss. `compile` receives a scratch directory to write its
    /// output into (named `binary_name`); its return value is ignored, the
    /// cache only cares that `scratch_dir/binary_name` exists afterward.
    ///
    /// Holds an exclusive flock across the whole check-compile-insert
    /// sequence: a second process racing for the same key blocks until the
    /// first finishes, then observes a cache hit instead of recompiling.
    pub fn get_or_compile<F>(&mut self, key: CacheKey, compile: F) -> Result<CompiledArtifact, JudgeError>
    where
        F: FnOnce(&Path) -> Result<(), JudgeError>,
    {
        let _guard = self.lock()?;

        if self.index.contains(&key) {
            let binary_path = self.entry_dir(&key).join(BINARY_FILE_NAME);
            if fs::metadata(&binary_path).is_ok() {
                self.index.touch(&key);
                self.touch_mtime(&key)?;
                return Ok(CompiledArtifact { binary_path, cache_key: Some(key.to_hex()) });
            }
            // The on-disk binary vanished out from under the index (cache
            // dir cleared by an operator, partial `rm` during an incident).
            // Drop the stale entry and fall through to recompile.
            tracing::warn!(key = %key, "cached binary missing on disk, recompiling");
            self.index.remove(&key);
        }

        let scratch = tempfile::tempdir_in(&self.root).map_err(JudgeError::Io)?;
        compile(scratch.path())?;
        let compiled_binary = scratch.path().join(BINARY_FILE_NAME);
        if !compiled_binary.exists() {
            return Err(InternalError::new("compile() did not produce the expected binary").into());
        }

        let dest = self.entry_dir(&key);
        if dest.exists() {
            fs::remove_dir_all(&dest).map_err(JudgeError::Io)?;
        }
        fs::rename(scratch.path(), &dest).map_err(JudgeError::Io)?;
        // `scratch`'s directory no longer exists under its original path;
        // `TempDir`'s drop glue ignores the resulting NotFound silently.

        self.index.insert_front(key);
        self.evict_if_over_capacity()?;

        Ok(CompiledArtifact { binary_path: dest.join(BINARY_FILE_NAME), cache_key: Some(key.to_hex()) })
    }

    fn evict_if_over_capacity(&mut self) -> Result<(), JudgeError> {
        while self.index.len() > self.capacity {
            let Some(evicted) = self.index.pop_back() else { break };
            let dir = self.entry_dir(&evicted);
            tracing::debug!(key = %evicted, "evicting compiled artifact from cache");
            if let Err(err) = fs::remove_dir_all(&dir) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    return Err(JudgeError::Io(err));
                }
            }
        }
        Ok(())
    }

    fn touch_mtime(&self, key: &CacheKey) -> Result<(), JudgeError> {
        let marker = self.entry_dir(key).join(LAST_USED_MARKER);
        fs::write(&marker, SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default().as_secs().to_le_bytes())
            .map_err(JudgeError::Io)
    }

    fn lock(&self) -> Result<FlockGuard<'_>, JudgeError> {
        flock(self._lock_file.as_raw_fd(), FlockArg::LockExclusive)
            .map_err(|e| InternalError::new(format!("failed to lock artifact cache: {e}")))?;
        Ok(FlockGuard { file: &self._lock_file })
    }
}

struct FlockGuard<'a> {
    file: &'a fs::File,
}

impl Drop for FlockGuard<'_> {
    fn drop(&mut self) {
        let _ = flock(self.file.as_raw_fd(), FlockArg::Unlock);
    }
}

fn parse_hex_key(name: &str) -> Option<CacheKey> {
    if name.len() != 96 || !name.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let mut bytes = [0u8; 48];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&name[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(CacheKey::from_raw(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_marker_binary(dir: &Path) -> Result<(), JudgeError> {
        fs::write(dir.join(BINARY_FILE_NAME), b"#!/bin/sh\necho cached\n").map_err(JudgeError::Io)
    }

    #[test]
    fn compiles_on_miss_and_serves_from_cache_on_hit() {
        let root = tempfile::tempdir().unwrap();
        let mut cache = ArtifactCache::open(root.path(), 10).unwrap();
        let key = CacheKey::derive("SH", b"echo cached");

        let mut compiles = 0;
        let first = cache
            .get_or_compile(key, |dir| {
                compiles += 1;
                write_marker_binary(dir)
            })
            .unwrap();
        assert!(first.binary_path.exists());

        let second = cache
            .get_or_compile(key, |dir| {
                compiles += 1;
                write_marker_binary(dir)
            })
            .unwrap();
        assert_eq!(first.binary_path, second.binary_path);
        assert_eq!(compiles, 1, "second lookup must be a cache hit, not a recompile");
    }

    #[test]
    fn evicts_least_recently_used_past_capacity() {
        let root = tempfile::tempdir().unwrap();
        let mut cache = ArtifactCache::open(root.path(), 2).unwrap();

        let k1 = CacheKey::derive("SH", b"one");
        let k2 = CacheKey::derive("SH", b"two");
        let k3 = CacheKey::derive("SH", b"three");

        let a1 = cache.get_or_compile(k1, write_marker_binary).unwrap();
        cache.get_or_compile(k2, write_marker_binary).unwrap();
        cache.get_or_compile(k3, write_marker_binary).unwrap();

        assert!(!a1.binary_path.exists(), "least-recently-used entry must be evicted");
    }

    #[test]
    fn recompiles_when_the_cached_binary_has_vanished_from_disk() {
        let root = tempfile::tempdir().unwrap();
        let mut cache = ArtifactCache::open(root.path(), 10).unwrap();
        let key = CacheKey::derive("SH", b"echo cached");

        let first = cache.get_or_compile(key, write_marker_binary).unwrap();
        fs::remove_dir_all(first.binary_path.parent().unwrap()).unwrap();

        let mut compiles = 0;
        let second = cache
            .get_or_compile(key, |dir| {
                compiles += 1;
                write_marker_binary(dir)
            })
            .unwrap();
        assert!(second.binary_path.exists());
        assert_eq!(compiles, 1, "a vanished binary must trigger a recompile, not a cache hit");
    }
}
