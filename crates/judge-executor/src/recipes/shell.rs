use std::path::Path;
use std::process::Command;

use judge_common::{CompiledArtifact, Environment, JudgeError};

use crate::recipe::ExecutorRecipe;
use crate::selftest::write_source_file;
use crate::version::{probe_version, RuntimeVersion};

/// Interpreted reference recipe: stages the submission as a `/bin/sh`
/// script. `compile()` does no real work, matching an interpreted
/// `BaseExecutor` subclass in the original source.
#[derive(Debug, Default)]
pub struct ShellRecipe;

impl ExecutorRecipe for ShellRecipe {
    fn name(&self) -> &str {
        "SH"
    }

    fn is_compiled(&self) -> bool {
        false
    }

    fn compile(&self, source: &[u8], workdir: &Path, _env: &Environment) -> Result<CompiledArtifact, JudgeError> {
        let path = write_source_file(workdir, "submission.sh", source).map_err(JudgeError::Io)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path).map_err(JudgeError::Io)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).map_err(JudgeError::Io)?;
        }
        Ok(CompiledArtifact { binary_path: path, cache_key: None })
    }

    fn launch_command(&self, artifact: &CompiledArtifact, _env: &Environment) -> Result<Command, JudgeError> {
        let mut command = Command::new("/bin/sh");
        command.arg(&artifact.binary_path);
        Ok(command)
    }

    fn runtime_versions(&self, _env: &Environment) -> Vec<RuntimeVersion> {
        probe_version("sh", Path::new("/bin/sh"), "--version", r"version (\S+)")
            .into_iter()
            .collect()
    }

    fn self_test_fixture(&self) -> Option<(&'static [u8], &'static [u8])> {
        Some((b"#!/bin/sh\necho hello\n", b"hello\n"))
    }
}
