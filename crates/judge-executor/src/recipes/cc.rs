use std::io::Read;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use judge_common::{CompiledArtifact, CompileError, Environment, JudgeError};

use crate::limits::install_compile_rlimits;
use crate::recipe::ExecutorRecipe;
use crate::selftest::write_source_file;
use crate::version::{probe_version, RuntimeVersion};

/// Compiled reference recipe: builds a single C translation unit with
/// `cc -O2`. Grounded on `dmoj/executors/compiled_executor.py`'s
/// invoke-compiler-then-cache-binary shape.
#[derive(Debug, Default)]
pub struct CcRecipe;

impl ExecutorRecipe for CcRecipe {
    fn name(&self) -> &str {
        "CC"
    }

    fn is_compiled(&self) -> bool {
        true
    }

    fn compile(&self, source: &[u8], workdir: &Path, env: &Environment) -> Result<CompiledArtifact, JudgeError> {
        let source_path = write_source_file(workdir, "submission.c", source).map_err(JudgeError::Io)?;
        let binary_path = workdir.join("submission");

        let size_limit_bytes = env.compiler_size_limit.saturating_mul(1024);
        let mut command = Command::new("cc");
        command.arg("-O2").arg("-o").arg(&binary_path).arg(&source_path);
        command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

        // SAFETY: the closure only calls the async-signal-safe setrlimit
        // syscall between fork and exec.
        unsafe {
            command.pre_exec(move || install_compile_rlimits(size_limit_bytes));
        }

        let mut child = command.spawn().map_err(JudgeError::Io)?;
        let mut stdout = child.stdout.take().expect("piped stdout");
        let stdout_thread = std::thread::spawn(move || {
            let mut discard = Vec::new();
            let _ = stdout.read_to_end(&mut discard);
        });
        let mut stderr = child.stderr.take().expect("piped stderr");
        let stderr_thread = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            buf
        });

        let deadline = Instant::now() + Duration::from_secs_f64(env.compiler_time_limit.max(0.0));
        let mut timed_out = false;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(JudgeError::Io)? {
                break status;
            }
            if Instant::now() >= deadline {
                timed_out = true;
                let _ = child.kill();
                break child.wait().map_err(JudgeError::Io)?;
            }
            std::thread::sleep(Duration::from_millis(10));
        };

        let _ = stdout_thread.join();
        let stderr_bytes = stderr_thread.join().unwrap_or_default();

        if timed_out {
            return Err(CompileError::new(format!(
                "compiler timed out (> {} seconds)",
                env.compiler_time_limit
            ))
            .into());
        }

        if !status.success() {
            let message = if stderr_bytes.len() > env.compiler_output_character_limit {
                format!("compiler output too long (> {} bytes)", env.compiler_output_character_limit).into_bytes()
            } else {
                stderr_bytes
            };
            return Err(CompileError::new(message).into());
        }

        Ok(CompiledArtifact { binary_path, cache_key: None })
    }

    fn launch_command(&self, artifact: &CompiledArtifact, _env: &Environment) -> Result<Command, JudgeError> {
        Ok(Command::new(&artifact.binary_path))
    }

    fn runtime_versions(&self, _env: &Environment) -> Vec<RuntimeVersion> {
        probe_version("cc", Path::new("cc"), "--version", r"(\d+\.\d+(?:\.\d+)?)")
            .into_iter()
            .collect()
    }

    fn self_test_fixture(&self) -> Option<(&'static [u8], &'static [u8])> {
        Some((b"#include <stdio.h>\nint main(void) { printf(\"hello\\n\"); return 0; }\n", b"hello\n"))
    }
}
