//! Self-test protocol (spec.md §4.2), grounded on
//! `dmoj/executors/base_executor.py`'s `test()`: compile and run a trivial,
//! known-good fixture program before trusting a recipe with real submissions.

use std::io::{Read, Write};
use std::process::Stdio;
use std::time::{Duration, Instant};

use judge_common::{Environment, InternalError, JudgeError};
use tempfile::TempDir;

use crate::recipe::ExecutorRecipe;

/// Compiles and runs `recipe`'s self-test fixture, failing if the toolchain
/// is missing, the fixture fails to build, or its stdout does not match
/// exactly. Recipes with no fixture ([`ExecutorRecipe::self_test_fixture`]
/// returning `None`) trivially pass.
pub fn run_self_test(recipe: &dyn ExecutorRecipe, env: &Environment) -> Result<(), JudgeError> {
    let Some((source, expected)) = recipe.self_test_fixture() else {
        return Ok(());
    };

    let workdir = TempDir::new().map_err(JudgeError::Io)?;
    let artifact = recipe.compile(source, workdir.path(), env)?;

    let mut command = recipe.launch_command(&artifact, env)?;
    command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = command.spawn().map_err(JudgeError::Io)?;
    let deadline = Instant::now() + Duration::from_secs_f64(env.selftest_time_limit);

    let status = loop {
        if let Some(status) = child.try_wait().map_err(JudgeError::Io)? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            recipe.cleanup(&artifact);
            return Err(InternalError::new(format!("self-test for {} timed out", recipe.name())).into());
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let mut stdout = Vec::new();
    if let Some(mut out) = child.stdout.take() {
        let _ = out.read_to_end(&mut stdout);
    }

    recipe.cleanup(&artifact);

    if !status.success() {
        return Err(InternalError::new(format!("self-test for {} exited with {status}", recipe.name())).into());
    }
    if stdout != expected {
        return Err(InternalError::new(format!(
            "self-test for {} produced unexpected output",
            recipe.name()
        ))
        .into());
    }
    Ok(())
}

/// Writes `contents` to `dir/name`, a helper recipes lean on in `compile()`.
pub fn write_source_file(dir: &std::path::Path, name: &str, contents: &[u8]) -> std::io::Result<std::path::PathBuf> {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path)?;
    file.write_all(contents)?;
    Ok(path)
}
