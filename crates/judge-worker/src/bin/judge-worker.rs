//! Reference worker binary. Takes `--socket <path> --handoff <path>` and
//! grades exactly one submission using the `test-utils` reference recipes
//! (`SH`, `CC`). A real deployment links its own language set against
//! [`judge_worker::worker_entrypoint`] instead of using this binary as-is.

use std::path::PathBuf;
use std::sync::Arc;

use judge_checker::CheckerRegistry;
use judge_common::Environment;
use judge_executor::recipes::{CcRecipe, ShellRecipe};
use judge_executor::ExecutorRegistry;

fn main() {
    tracing_subscriber::fmt::init();

    let mut socket_path = None;
    let mut handoff_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--socket" => socket_path = args.next().map(PathBuf::from),
            "--handoff" => handoff_path = args.next().map(PathBuf::from),
            other => {
                tracing::warn!(arg = other, "ignoring unrecognized argument");
            }
        }
    }

    let (Some(socket_path), Some(handoff_path)) = (socket_path, handoff_path) else {
        eprintln!("usage: judge-worker --socket <path> --handoff <path>");
        std::process::exit(2);
    };

    let mut registry = ExecutorRegistry::new();
    registry.register(Arc::new(ShellRecipe)).register(Arc::new(CcRecipe));
    let checkers = CheckerRegistry::with_builtins();
    let env = Environment::default();

    if let Err(err) = judge_worker::worker_entrypoint(&socket_path, &handoff_path, &registry, &checkers, &env) {
        tracing::error!(error = %err, "worker exited with an IO error");
        std::process::exit(1);
    }
}
