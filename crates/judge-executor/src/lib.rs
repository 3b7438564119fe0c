//! Language executor registry (spec.md §4.2): the compile/launch/cleanup
//! contract every supported language implements, plus self-test and
//! version-probing support.

pub mod instance;
pub mod limits;
pub mod recipe;
pub mod registry;
pub mod selftest;
pub mod version;

#[cfg(feature = "test-utils")]
pub mod recipes;

pub use instance::ExecutorInstance;
pub use recipe::ExecutorRecipe;
pub use registry::ExecutorRegistry;
pub use selftest::run_self_test;
pub use version::{probe_version, RuntimeVersion};
