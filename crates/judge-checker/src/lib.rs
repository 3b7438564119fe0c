//! Output checkers (spec.md §4.4): pure comparison functions plus the
//! registry the grader looks them up through.

mod checker;
mod options;
mod registry;
mod result;

pub use checker::{Checker, IdenticalChecker, StandardChecker};
pub use options::CheckerOptions;
pub use registry::CheckerRegistry;
pub use result::CheckerResult;
