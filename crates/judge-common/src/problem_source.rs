//! External collaborator trait for problem storage (spec.md §2 Non-goals:
//! "on-disk problem package format" is explicitly out of scope; this trait
//! is the seam the embedding application implements against).

use crate::error::JudgeError;
use crate::model::Problem;

/// Resolves a `problem_id` to its full [`Problem`] definition.
///
/// Implementations own everything spec.md excludes: directory layout,
/// `init.yml`-style manifests, generators/validators. The core only ever
/// sees the materialized result.
pub trait ProblemSource: Send + Sync {
    fn load(&self, problem_id: &str) -> Result<Problem, JudgeError>;
}

/// An in-memory [`ProblemSource`] backed by a fixed map, useful for tests
/// and for embedding a small fixed problem set without touching a
/// filesystem.
#[derive(Debug, Default, Clone)]
pub struct StaticProblemSource {
    problems: std::collections::BTreeMap<String, Problem>,
}

impl StaticProblemSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_problem(mut self, problem: Problem) -> Self {
        self.problems.insert(problem.problem_id.clone(), problem);
        self
    }
}

impl ProblemSource for StaticProblemSource {
    fn load(&self, problem_id: &str) -> Result<Problem, JudgeError> {
        self.problems.get(problem_id).cloned().ok_or_else(|| {
            crate::error::InternalError::new(format!("unknown problem id: {problem_id}")).into()
        })
    }
}
