//! Standard grader (spec.md §4.3/§4.4), grounded on
//! `dmoj/graders/standard.py::StandardGrader`.

use std::sync::atomic::AtomicBool;

use judge_checker::{CheckerOptions, CheckerRegistry, CheckerResult};
use judge_common::{CaseRef, Environment, GradeResult, JudgeError, PlainCase, Problem, Real, ResultFlags};
use judge_executor::ExecutorInstance;

use crate::runner::{run_case, CurrentPid};

/// Default CPU-time backstop multiplier over the problem's own time limit
/// (see [`crate::limits::install_rlimits`]'s doc comment on why the
/// wall-clock deadline, not this rlimit, is authoritative).
const CPU_LIMIT_SLACK_FACTOR: f64 = 3.0;

pub struct StandardGrader<'a> {
    pub problem: &'a Problem,
    pub env: &'a Environment,
    pub checkers: &'a CheckerRegistry,
}

impl<'a> StandardGrader<'a> {
    pub fn new(problem: &'a Problem, env: &'a Environment, checkers: &'a CheckerRegistry) -> Self {
        Self { problem, env, checkers }
    }

    /// Grades one case, short-circuiting only on the caller's side (spec.md
    /// §4.3): this function always runs the case and returns a verdict, it
    /// never consults `short_circuit` itself.
    pub fn grade(
        &self,
        instance: &ExecutorInstance,
        case: &PlainCase,
        batch: Option<u32>,
        current_pid: &CurrentPid,
        abort: &AtomicBool,
    ) -> Result<GradeResult, JudgeError> {
        let wall_limit = case.wall_time_factor.0 * self.problem.time_limit.0;
        let cpu_limit = ((self.problem.time_limit.0 * CPU_LIMIT_SLACK_FACTOR).ceil() as u64).max(1);

        let outcome = run_case(
            instance,
            self.env,
            &case.input,
            &case.symlinks,
            self.problem.memory_limit_kb,
            cpu_limit,
            wall_limit,
            current_pid,
            abort,
        )?;

        let mut result_flag = outcome.flags;
        if !outcome.status.success() && !result_flag.contains(ResultFlags::TLE) {
            result_flag |= ResultFlags::RTE;
        }

        let mut result = GradeResult {
            case: CaseRef { position: case.position, batch },
            result_flag,
            points: Real(0.0),
            execution_time: Real(outcome.cpu_time_secs),
            wall_clock_time: Real(outcome.wall_clock_time_secs),
            max_memory_kb: outcome.max_memory_kb,
            proc_output: outcome.stdout,
            feedback: String::new(),
            extended_feedback: String::new(),
        };

        instance.populate_result(&mut result);

        let checker = self.checkers.get(&case.checker.tag)?;
        let run_checker = result.result_flag.is_empty() || checker.run_on_error();
        let check = if run_checker {
            let options = CheckerOptions(&case.checker.options);
            checker.check(&result.proc_output, &case.expected_output, &options)
        } else {
            CheckerResult::reject(None)
        };

        result.result_flag |= if check.passed { ResultFlags::AC } else { ResultFlags::WA };
        result.points = Real(check.points_override.unwrap_or(if check.passed { case.points.0 } else { 0.0 }));
        if let Some(feedback) = check.feedback {
            result.feedback = feedback;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    use judge_checker::CheckerRegistry;
    use judge_common::{CheckerRef, GraderClass};
    use judge_executor::recipes::ShellRecipe;
    use judge_executor::ExecutorRecipe as _;

    fn problem(time_limit: f64) -> Problem {
        Problem {
            problem_id: "echo".to_string(),
            time_limit: Real(time_limit),
            memory_limit_kb: 262_144,
            pretests_only: false,
            grader_class: GraderClass::Standard,
            cases: Vec::new(),
        }
    }

    fn echo_case() -> PlainCase {
        PlainCase {
            position: 1,
            input: Vec::new(),
            expected_output: b"hi\n".to_vec(),
            points: Real(1.0),
            checker: CheckerRef { tag: "identical".to_string(), options: BTreeMap::new() },
            symlinks: BTreeMap::new(),
            wall_time_factor: Real(1.0),
        }
    }

    #[test]
    fn grades_a_correct_submission_as_ac() {
        let env = Environment::default();
        let workdir = tempfile::tempdir().unwrap();
        let recipe: std::sync::Arc<dyn judge_executor::ExecutorRecipe> = std::sync::Arc::new(ShellRecipe);
        let artifact = recipe.compile(b"#!/bin/sh\necho hi\n", workdir.path(), &env).unwrap();
        let instance = ExecutorInstance::from_parts(recipe, artifact).unwrap();

        let problem = problem(5.0);
        let checkers = CheckerRegistry::with_builtins();
        let grader = StandardGrader::new(&problem, &env, &checkers);

        let current_pid = std::sync::Arc::new(Mutex::new(None));
        let abort = AtomicBool::new(false);
        let case = echo_case();

        let result = grader.grade(&instance, &case, None, &current_pid, &abort).unwrap();
        assert!(result.result_flag.contains(ResultFlags::AC));
        assert_eq!(result.points.0, 1.0);
    }

    #[test]
    fn grades_a_wrong_answer_submission_as_wa() {
        let env = Environment::default();
        let workdir = tempfile::tempdir().unwrap();
        let recipe: std::sync::Arc<dyn judge_executor::ExecutorRecipe> = std::sync::Arc::new(ShellRecipe);
        let artifact = recipe.compile(b"#!/bin/sh\necho bye\n", workdir.path(), &env).unwrap();
        let instance = ExecutorInstance::from_parts(recipe, artifact).unwrap();

        let problem = problem(5.0);
        let checkers = CheckerRegistry::with_builtins();
        let grader = StandardGrader::new(&problem, &env, &checkers);

        let current_pid = std::sync::Arc::new(Mutex::new(None));
        let abort = AtomicBool::new(false);
        let case = echo_case();

        let result = grader.grade(&instance, &case, None, &current_pid, &abort).unwrap();
        assert!(result.result_flag.contains(ResultFlags::WA));
        assert_eq!(result.points.0, 0.0);
    }

    #[test]
    fn kills_a_process_that_exceeds_the_wall_clock_deadline() {
        let env = Environment::default();
        let workdir = tempfile::tempdir().unwrap();
        let recipe: std::sync::Arc<dyn judge_executor::ExecutorRecipe> = std::sync::Arc::new(ShellRecipe);
        let artifact = recipe.compile(b"#!/bin/sh\nsleep 5\necho hi\n", workdir.path(), &env).unwrap();
        let instance = ExecutorInstance::from_parts(recipe, artifact).unwrap();

        let problem = problem(0.1);
        let checkers = CheckerRegistry::with_builtins();
        let grader = StandardGrader::new(&problem, &env, &checkers);

        let current_pid = std::sync::Arc::new(Mutex::new(None));
        let abort = AtomicBool::new(false);
        let case = echo_case();

        let result = grader.grade(&instance, &case, None, &current_pid, &abort).unwrap();
        assert!(result.result_flag.contains(ResultFlags::TLE));
        assert!(!result.result_flag.contains(ResultFlags::AC));
    }
}
