//! The worker's main grading loop (spec.md §4.5), grounded on
//! `dmoj/judge.py`'s `_worker_process_main`/`_grade_cases` and
//! `dmoj/graders/standard.py`.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use judge_checker::CheckerRegistry;
use judge_common::ipc::{send_blocking, IpcMessage};
use judge_common::{CaseRef, Environment, GradeResult, JudgeError, PlainCase, Problem, Real, ResultFlags, Submission};
use judge_executor::{ExecutorInstance, ExecutorRegistry};
use judge_grader::{CurrentPid, StandardGrader};

/// Runs one submission to completion, writing every event to `writer`.
/// Returns once `BYE` has been sent; IO errors on the socket itself (as
/// opposed to grading errors, which are reported as protocol events) abort
/// the loop early and propagate to the caller.
pub fn run_worker<W: Write>(
    writer: &mut W,
    submission: &Submission,
    problem: &Problem,
    registry: &ExecutorRegistry,
    checkers: &CheckerRegistry,
    env: &Environment,
    current_pid: &CurrentPid,
    abort: &AtomicBool,
) -> std::io::Result<()> {
    send_blocking(writer, &IpcMessage::Hello)?;

    let recipe = match registry.get(&submission.language) {
        Ok(recipe) => recipe,
        Err(err) => return bail_unhandled(writer, err),
    };

    let workdir = match tempfile::TempDir::new() {
        Ok(dir) => dir,
        Err(err) => return bail_unhandled(writer, JudgeError::Io(err)),
    };

    let instance = match crate::compile::compile_with_cache(&recipe, &submission.problem_id, &submission.source, workdir.path(), env)
        .and_then(|artifact| ExecutorInstance::from_parts(recipe, artifact))
    {
        Ok(instance) => instance,
        Err(JudgeError::Compile(compile_err)) => {
            send_blocking(writer, &IpcMessage::CompileError(compile_err.message))?;
            return send_blocking(writer, &IpcMessage::Bye);
        }
        Err(err) => return bail_unhandled(writer, err),
    };

    send_blocking(writer, &IpcMessage::GradingBegin { pretests_only: problem.pretests_only })?;

    let grader = StandardGrader::new(problem, env, checkers);
    let mut case_number = 0u32;
    let mut short_circuited = false;
    let mut aborted = false;
    let mut protocol_error = None;

    'outer: for case in &problem.cases {
        if abort.load(Ordering::SeqCst) {
            aborted = true;
            break;
        }
        match case {
            judge_common::TestCase::Plain(plain) => {
                case_number += 1;
                if short_circuited {
                    send_blocking(writer, &short_circuit_result(case_number, None, plain))?;
                    continue;
                }
                match grader.grade(&instance, plain, None, current_pid, abort) {
                    Ok(result) => {
                        if !submission.short_circuit || result.result_flag.contains(ResultFlags::AC) {
                            // keep grading
                        } else {
                            short_circuited = true;
                        }
                        send_blocking(writer, &IpcMessage::Result { case_number, result })?;
                    }
                    Err(err) => {
                        protocol_error = Some(err);
                        break 'outer;
                    }
                }
            }
            judge_common::TestCase::Batched(batch) => {
                send_blocking(writer, &IpcMessage::BatchBegin(batch.batch_number))?;
                for plain in &batch.cases {
                    case_number += 1;
                    if abort.load(Ordering::SeqCst) {
                        aborted = true;
                        break;
                    }
                    if short_circuited {
                        send_blocking(writer, &short_circuit_result(case_number, Some(batch.batch_number), plain))?;
                        continue;
                    }
                    match grader.grade(&instance, plain, Some(batch.batch_number), current_pid, abort) {
                        Ok(result) => {
                            if submission.short_circuit && !result.result_flag.contains(ResultFlags::AC) {
                                short_circuited = true;
                            }
                            send_blocking(writer, &IpcMessage::Result { case_number, result })?;
                        }
                        Err(err) => {
                            protocol_error = Some(err);
                            break;
                        }
                    }
                }
                send_blocking(writer, &IpcMessage::BatchEnd(batch.batch_number))?;
                if protocol_error.is_some() || aborted {
                    break;
                }
            }
        }
    }

    instance.cleanup();

    if let Some(err) = protocol_error {
        send_blocking(writer, &IpcMessage::UnhandledException(err.to_string()))?;
    } else if aborted {
        send_blocking(writer, &IpcMessage::GradingAborted)?;
    } else {
        send_blocking(writer, &IpcMessage::GradingEnd)?;
    }
    send_blocking(writer, &IpcMessage::Bye)
}

fn bail_unhandled<W: Write>(writer: &mut W, err: JudgeError) -> std::io::Result<()> {
    send_blocking(writer, &IpcMessage::UnhandledException(err.to_string()))?;
    send_blocking(writer, &IpcMessage::Bye)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use judge_common::ipc::recv_blocking;
    use judge_common::{CheckerRef, GraderClass};
    use judge_executor::recipes::ShellRecipe;

    fn drain_messages(buf: &[u8]) -> Vec<IpcMessage> {
        let mut cursor = buf;
        let mut messages = Vec::new();
        while let Some(message) = recv_blocking(&mut cursor).unwrap() {
            messages.push(message);
        }
        messages
    }

    fn single_case_problem(script: &[u8], expected: &[u8]) -> (Problem, Submission) {
        let case = judge_common::PlainCase {
            position: 1,
            input: Vec::new(),
            expected_output: expected.to_vec(),
            points: Real(1.0),
            checker: CheckerRef { tag: "identical".to_string(), options: BTreeMap::new() },
            symlinks: BTreeMap::new(),
            wall_time_factor: Real(1.0),
        };
        let problem = Problem {
            problem_id: "echo".to_string(),
            time_limit: Real(5.0),
            memory_limit_kb: 262_144,
            pretests_only: false,
            grader_class: GraderClass::Standard,
            cases: vec![judge_common::TestCase::Plain(case)],
        };
        let submission = Submission {
            id: 1,
            problem_id: "echo".to_string(),
            language: "SH".to_string(),
            source: script.to_vec(),
            short_circuit: true,
            meta: BTreeMap::new(),
        };
        (problem, submission)
    }

    #[test]
    fn full_grading_run_emits_hello_result_grading_end_bye() {
        let (problem, submission) = single_case_problem(b"#!/bin/sh\necho hi\n", b"hi\n");

        let mut registry = ExecutorRegistry::new();
        registry.register(std::sync::Arc::new(ShellRecipe));
        let checkers = CheckerRegistry::with_builtins();
        let env = Environment::default();
        let current_pid = std::sync::Arc::new(Mutex::new(None));
        let abort = AtomicBool::new(false);

        let mut buf = Vec::new();
        run_worker(&mut buf, &submission, &problem, &registry, &checkers, &env, &current_pid, &abort).unwrap();

        let messages = drain_messages(&buf);
        assert_matches::assert_matches!(messages[0], IpcMessage::Hello);
        assert_matches::assert_matches!(messages[1], IpcMessage::GradingBegin { .. });
        assert_matches::assert_matches!(messages[2], IpcMessage::Result { ref result, .. } if result.result_flag.contains(ResultFlags::AC));
        assert_matches::assert_matches!(messages[3], IpcMessage::GradingEnd);
        assert_matches::assert_matches!(messages[4], IpcMessage::Bye);
    }

    #[test]
    fn unknown_language_reports_unhandled_exception_then_bye() {
        let (problem, submission) = single_case_problem(b"#!/bin/sh\necho hi\n", b"hi\n");
        let mut submission = submission;
        submission.language = "NOPE".to_string();

        let registry = ExecutorRegistry::new();
        let checkers = CheckerRegistry::with_builtins();
        let env = Environment::default();
        let current_pid = std::sync::Arc::new(Mutex::new(None));
        let abort = AtomicBool::new(false);

        let mut buf = Vec::new();
        run_worker(&mut buf, &submission, &problem, &registry, &checkers, &env, &current_pid, &abort).unwrap();

        let messages = drain_messages(&buf);
        assert_matches::assert_matches!(messages[0], IpcMessage::Hello);
        assert_matches::assert_matches!(messages[1], IpcMessage::UnhandledException(_));
        assert_matches::assert_matches!(messages[2], IpcMessage::Bye);
    }

    fn batch_case(position: u32, input: &[u8]) -> judge_common::PlainCase {
        judge_common::PlainCase {
            position,
            input: input.to_vec(),
            expected_output: b"hi\n".to_vec(),
            points: Real(1.0),
            checker: CheckerRef { tag: "identical".to_string(), options: BTreeMap::new() },
            symlinks: BTreeMap::new(),
            wall_time_factor: Real(1.0),
        }
    }

    fn batched_problem(short_circuit: bool) -> (Problem, Submission) {
        let script = b"#!/bin/sh\nread x\nif [ \"$x\" = pass ]; then echo hi; else echo nope; fi\n";
        let batch = judge_common::Batch {
            batch_number: 1,
            cases: vec![batch_case(1, b"fail"), batch_case(2, b"pass"), batch_case(3, b"pass")],
        };
        let problem = Problem {
            problem_id: "echo".to_string(),
            time_limit: Real(5.0),
            memory_limit_kb: 262_144,
            pretests_only: false,
            grader_class: GraderClass::Standard,
            cases: vec![judge_common::TestCase::Batched(batch)],
        };
        let submission = Submission {
            id: 1,
            problem_id: "echo".to_string(),
            language: "SH".to_string(),
            source: script.to_vec(),
            short_circuit,
            meta: BTreeMap::new(),
        };
        (problem, submission)
    }

    #[test]
    fn batch_without_short_circuit_grades_every_case_after_a_failure() {
        let (problem, submission) = batched_problem(false);

        let mut registry = ExecutorRegistry::new();
        registry.register(std::sync::Arc::new(ShellRecipe));
        let checkers = CheckerRegistry::with_builtins();
        let env = Environment::default();
        let current_pid = std::sync::Arc::new(Mutex::new(None));
        let abort = AtomicBool::new(false);

        let mut buf = Vec::new();
        run_worker(&mut buf, &submission, &problem, &registry, &checkers, &env, &current_pid, &abort).unwrap();

        let messages = drain_messages(&buf);
        let results: Vec<_> = messages
            .iter()
            .filter_map(|m| match m {
                IpcMessage::Result { result, .. } => Some(result),
                _ => None,
            })
            .collect();

        assert_eq!(results.len(), 3, "all three batch cases must run since short_circuit is off");
        assert!(results[0].result_flag.contains(ResultFlags::WA));
        assert!(!results[1].result_flag.contains(ResultFlags::SC));
        assert!(results[1].result_flag.contains(ResultFlags::AC));
        assert!(results[2].result_flag.contains(ResultFlags::AC));
    }

    #[test]
    fn batch_with_short_circuit_skips_remaining_cases_after_a_failure() {
        let (problem, submission) = batched_problem(true);

        let mut registry = ExecutorRegistry::new();
        registry.register(std::sync::Arc::new(ShellRecipe));
        let checkers = CheckerRegistry::with_builtins();
        let env = Environment::default();
        let current_pid = std::sync::Arc::new(Mutex::new(None));
        let abort = AtomicBool::new(false);

        let mut buf = Vec::new();
        run_worker(&mut buf, &submission, &problem, &registry, &checkers, &env, &current_pid, &abort).unwrap();

        let messages = drain_messages(&buf);
        let results: Vec<_> = messages
            .iter()
            .filter_map(|m| match m {
                IpcMessage::Result { result, .. } => Some(result),
                _ => None,
            })
            .collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].result_flag.contains(ResultFlags::WA));
        assert!(results[1].result_flag.contains(ResultFlags::SC));
        assert!(results[2].result_flag.contains(ResultFlags::SC));
    }
}

fn short_circuit_result(case_number: u32, batch: Option<u32>, case: &PlainCase) -> IpcMessage {
    IpcMessage::Result {
        case_number,
        result: GradeResult {
            case: CaseRef { position: case.position, batch },
            result_flag: ResultFlags::SC,
            points: Real(0.0),
            execution_time: Real(0.0),
            wall_clock_time: Real(0.0),
            max_memory_kb: 0,
            proc_output: Vec::new(),
            feedback: String::new(),
            extended_feedback: String::new(),
        },
    }
}
