//! Checker contract and the two built-in checkers (spec.md §4.4), grounded
//! on `dmoj/checkers/identical.py` and `dmoj/checkers/standard.py`.

use crate::options::CheckerOptions;
use crate::result::CheckerResult;

/// A pure `(process_output, judge_output, options) -> CheckerResult`
/// function, as spec.md §4.4 describes it. Checkers never touch the
/// filesystem or spawn processes; they only compare bytes already read
/// into memory.
pub trait Checker: Send + Sync {
    fn check(&self, process_output: &[u8], judge_output: &[u8], options: &CheckerOptions<'_>) -> CheckerResult;

    /// Whether the grader should still invoke this checker after the case
    /// already failed for a non-output reason (TLE/MLE/RTE/...). Spec.md
    /// §4.3's grader loop gates the call on `!result_flag || run_on_error`;
    /// the default (`false`) matches every built-in checker.
    fn run_on_error(&self) -> bool {
        false
    }
}

fn split_whitespace_tokens(bytes: &[u8]) -> Vec<&[u8]> {
    bytes.split(|b| b.is_ascii_whitespace()).filter(|tok| !tok.is_empty()).collect()
}

/// Token-by-token comparison ignoring any run of ASCII whitespace,
/// including differences in trailing newlines.
fn whitespace_tolerant_eq(a: &[u8], b: &[u8]) -> bool {
    split_whitespace_tokens(a) == split_whitespace_tokens(b)
}

/// Byte-exact comparison, falling back to a presentation-error diagnosis
/// when the only difference is whitespace.
#[derive(Debug, Default)]
pub struct IdenticalChecker;

impl Checker for IdenticalChecker {
    fn check(&self, process_output: &[u8], judge_output: &[u8], options: &CheckerOptions<'_>) -> CheckerResult {
        if judge_output == process_output {
            return CheckerResult::accept();
        }
        let pe_allowed = options.bool_flag("pe_allowed", true);
        let feedback = if pe_allowed && whitespace_tolerant_eq(judge_output, process_output) {
            Some("Presentation Error, check your whitespace".to_string())
        } else {
            None
        };
        CheckerResult::reject(feedback)
    }
}

/// Whitespace-tolerant comparison: token streams must match, runs of
/// whitespace (including newlines) between tokens do not matter.
#[derive(Debug, Default)]
pub struct StandardChecker;

impl Checker for StandardChecker {
    fn check(&self, process_output: &[u8], judge_output: &[u8], _options: &CheckerOptions<'_>) -> CheckerResult {
        whitespace_tolerant_eq(judge_output, process_output).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn opts(map: &BTreeMap<String, String>) -> CheckerOptions<'_> {
        CheckerOptions(map)
    }

    #[test]
    fn identical_accepts_byte_exact_match() {
        let empty = BTreeMap::new();
        let result = IdenticalChecker.check(b"42\n", b"42\n", &opts(&empty));
        assert!(result.passed);
    }

    #[test]
    fn identical_flags_presentation_error_on_whitespace_only_diff() {
        let empty = BTreeMap::new();
        let result = IdenticalChecker.check(b"42", b"42\n", &opts(&empty));
        assert!(!result.passed);
        assert_eq!(result.feedback.as_deref(), Some("Presentation Error, check your whitespace"));
    }

    #[test]
    fn identical_rejects_without_pe_feedback_when_pe_disallowed() {
        let mut map = BTreeMap::new();
        map.insert("pe_allowed".to_string(), "false".to_string());
        let result = IdenticalChecker.check(b"42", b"42\n", &opts(&map));
        assert!(!result.passed);
        assert_eq!(result.feedback, None);
    }

    #[test]
    fn identical_rejects_genuinely_wrong_output() {
        let empty = BTreeMap::new();
        let result = IdenticalChecker.check(b"41\n", b"42\n", &opts(&empty));
        assert!(!result.passed);
        assert_eq!(result.feedback, None);
    }

    #[test]
    fn standard_ignores_internal_whitespace_runs() {
        let empty = BTreeMap::new();
        let result = StandardChecker.check(b"1  2   3\n", b"1 2 3", &opts(&empty));
        assert!(result.passed);
    }

    #[test]
    fn standard_rejects_on_token_mismatch() {
        let empty = BTreeMap::new();
        let result = StandardChecker.check(b"1 2 4", b"1 2 3", &opts(&empty));
        assert!(!result.passed);
    }
}
