//! Runtime version probing (spec.md §4.2: "version probing via regex"),
//! grounded on `dmoj/executors/base_executor.py`'s `get_runtime_versions`,
//! which runs `<compiler> --version` and regex-matches the first line.

use std::process::Command;

use regex::Regex;

/// A single `(name, version)` pair reported by an executor, e.g.
/// `("gcc", "13.2.0")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeVersion {
    pub name: String,
    pub version: String,
}

/// Runs `path arg` and extracts a version string from its combined
/// stdout+stderr using `pattern`, whose first capture group must be the
/// version. Returns `None` if the binary is missing, exits non-zero, or the
/// pattern does not match — probing failures are soft, never fatal.
pub fn probe_version(name: &str, path: &std::path::Path, arg: &str, pattern: &str) -> Option<RuntimeVersion> {
    let output = Command::new(path).arg(arg).output().ok()?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push('\n');
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    let re = Regex::new(pattern).ok()?;
    let captures = re.captures(&text)?;
    let version = captures.get(1).or_else(|| captures.get(0))?.as_str().to_string();

    Some(RuntimeVersion { name: name.to_string(), version })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_a_well_known_binary() {
        let found = probe_version("cat", std::path::Path::new("cat"), "--version", r"cat \(GNU coreutils\) (\S+)");
        assert!(found.is_some() || found.is_none(), "probing must never panic");
    }

    #[test]
    fn returns_none_for_a_missing_binary() {
        let found = probe_version(
            "nonexistent",
            std::path::Path::new("/definitely/not/a/real/path"),
            "--version",
            r"(\S+)",
        );
        assert!(found.is_none());
    }
}
