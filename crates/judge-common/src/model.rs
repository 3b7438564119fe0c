//! Data model (spec.md §3): `Submission`, `Problem`, `TestCase`, `Result`.

use std::collections::BTreeMap;

use codec::{Decode, Encode, EncodeLike, Input, Output};

/// An IEEE-754 double stored as its raw bit pattern on the wire.
///
/// `parity-scale-codec` deliberately has no native float support (substrate
/// avoids floats in anything consensus-relevant), so every timing/points
/// field that needs to cross the supervisor<->worker IPC boundary is wrapped
/// in this newtype instead. Arithmetic goes through `.0` or `From`/`Into`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Real(pub f64);

impl From<f64> for Real {
    fn from(v: f64) -> Self {
        Real(v)
    }
}

impl From<Real> for f64 {
    fn from(v: Real) -> Self {
        v.0
    }
}

impl Encode for Real {
    fn size_hint(&self) -> usize {
        8
    }

    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        self.0.to_bits().encode_to(dest)
    }
}

impl EncodeLike for Real {}

impl Decode for Real {
    fn decode<I: Input>(input: &mut I) -> Result<Self, codec::Error> {
        u64::decode(input).map(|bits| Real(f64::from_bits(bits)))
    }
}

bitflags::bitflags! {
    /// Verdict bitset (spec.md §3). A single case result may legitimately
    /// carry more than one flag (e.g. `TLE | OLE`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResultFlags: u16 {
        const AC  = 1 << 0;
        const WA  = 1 << 1;
        const RTE = 1 << 2;
        const TLE = 1 << 3;
        const MLE = 1 << 4;
        const OLE = 1 << 5;
        const IR  = 1 << 6;
        const SC  = 1 << 7;
    }
}

impl Encode for ResultFlags {
    fn size_hint(&self) -> usize {
        2
    }

    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        self.bits().encode_to(dest)
    }
}

impl EncodeLike for ResultFlags {}

impl Decode for ResultFlags {
    fn decode<I: Input>(input: &mut I) -> Result<Self, codec::Error> {
        let bits = u16::decode(input)?;
        ResultFlags::from_bits(bits).ok_or_else(|| "invalid ResultFlags bit pattern".into())
    }
}

/// Which test case within the problem a [`GradeResult`] answers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct CaseRef {
    /// 1-indexed position within its batch, or within the problem if
    /// `batch` is `None`.
    pub position: u32,
    pub batch: Option<u32>,
}

/// Outcome of grading a single test case (spec.md §3 `Result`).
#[derive(Debug, Clone, Encode, Decode)]
pub struct GradeResult {
    pub case: CaseRef,
    pub result_flag: ResultFlags,
    pub points: Real,
    pub execution_time: Real,
    pub wall_clock_time: Real,
    pub max_memory_kb: u64,
    /// Process output, truncated per the executor's output-limit policy.
    pub proc_output: Vec<u8>,
    pub feedback: String,
    pub extended_feedback: String,
}

/// Checker identity plus its opaque options bag (spec.md §3; §4.4).
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct CheckerRef {
    pub tag: String,
    pub options: BTreeMap<String, String>,
}

/// A single ungrouped test case.
#[derive(Debug, Clone, Encode, Decode)]
pub struct PlainCase {
    pub position: u32,
    pub input: Vec<u8>,
    pub expected_output: Vec<u8>,
    pub points: Real,
    pub checker: CheckerRef,
    /// Extra files the launched process may see, symlink name -> source path.
    pub symlinks: BTreeMap<String, String>,
    /// Multiplies the problem's time limit for this case only.
    pub wall_time_factor: Real,
}

/// A batch of cases scored together; see spec.md §3/§4.3 short-circuit rule.
#[derive(Debug, Clone, Encode, Decode)]
pub struct Batch {
    pub batch_number: u32,
    pub cases: Vec<PlainCase>,
}

/// A problem's flattened test data is either a standalone case or a batch of
/// cases; batches short-circuit on the first non-`AC` case (spec.md §4.3).
#[derive(Debug, Clone, Encode, Decode)]
pub enum TestCase {
    Plain(PlainCase),
    Batched(Batch),
}

/// Which grader implementation scores this problem (spec.md §4.4 registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum GraderClass {
    Standard,
}

/// A problem definition (spec.md §3 `Problem`).
///
/// `cases` is the materialized result of resolving a [`crate::ProblemSource`]
/// for a given `problem_id`; reading it lazily from disk is the source's
/// job, out of scope for the core (spec.md §2 Non-goals). Once handed to a
/// worker it is a concrete owned sequence, consumed and dropped case by case.
#[derive(Debug, Clone, Encode, Decode)]
pub struct Problem {
    pub problem_id: String,
    pub time_limit: Real,
    pub memory_limit_kb: u64,
    pub pretests_only: bool,
    pub grader_class: GraderClass,
    pub cases: Vec<TestCase>,
}

/// A compiled executable produced by an executor recipe, possibly served
/// from the content-addressed artifact cache (spec.md §4.2/§4.6).
#[derive(Debug, Clone)]
pub struct CompiledArtifact {
    pub binary_path: std::path::PathBuf,
    /// `Some` when served from (or just inserted into) the cache; the hex
    /// SHA-384 digest of `executor_identity || binary_cache_key`.
    pub cache_key: Option<String>,
}

/// A submission to grade (spec.md §3 `Submission`).
#[derive(Debug, Clone, Encode, Decode)]
pub struct Submission {
    pub id: u64,
    pub problem_id: String,
    pub language: String,
    pub source: Vec<u8>,
    /// Stop grading the remaining cases/batches after the first non-`AC`
    /// result (spec.md §4.3).
    pub short_circuit: bool,
    /// Opaque key=value bag passed through to the executor unmodified.
    pub meta: BTreeMap<String, String>,
}
