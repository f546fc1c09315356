use std::{fmt, time::Duration};

use serde::{ser::SerializeStruct, Serialize, Serializer};

/// Outcome of one candidate process.
/// A timed-out result never carries an exit code or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    pub timed_out: bool,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
}

impl ExecutionResult {
    pub(crate) fn exited(
        exit_code: Option<i32>,
        stdout: Captured,
        stderr: Captured,
        elapsed: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout: stdout.text,
            stderr: stderr.text,
            elapsed,
            timed_out: false,
            stdout_truncated: stdout.truncated,
            stderr_truncated: stderr.truncated,
        }
    }

    pub(crate) fn timed_out(elapsed: Duration) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            elapsed,
            timed_out: true,
            stdout_truncated: false,
            stderr_truncated: false,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Exited on its own with status 0.
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Bytes read from one output stream, lossily decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Captured {
    pub text: String,
    pub truncated: bool,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed,
    Timeout,
    RuntimeError,
    MissingFixture,
}

impl Verdict {
    pub fn code(self) -> &'static str {
        use Verdict::*;
        match self {
            Passed => "AC",
            Failed => "WA",
            Timeout => "TLE",
            RuntimeError => "RE",
            MissingFixture => "MISS",
        }
    }
}

/// One side of a line comparison; `Missing` when that side has no such line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LineText {
    Line(String),
    Missing,
}

impl LineText {
    pub const MISSING_TEXT: &str = "(missing)";

    pub fn from_opt(line: Option<&str>) -> Self {
        line.map_or(Self::Missing, |s| Self::Line(s.to_owned()))
    }
}

impl fmt::Display for LineText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LineText::Line(s) => f.write_str(s),
            LineText::Missing => f.write_str(Self::MISSING_TEXT),
        }
    }
}

impl From<&str> for LineText {
    fn from(s: &str) -> Self {
        Self::Line(s.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDiff {
    pub line_number: usize,
    pub expected: LineText,
    pub actual: LineText,
}

/// `passed` iff there are no diffs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonOutcome {
    pub passed: bool,
    pub diffs: Vec<LineDiff>,
}

/// Verdict of one case with the details the verdict calls for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Failed {
        input: String,
        expected: String,
        actual: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        actual_truncated: bool,
        diffs: Vec<LineDiff>,
    },
    Timeout {
        limit_ms: u64,
    },
    RuntimeError {
        message: String,
    },
    MissingFixture {
        reason: String,
    },
}

impl CaseOutcome {
    pub fn verdict(&self) -> Verdict {
        match self {
            CaseOutcome::Passed => Verdict::Passed,
            CaseOutcome::Failed { .. } => Verdict::Failed,
            CaseOutcome::Timeout { .. } => Verdict::Timeout,
            CaseOutcome::RuntimeError { .. } => Verdict::RuntimeError,
            CaseOutcome::MissingFixture { .. } => Verdict::MissingFixture,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    pub index: u32,
    /// Present only when the process ran to completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(flatten)]
    pub outcome: CaseOutcome,
}

impl CaseReport {
    pub fn verdict(&self) -> Verdict {
        self.outcome.verdict()
    }
}

/// Per-case results in ascending index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeReport {
    cases: Vec<CaseReport>,
}

impl JudgeReport {
    pub fn cases(&self) -> &[CaseReport] {
        &self.cases
    }

    pub fn total_cases(&self) -> usize {
        self.cases.len()
    }

    pub fn passed_cases(&self) -> usize {
        self.count(Verdict::Passed)
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.cases.iter().filter(|c| c.verdict() == verdict).count()
    }

    pub fn all_passed(&self) -> bool {
        self.passed_cases() == self.total_cases()
    }
}

impl Serialize for JudgeReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("JudgeReport", 3)?;
        s.serialize_field("cases", &self.cases)?;
        s.serialize_field("total_cases", &self.total_cases())?;
        s.serialize_field("passed_cases", &self.passed_cases())?;
        s.end()
    }
}

/// Append-only accumulator threaded through the judging loop.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    cases: Vec<CaseReport>,
}

impl ReportBuilder {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            cases: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, case: CaseReport) {
        debug_assert!(
            self.cases.last().map_or(true, |last| last.index < case.index),
            "cases must be appended in ascending index order"
        );
        self.cases.push(case);
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn finish(self) -> JudgeReport {
        JudgeReport { cases: self.cases }
    }
}
