use std::{fmt, path::Path};

use anyhow::Context as _;
use serde::Serialize;

use crate::config::ReportFormat;
use crate::testing::{CaseOutcome, CaseReport, JudgeReport};

/// The single artifact of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
    /// Nothing was run; the toolchain diagnostic is the whole report.
    CompileError { diagnostic: String },
    /// Compiled, but zero cases were declared.
    NoCases { reason: String },
    Judged(JudgeReport),
}

impl Report {
    const SEPARATOR_WIDTH: usize = 40;

    pub fn is_compile_error(&self) -> bool {
        matches!(self, Report::CompileError { .. })
    }

    pub fn judged(&self) -> Option<&JudgeReport> {
        match self {
            Report::Judged(r) => Some(r),
            _ => None,
        }
    }

    pub fn render(&self, format: ReportFormat) -> anyhow::Result<String> {
        match format {
            ReportFormat::Text => Ok(self.to_string()),
            ReportFormat::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize report to JSON")
            }
        }
    }

    pub fn write_to(&self, filepath: impl AsRef<Path>, format: ReportFormat) -> anyhow::Result<()> {
        let contents = self.render(format)?;
        fsutil::write_with_mkdir(&filepath, contents).context("Failed to write report")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Report::CompileError { diagnostic } => f.write_str(diagnostic),
            Report::NoCases { reason } => writeln!(f, "{}", reason),
            Report::Judged(r) => {
                for case in r.cases() {
                    write_case(f, case)?;
                }
                writeln!(
                    f,
                    "\nPassed {} of {} cases",
                    r.passed_cases(),
                    r.total_cases()
                )
            }
        }
    }
}

fn write_case(f: &mut fmt::Formatter, case: &CaseReport) -> fmt::Result {
    let i = case.index;
    if let Some(ms) = case.elapsed_ms {
        writeln!(f, "[Case {}] Elapsed: {} ms", i, ms)?;
    }

    match &case.outcome {
        CaseOutcome::Passed => writeln!(f, "[Case {}] Passed\n", i),

        CaseOutcome::Failed {
            input,
            expected,
            actual,
            actual_truncated,
            diffs,
        } => {
            writeln!(f, "[Case {}] Failed\n", i)?;
            writeln!(f, "Input:\n{}", input)?;
            writeln!(f, "Expected output:\n{}", expected)?;
            writeln!(f, "Actual output:\n{}", actual)?;
            if *actual_truncated {
                writeln!(f, "(output truncated)")?;
            }
            writeln!(f)?;
            writeln!(f, "Diff:")?;
            for d in diffs {
                writeln!(
                    f,
                    "[Line {}]\nExpected: {}\nActual: {}",
                    d.line_number, d.expected, d.actual
                )?;
            }
            writeln!(f, "{}", "-".repeat(Report::SEPARATOR_WIDTH))
        }

        CaseOutcome::Timeout { limit_ms } => {
            writeln!(f, "[Case {}] Time limit exceeded ({} ms)\n", i, limit_ms)
        }

        CaseOutcome::RuntimeError { message } => {
            writeln!(f, "[Case {}] Runtime error:\n{}\n", i, message)
        }

        CaseOutcome::MissingFixture { reason } => {
            writeln!(
                f,
                "[Case {}] Input or expected output file is missing ({})\n",
                i, reason
            )
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{LineDiff, LineText, ReportBuilder};

    fn sample() -> Report {
        let mut b = ReportBuilder::default();
        b.push(CaseReport {
            index: 1,
            elapsed_ms: Some(3),
            outcome: CaseOutcome::Passed,
        });
        b.push(CaseReport {
            index: 2,
            elapsed_ms: Some(4),
            outcome: CaseOutcome::Failed {
                input: "1\n1\n".into(),
                expected: "3\n9".into(),
                actual: "2".into(),
                actual_truncated: false,
                diffs: vec![
                    LineDiff {
                        line_number: 1,
                        expected: "3".into(),
                        actual: "2".into(),
                    },
                    LineDiff {
                        line_number: 2,
                        expected: "9".into(),
                        actual: LineText::Missing,
                    },
                ],
            },
        });
        b.push(CaseReport {
            index: 3,
            elapsed_ms: None,
            outcome: CaseOutcome::Timeout { limit_ms: 10000 },
        });
        b.push(CaseReport {
            index: 4,
            elapsed_ms: Some(1),
            outcome: CaseOutcome::RuntimeError {
                message: "Abnormal termination (exit code 1)".into(),
            },
        });
        b.push(CaseReport {
            index: 5,
            elapsed_ms: None,
            outcome: CaseOutcome::MissingFixture {
                reason: "Missing testcases/output5.txt".into(),
            },
        });
        Report::Judged(b.finish())
    }

    #[test]
    fn compile_error_is_the_whole_report() {
        let r = Report::CompileError {
            diagnostic: "undefined reference to foo".into(),
        };
        assert!(r.is_compile_error());
        assert_eq!(r.judged(), None);
        assert_eq!(r.to_string(), "undefined reference to foo");
        assert_eq!(
            r.render(ReportFormat::Text).unwrap(),
            "undefined reference to foo"
        );
    }

    #[test]
    fn text_report() {
        let want = "\
[Case 1] Elapsed: 3 ms
[Case 1] Passed

[Case 2] Elapsed: 4 ms
[Case 2] Failed

Input:
1
1

Expected output:
3
9
Actual output:
2

Diff:
[Line 1]
Expected: 3
Actual: 2
[Line 2]
Expected: 9
Actual: (missing)
----------------------------------------
[Case 3] Time limit exceeded (10000 ms)

[Case 4] Elapsed: 1 ms
[Case 4] Runtime error:
Abnormal termination (exit code 1)

[Case 5] Input or expected output file is missing (Missing testcases/output5.txt)


Passed 1 of 5 cases
";
        assert_eq!(sample().to_string(), want);
    }

    #[test]
    fn json_report() {
        let v: serde_json::Value =
            serde_json::from_str(&sample().render(ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(v["status"], "judged");
        assert_eq!(v["total_cases"], 5);
        assert_eq!(v["passed_cases"], 1);
        assert_eq!(v["cases"][2]["verdict"], "timeout");
        assert_eq!(v["cases"][2]["limit_ms"], 10000);
        assert!(v["cases"][2].get("elapsed_ms").is_none());
        assert_eq!(v["cases"][1]["diffs"][1]["actual"], serde_json::Value::Null);

        let r = Report::CompileError {
            diagnostic: "x".into(),
        };
        let v: serde_json::Value =
            serde_json::from_str(&r.render(ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(v, serde_json::json!({"status": "compile_error", "diagnostic": "x"}));
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/results.txt");
        sample().write_to(&path, ReportFormat::Text).unwrap();
        assert_eq!(fsutil::read_to_string(&path).unwrap(), sample().to_string());
    }
}
