use std::time::Duration;

use super::{
    compare::compare,
    result::{CaseOutcome, CaseReport, ExecutionResult, ReportBuilder},
    runner::{Candidate, ProcessRunner},
    testcase::{FixtureLoader, FixtureSlot, TestCase},
};

/// Hooks for showing progress while cases are judged.
pub trait JudgeObserver {
    fn case_started(&mut self, _index: u32) {}
    fn case_finished(&mut self, _report: &CaseReport) {}
}

impl JudgeObserver for () {}

/// Runs one candidate over a sequence of cases, one at a time.
#[derive(Debug, Clone)]
pub struct Judge {
    runner: ProcessRunner,
    candidate: Candidate,
    time_limit: Duration,
}

impl Judge {
    pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(10);

    pub fn new(runner: ProcessRunner, candidate: Candidate) -> Self {
        Self {
            runner,
            candidate,
            time_limit: Self::DEFAULT_TIME_LIMIT,
        }
    }

    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub async fn warm_up(&self, deadline: Duration) {
        self.runner.warm_up(&self.candidate, deadline).await
    }

    /// Judges indices `1..=loader.case_count()` in order, appending each result to `builder`.
    /// Never fails: a problem with one case becomes that case's verdict.
    pub async fn judge_all<L, O>(
        &self,
        loader: &L,
        mut builder: ReportBuilder,
        observer: &mut O,
    ) -> ReportBuilder
    where
        L: FixtureLoader + ?Sized + Sync,
        O: JudgeObserver + ?Sized,
    {
        for index in 1..=loader.case_count() {
            observer.case_started(index);
            let report = match loader.load(index).await {
                Ok(FixtureSlot::Present(t)) => self.judge_case(&t).await,
                Ok(FixtureSlot::Missing { index, paths }) => {
                    let paths: Vec<_> = paths.iter().map(|p| p.to_string_lossy()).collect();
                    missing_fixture(index, format!("Missing {}", paths.join(", ")))
                }
                Err(e) => missing_fixture(index, format!("{:#}", e)),
            };
            log::debug!("Case {}: {}", report.index, report.verdict());
            observer.case_finished(&report);
            builder.push(report);
        }
        builder
    }

    pub async fn judge_case(&self, testcase: &TestCase) -> CaseReport {
        match self
            .runner
            .run(&self.candidate, &testcase.input, self.time_limit)
            .await
        {
            Ok(res) => classify(testcase, res, self.time_limit),
            Err(e) => CaseReport {
                index: testcase.index,
                elapsed_ms: None,
                outcome: CaseOutcome::RuntimeError {
                    message: format!("{:#}", e),
                },
            },
        }
    }
}

fn missing_fixture(index: u32, reason: String) -> CaseReport {
    CaseReport {
        index,
        elapsed_ms: None,
        outcome: CaseOutcome::MissingFixture { reason },
    }
}

/// Turns a finished run into a verdict:
/// timeout, then abnormal exit, then output comparison.
pub fn classify(testcase: &TestCase, res: ExecutionResult, time_limit: Duration) -> CaseReport {
    if res.timed_out {
        return CaseReport {
            index: testcase.index,
            elapsed_ms: None,
            outcome: CaseOutcome::Timeout {
                limit_ms: time_limit.as_millis() as u64,
            },
        };
    }

    let elapsed_ms = Some(res.elapsed_ms());
    let outcome = match res.exit_code {
        Some(0) => {
            let cmp = compare(&testcase.expected, &res.stdout);
            // A cut-off capture is not the whole output, so it can never pass.
            if cmp.passed && !res.stdout_truncated {
                CaseOutcome::Passed
            } else {
                CaseOutcome::Failed {
                    input: testcase.input.clone(),
                    expected: testcase.expected.trim().to_owned(),
                    actual: res.stdout.trim().to_owned(),
                    actual_truncated: res.stdout_truncated,
                    diffs: cmp.diffs,
                }
            }
        }
        code => CaseOutcome::RuntimeError {
            message: runtime_error_message(&res.stderr, code),
        },
    };
    CaseReport {
        index: testcase.index,
        elapsed_ms,
        outcome,
    }
}

fn runtime_error_message(stderr: &str, exit_code: Option<i32>) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_owned();
    }
    match exit_code {
        Some(code) => format!("Abnormal termination (exit code {})", code),
        None => "Abnormal termination (terminated by signal)".to_owned(),
    }
}
