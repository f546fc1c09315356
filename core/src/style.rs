use std::time::Duration;

use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;
use indicatif::{ProgressBar, ProgressStyle};
use strum::IntoEnumIterator;

use crate::testing::{CaseOutcome, CaseReport, JudgeObserver, JudgeReport, Verdict};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false;
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for Verdict {
    fn color(&self) -> Color {
        use Verdict::*;
        if !self::is_truecolor_supported() {
            return match self {
                Passed => Color::Green,
                Failed => Color::Yellow,
                Timeout => Color::Red,
                RuntimeError => Color::Magenta,
                MissingFixture => Color::BrightBlack,
            };
        }

        let (r, g, b) = match self {
            Passed => (30, 180, 40),
            Failed => (210, 138, 4),
            Timeout => (220, 42, 42),
            RuntimeError => (171, 40, 200),
            MissingFixture => (110, 110, 110),
        };
        Color::TrueColor { r, g, b }
    }
}

pub fn verdict_icon(verdict: Verdict) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {:<4}", verdict.code())
        .on_color(verdict.color())
        .bold()
        .color(fg)
}

/// Shows one spinner line per case while it runs.
pub struct ProgressObserver {
    current: Option<ProgressBar>,
    style: ProgressStyle,
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver {
    pub fn new() -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        Self {
            current: None,
            style,
        }
    }
}

impl JudgeObserver for ProgressObserver {
    fn case_started(&mut self, index: u32) {
        let bar = ProgressBar::new_spinner()
            .with_style(self.style.clone())
            .with_message(format!("Case {} ...", index));
        bar.enable_steady_tick(Duration::from_millis(50));
        self.current = Some(bar);
    }

    fn case_finished(&mut self, report: &CaseReport) {
        let Some(bar) = self.current.take() else {
            return;
        };
        let elapsed = report
            .elapsed_ms
            .map(|ms| format!(" [{}ms]", ms))
            .unwrap_or_default();
        bar.finish_with_message(
            format!(
                "Case {} ... {}{}",
                report.index,
                self::verdict_icon(report.verdict()),
                elapsed,
            )
            .cyan()
            .to_string(),
        );
    }
}

pub fn print_judge_summary(report: &JudgeReport) {
    let bar = "-".repeat(5);
    print!("{} ", bar);

    let num_total = report.total_cases();
    let num_passed = report.passed_cases();
    let num_failed = num_total - num_passed;

    if num_passed == num_total {
        let msg = format!("All {} cases passed ✨", num_total);
        print!("{}", msg.green());
    } else {
        let summary_msg = if num_passed > 0 {
            format!("{}/{} cases failed 💣", num_failed, num_total)
        } else {
            format!("All {} cases failed 💀", num_total)
        };

        let detail_msg = Verdict::iter()
            .filter(|&v| v != Verdict::Passed)
            .map(|v| (v, report.count(v)))
            .filter(|&(_, cnt)| cnt > 0)
            .map(|(v, cnt)| {
                format!(
                    "{}{}{}",
                    self::verdict_icon(v),
                    "x".dimmed(),
                    cnt.to_string().bold().bright_white(),
                )
            })
            .collect::<Vec<String>>()
            .join(", ");

        print!("{} ({})", summary_msg.bright_red(), detail_msg);
    }

    println!(" {}", bar);
}

pub fn print_case_detail(case: &CaseReport) {
    let (cols, _) = terminal::size().unwrap_or((40, 40));
    let cols = cols as usize;

    const BOLD_LINE: &str = "━";
    const THIN_LINE: &str = "─";

    let bold_bar = BOLD_LINE.repeat(cols).blue().bold();
    let elapsed = case
        .elapsed_ms
        .map(|ms| format!(" [{}ms]", ms))
        .unwrap_or_default();

    println!(
        "\n{}: {}{}\n{}",
        format!("Case {}", case.index).bright_yellow().bold(),
        self::verdict_icon(case.verdict()),
        elapsed,
        bold_bar,
    );

    fn print_sub_title(s: &str, cols: usize) {
        println!(
            "{}{}",
            s.cyan().bold(),
            THIN_LINE
                .repeat(cols.saturating_sub(s.len() + 1))
                .bright_black(),
        )
    }

    fn print_lines(text: &str) {
        if text.is_empty() {
            println!("{}", "<EMPTY>".magenta().dimmed());
            return;
        }
        for line in text.lines() {
            let trimmed = line.trim_end();
            print!("{}", trimmed);
            let num_trailing_whitespace = line.len() - trimmed.len();
            if num_trailing_whitespace > 0 {
                print!(
                    "{}{}",
                    " ".repeat(num_trailing_whitespace).on_red(),
                    "(Trailing whitespace)".bright_red().bold()
                );
            }
            println!();
        }
    }

    match &case.outcome {
        CaseOutcome::Passed => {}
        CaseOutcome::Failed {
            input,
            expected,
            actual,
            diffs,
            ..
        } => {
            print_sub_title("[input]", cols);
            print_lines(input);
            print_sub_title("[expected]", cols);
            print_lines(expected);
            print_sub_title("[actual]", cols);
            print_lines(actual);
            print_sub_title("[diff]", cols);
            for d in diffs {
                println!(
                    "{} {} {}  {} {}",
                    format!("L{}", d.line_number).bright_black(),
                    "-".red(),
                    d.expected.to_string().red(),
                    "+".green(),
                    d.actual.to_string().green(),
                );
            }
        }
        CaseOutcome::Timeout { limit_ms } => {
            println!("Exceeded the time limit of {}ms", limit_ms);
        }
        CaseOutcome::RuntimeError { message } => {
            print_sub_title("[stderr]", cols);
            print_lines(message);
        }
        CaseOutcome::MissingFixture { reason } => {
            println!("{}", reason);
        }
    }

    println!("{}", bold_bar);
}
