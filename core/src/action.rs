pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}

use std::path::{Path, PathBuf};

use error::*;

use crate::compiler::Compiler;
use crate::config::{Config, JudgeConfig};
use crate::interactive;
use crate::report::Report;
use crate::style::{self, ProgressObserver};
use crate::testing::{
    read_case_count, Candidate, FixtureLoader, FsFixtureLoader, Judge, JudgeObserver,
    ProcessRunner, ReportBuilder, Verdict,
};

/// Writes the example config into `dir`.
/// Returns `None` when an existing file was kept because the user declined to overwrite it.
pub fn init_config(dir: impl AsRef<Path>, force: bool) -> Result<Option<PathBuf>> {
    let path = dir.as_ref().join(Config::FILENAME);
    if path.exists() && !force {
        let prompt = format!("{} already exists. Overwrite?", path.to_string_lossy());
        let overwrite =
            interactive::ask_confirm(&prompt, false).context("Failed to ask for confirmation")?;
        if !overwrite {
            return Ok(None);
        }
    }
    fsutil::write_with_mkdir(&path, Config::example_toml()?)
        .context("Failed to write example config")?;
    Ok(Some(path))
}

/// Compiles `source` once, then judges the executable against every case of `loader`.
///
/// Only a broken compile command template is an `Err`; a compile failure is
/// `Report::CompileError` and nothing is run.
pub async fn judge_source<L, O>(
    compiler: &Compiler,
    source: &Path,
    executable: &Path,
    loader: &L,
    cfg: &JudgeConfig,
    observer: &mut O,
) -> Result<Report>
where
    L: FixtureLoader + ?Sized + Sync,
    O: JudgeObserver + ?Sized,
{
    log::info!("Compiling {}", source.to_string_lossy());
    let compiled = compiler
        .compile(source, executable)
        .await
        .context("Invalid compile command")?;
    if !compiled.success {
        return Ok(Report::CompileError {
            diagnostic: compiled.diagnostic,
        });
    }

    let case_count = loader.case_count();
    if case_count == 0 {
        return Ok(Report::NoCases {
            reason: "No cases to judge: the declared case count is 0".to_owned(),
        });
    }

    let runner = ProcessRunner::new()
        .stdout_capture_max_bytes(cfg.stdout_capture_max_bytes)
        .stderr_capture_max_bytes(cfg.stderr_capture_max_bytes);
    let judge = Judge::new(runner, Candidate::new(executable)).time_limit(cfg.time_limit());

    if cfg.warmup {
        judge.warm_up(cfg.warmup_time_limit()).await;
    }

    log::info!("Running {} cases", case_count);
    let builder = ReportBuilder::with_capacity(case_count as usize);
    let builder = judge.judge_all(loader, builder, observer).await;
    Ok(Report::Judged(builder.finish()))
}

#[derive(Debug, Clone, Default)]
pub struct JudgeOptions {
    /// No spinners or detail blocks on the terminal.
    pub quiet: bool,
}

/// Paths a run works with, after resolving the config against its base dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub executable: PathBuf,
    pub fixture_dir: PathBuf,
    pub case_count_file: PathBuf,
    pub report_file: PathBuf,
}

impl RunPaths {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            executable: cfg.resolve(&cfg.compile.executable),
            fixture_dir: cfg.resolve(&cfg.fixture.dir),
            case_count_file: cfg.resolve(&cfg.fixture.case_count_file),
            report_file: cfg.resolve(&cfg.report.file),
        }
    }
}

/// The whole run: compile, judge, remove the executable, write the report once.
pub async fn do_judge(
    source: impl AsRef<Path>,
    cfg: &Config,
    opts: &JudgeOptions,
) -> Result<Report> {
    let source = source.as_ref();
    ensure!(source.is_file(), "No such source file: {:?}", source);

    let paths = RunPaths::from_config(cfg);

    let case_count = match cfg.fixture.case_count {
        Some(n) => n,
        None => read_case_count(&paths.case_count_file).context("Failed to read case count")?,
    };
    let loader = FsFixtureLoader::new(
        &paths.fixture_dir,
        cfg.fixture.input.clone(),
        cfg.fixture.output.clone(),
        case_count,
    );

    let compiler = Compiler::new(cfg.compile.command.clone()).shell(&cfg.compile.shell);

    let report = if opts.quiet {
        judge_source(
            &compiler,
            source,
            &paths.executable,
            &loader,
            &cfg.judge,
            &mut (),
        )
        .await
    } else {
        judge_source(
            &compiler,
            source,
            &paths.executable,
            &loader,
            &cfg.judge,
            &mut ProgressObserver::new(),
        )
        .await
    };

    if !cfg.compile.keep_executable && paths.executable.exists() {
        fsutil::remove_file(&paths.executable)
            .unwrap_or_else(|e| log::warn!("Failed to remove executable: {:#}", e));
    }
    let report = report?;

    if let Report::NoCases { .. } = &report {
        log::warn!(
            "No cases declared (case count is 0 or {:?} is missing)",
            paths.case_count_file
        );
    }

    report.write_to(&paths.report_file, cfg.report.format)?;
    log::info!("Report written to {}", paths.report_file.to_string_lossy());

    if !opts.quiet {
        self::print_report(&report);
    }
    Ok(report)
}

fn print_report(report: &Report) {
    match report {
        Report::CompileError { diagnostic } => {
            eprint!("{}", diagnostic);
        }
        Report::NoCases { reason } => {
            println!("{}", reason);
        }
        Report::Judged(r) => {
            println!();
            r.cases()
                .iter()
                .filter(|c| c.verdict() != Verdict::Passed)
                .for_each(style::print_case_detail);
            style::print_judge_summary(r);
        }
    }
}
