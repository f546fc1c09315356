use std::path::PathBuf;

use anyhow::{bail, Context as _};
use autojudge_core::{
    action::{self, JudgeOptions},
    config::Config,
    Report,
};

use super::{ArgReportFormat, GlobalArgs, SubcmdResult};
use crate::util;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Source file, or a dir to pick the most recently modified `compile.include` match from
    #[arg()] // positional argument
    pub source_file_or_dir: Option<PathBuf>,

    #[arg(short = 'd', long)]
    pub fixture_dir: Option<PathBuf>,

    /// Number of cases; overrides the case count file
    #[arg(short = 'n', long)]
    pub cases: Option<u32>,

    #[arg(short = 'o', long)]
    pub report: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub format: Option<ArgReportFormat>,

    #[arg(short = 't', long)]
    pub time_limit_ms: Option<u64>,

    #[arg(long)]
    pub no_warmup: bool,

    #[arg(long)]
    pub keep_executable: bool,

    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    fn apply_to(&self, cfg: &mut Config) {
        if let Some(dir) = &self.fixture_dir {
            cfg.fixture.dir = util::absolute(dir);
        }
        if let Some(n) = self.cases {
            cfg.fixture.case_count = Some(n);
        }
        if let Some(path) = &self.report {
            cfg.report.file = util::absolute(path);
        }
        if let Some(format) = self.format {
            cfg.report.format = format.into();
        }
        if let Some(ms) = self.time_limit_ms {
            cfg.judge.time_limit_ms = ms;
        }
        if self.no_warmup {
            cfg.judge.warmup = false;
        }
        if self.keep_executable {
            cfg.compile.keep_executable = true;
        }
    }
}

pub fn determine_source_file(arg: &Option<PathBuf>, cfg: &Config) -> anyhow::Result<PathBuf> {
    let existing_path = match arg {
        Some(path) if path.exists() => path.as_path(),
        Some(path) => bail!("No such file or dir: {:?}", path),
        None => return Ok(cfg.resolve(&cfg.compile.source)),
    };

    if existing_path.is_dir() {
        fsutil::find_most_recently_modified_file(existing_path, &cfg.compile.include)
            .with_context(|| format!("Cannot find source file in {:?}", existing_path))
    } else {
        Ok(existing_path.to_owned())
    }
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let mut cfg = global_args.load_config()?;
    args.apply_to(&mut cfg);

    let source = determine_source_file(&args.source_file_or_dir, &cfg)?;
    let opts = JudgeOptions { quiet: args.quiet };

    let report = action::do_judge(&source, &cfg, &opts).await?;
    let report_file = util::replace_homedir_to_tilde(cfg.resolve(&cfg.report.file));

    if let Report::CompileError { .. } = report {
        bail!(
            "Failed to compile {}. See {}",
            source.to_string_lossy(),
            report_file.to_string_lossy()
        );
    }
    if !args.quiet {
        println!("Report: {}", report_file.to_string_lossy());
    }
    Ok(())
}
