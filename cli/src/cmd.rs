pub mod init;
pub mod judge;

use std::path::PathBuf;

use autojudge_core::Config;

use crate::util;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Config file to use instead of the nearest `autojudge.toml`
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Init(init::Args),

    #[command(alias("j"))]
    Judge(judge::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Init(args) => init::exec(args, self),
            Judge(args) => judge::exec(args, self).await,
        }
    }

    pub fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::from_toml_file(util::absolute(path)),
            None => Config::from_file_finding_in_ancestors_or_default(util::current_dir()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[clap(rename_all = "lower")]
pub enum ArgReportFormat {
    Text,
    Json,
}

impl From<ArgReportFormat> for autojudge_core::config::ReportFormat {
    fn from(value: ArgReportFormat) -> Self {
        use autojudge_core::config::ReportFormat;
        use ArgReportFormat::*;
        match value {
            Text => ReportFormat::Text,
            Json => ReportFormat::Json,
        }
    }
}
