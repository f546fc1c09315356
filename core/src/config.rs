use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::Context as _;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};

use crate::serdable::GlobPattern;
use crate::str_interp::Template;
use crate::testing::ProcessRunner;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub compile: CompileConfig,
    pub judge: JudgeConfig,
    pub fixture: FixtureConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileConfig {
    pub shell: PathBuf,
    /// Variables: `sourcePath`, `sourceDir`, `sourceStem`, `execPath`.
    pub command: Template,
    pub source: PathBuf,
    pub executable: PathBuf,
    /// Used to pick the program file when a directory is given.
    pub include: GlobPattern,
    pub keep_executable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JudgeConfig {
    pub time_limit_ms: u64,
    pub warmup: bool,
    pub warmup_time_limit_ms: u64,
    pub stdout_capture_max_bytes: usize,
    pub stderr_capture_max_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureConfig {
    pub dir: PathBuf,
    /// Overrides `case_count_file` when set.
    pub case_count: Option<u32>,
    pub case_count_file: PathBuf,
    /// Variable: `index`.
    pub input: Template,
    /// Variable: `index`.
    pub output: Template,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub file: PathBuf,
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

fn template(s: &str) -> Template {
    Template::parse(s).expect("built-in template must be valid")
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            shell: "/bin/sh".into(),
            command: template("g++ #{sourcePath} -o #{execPath}"),
            source: "solution.cpp".into(),
            executable: "solution.exe".into(),
            include: GlobPattern::parse("*.cpp").expect("built-in glob must be valid"),
            keep_executable: false,
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 10_000,
            warmup: true,
            warmup_time_limit_ms: 1_000,
            stdout_capture_max_bytes: ProcessRunner::DEFAULT_STDOUT_CAPTURE_MAX_BYTES,
            stderr_capture_max_bytes: ProcessRunner::DEFAULT_STDERR_CAPTURE_MAX_BYTES,
        }
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            dir: "testcases".into(),
            case_count: None,
            case_count_file: "cases.txt".into(),
            input: template("input#{index}.txt"),
            output: template("output#{index}.txt"),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            file: "results.txt".into(),
            format: ReportFormat::Text,
        }
    }
}

impl JudgeConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    pub fn warmup_time_limit(&self) -> Duration {
        Duration::from_millis(self.warmup_time_limit_ms)
    }
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "autojudge.toml";

    pub fn example_toml() -> anyhow::Result<String> {
        let file = Asset::get(Self::FILENAME)
            .with_context(|| format!("'{}' is not embedded", Self::FILENAME))?;
        let s = std::str::from_utf8(file.data.as_ref())
            .context("Embedded example config is not UTF-8")?;
        Ok(s.to_owned())
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Loads the nearest config file in `cur_dir` or its ancestors.
    /// Defaults are used when there is none.
    pub fn from_file_finding_in_ancestors_or_default(
        cur_dir: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        match fsutil::find_file_in_ancestors(cur_dir, Self::FILENAME) {
            Ok(path) => {
                log::debug!("Using config {:?}", path);
                Self::from_toml_file(path)
            }
            Err(_) => {
                log::debug!("No '{}' found; using defaults", Self::FILENAME);
                Ok(Self::default())
            }
        }
    }

    /// Dir that relative paths in this config are based on.
    pub fn base_dir(&self) -> &Path {
        self.source_config_file
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(Path::new("."))
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.base_dir().join(path)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn example_toml_should_be_parsable() {
        let toml = Config::example_toml().unwrap();
        let cfg = dbg!(Config::from_toml(&toml)).unwrap();

        let Config {
            source_config_file,
            compile,
            judge,
            fixture,
            report,
        } = cfg;

        assert_eq!(source_config_file, None);

        assert_eq!(compile.shell, Path::new("/bin/sh"));
        assert_eq!(compile.command.as_str(), "g++ #{sourcePath} -o #{execPath}");
        assert_eq!(compile.source, Path::new("solution.cpp"));
        assert_eq!(compile.executable, Path::new("solution.exe"));
        assert_eq!(compile.include, GlobPattern::parse("*.cpp").unwrap());
        assert!(!compile.keep_executable);

        assert_eq!(judge.time_limit(), Duration::from_secs(10));
        assert!(judge.warmup);
        assert_eq!(judge.warmup_time_limit(), Duration::from_secs(1));
        assert_eq!(
            judge.stdout_capture_max_bytes,
            ProcessRunner::DEFAULT_STDOUT_CAPTURE_MAX_BYTES
        );
        assert_eq!(
            judge.stderr_capture_max_bytes,
            ProcessRunner::DEFAULT_STDERR_CAPTURE_MAX_BYTES
        );

        assert_eq!(fixture.dir, Path::new("testcases"));
        assert_eq!(fixture.case_count, None);
        assert_eq!(fixture.case_count_file, Path::new("cases.txt"));
        assert_eq!(fixture.input.as_str(), "input#{index}.txt");
        assert_eq!(fixture.output.as_str(), "output#{index}.txt");

        assert_eq!(report.file, Path::new("results.txt"));
        assert_eq!(report.format, ReportFormat::Text);
    }

    #[test]
    fn example_toml_matches_defaults() {
        let toml = Config::example_toml().unwrap();
        assert_eq!(Config::from_toml(&toml).unwrap(), Config::default());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg = Config::from_toml(
            r#"
            [judge]
            time_limit_ms = 2000

            [report]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.judge.time_limit(), Duration::from_secs(2));
        assert!(cfg.judge.warmup);
        assert_eq!(cfg.report.format, ReportFormat::Json);
        assert_eq!(cfg.compile, CompileConfig::default());
        assert_eq!(cfg.fixture, FixtureConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("[judge]\ntimelimit = 3").is_err());
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fsutil::mkdir_all(&nested).unwrap();
        fsutil::write(dir.path().join(Config::FILENAME), "[fixture]\ndir = \"cases\"\n").unwrap();

        let cfg = Config::from_file_finding_in_ancestors_or_default(&nested).unwrap();
        assert_eq!(cfg.base_dir(), dir.path());
        assert_eq!(cfg.resolve(&cfg.fixture.dir), dir.path().join("cases"));
        assert_eq!(cfg.resolve("/abs/x"), Path::new("/abs/x"));
    }

    #[test]
    fn no_config_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::from_file_finding_in_ancestors_or_default(dir.path()).unwrap();
        if cfg.source_config_file.is_none() {
            assert_eq!(cfg, Config::default());
            assert_eq!(cfg.base_dir(), Path::new("."));
        }
    }
}
