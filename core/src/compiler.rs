use std::{
    collections::HashMap,
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

use crate::str_interp::{InterpError, Template};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    pub success: bool,
    /// What the toolchain wrote to stderr, verbatim.
    pub diagnostic: String,
}

/// Builds a source file into an executable by running a command template through a shell.
#[derive(Debug, Clone)]
pub struct Compiler {
    shell: PathBuf,
    command: Template,
}

impl Compiler {
    const DEFAULT_SHELL: &str = "/bin/sh";

    pub fn new(command: Template) -> Self {
        Self {
            shell: Self::DEFAULT_SHELL.into(),
            command,
        }
    }

    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn command_for(&self, source: &Path, executable: &Path) -> Result<String, InterpError> {
        let vars = Self::make_interp_vars(source, executable);
        self.command.render(&vars)
    }

    fn make_interp_vars<'a>(source: &'a Path, executable: &'a Path) -> HashMap<&'static str, &'a OsStr> {
        let mut m: HashMap<_, &OsStr> = HashMap::new();
        m.insert("sourcePath", source.as_os_str());
        m.insert(
            "sourceDir",
            source
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .as_os_str(),
        );
        m.insert(
            "sourceStem",
            source
                .file_stem()
                .unwrap_or(OsStr::new("UNDEFINED_FILE_STEM")),
        );
        m.insert("execPath", executable.as_os_str());
        m
    }

    /// `Err` only for a command template that cannot be rendered.
    /// Everything the toolchain does, including not starting at all, is a `CompileOutcome`.
    pub async fn compile(
        &self,
        source: &Path,
        executable: &Path,
    ) -> Result<CompileOutcome, InterpError> {
        let cmd = self.command_for(source, executable)?;
        log::info!("{}", cmd);

        let output = match Command::new(&self.shell)
            .arg("-c")
            .arg(&cmd)
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                return Ok(CompileOutcome {
                    success: false,
                    diagnostic: format!(
                        "Failed to spawn '{} -c {}': {}",
                        self.shell.to_string_lossy(),
                        cmd,
                        e
                    ),
                })
            }
        };

        if output.status.success() {
            return Ok(CompileOutcome {
                success: true,
                diagnostic: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let mut diagnostic = String::from_utf8_lossy(&output.stderr).into_owned();
        if diagnostic.trim().is_empty() {
            diagnostic = match output.status.code() {
                Some(code) => format!("Compile error: exitcode={}", code),
                None => "Failed to compile: process terminated by signal".to_owned(),
            };
        }
        Ok(CompileOutcome {
            success: false,
            diagnostic,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn compiler(cmd: &str) -> Compiler {
        Compiler::new(Template::parse(cmd).unwrap())
    }

    #[test]
    fn command_interpolation() {
        let c = compiler("g++ #{sourcePath} -o #{execPath} # #{sourceDir} #{sourceStem}");
        assert_eq!(
            c.command_for(Path::new("src/main.cpp"), Path::new("main.exe"))
                .unwrap(),
            "g++ src/main.cpp -o main.exe # src main"
        );
        assert_eq!(
            c.command_for(Path::new("main.cpp"), Path::new("a.out"))
                .unwrap(),
            "g++ main.cpp -o a.out # . main"
        );

        let c = compiler("g++ #{src}");
        assert!(c
            .command_for(Path::new("a.cpp"), Path::new("a"))
            .is_err());
    }

    #[tokio::test]
    async fn failure_surfaces_stderr_verbatim() {
        let c = compiler("echo 'undefined reference to foo' >&2; exit 1");
        let res = c
            .compile(Path::new("a.cpp"), Path::new("a.exe"))
            .await
            .unwrap();
        assert_eq!(
            res,
            CompileOutcome {
                success: false,
                diagnostic: "undefined reference to foo\n".into(),
            }
        );
    }

    #[tokio::test]
    async fn silent_failure_names_exit_code() {
        let res = compiler("exit 3")
            .compile(Path::new("a.cpp"), Path::new("a.exe"))
            .await
            .unwrap();
        assert!(!res.success);
        assert_eq!(res.diagnostic, "Compile error: exitcode=3");
    }

    #[tokio::test]
    async fn missing_shell_is_a_compile_failure() {
        let res = compiler("true")
            .shell("/nonexistent/sh")
            .compile(Path::new("a.cpp"), Path::new("a.exe"))
            .await
            .unwrap();
        assert!(!res.success);
        assert!(res.diagnostic.contains("Failed to spawn"));
    }

    #[tokio::test]
    async fn success_builds_executable() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("echo.sh");
        let exe = dir.path().join("echo.exe");
        fsutil::write(&src, "#!/bin/sh\ncat\n").unwrap();

        let res = compiler("cp #{sourcePath} #{execPath} && chmod +x #{execPath}")
            .compile(&src, &exe)
            .await
            .unwrap();
        assert!(res.success, "{}", res.diagnostic);
        assert!(exe.is_file());
    }
}
