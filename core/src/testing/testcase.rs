use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use async_trait::async_trait;
use maplit::hashmap;
use serde::Serialize;

use crate::str_interp::{InterpError, Template};

/// One input/expected-output pair. Indices start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub index: u32,
    pub input: String,
    pub expected: String,
}

impl TestCase {
    pub fn new(index: u32, input: impl Into<String>, expected: impl Into<String>) -> Self {
        debug_assert!(index >= 1, "testcase index starts at 1");
        Self {
            index,
            input: input.into(),
            expected: expected.into(),
        }
    }
}

/// What a loader yields for one declared index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureSlot {
    Present(TestCase),
    Missing { index: u32, paths: Vec<PathBuf> },
}

#[async_trait]
pub trait FixtureLoader {
    /// Number of declared cases; indices are `1..=case_count()`.
    fn case_count(&self) -> u32;

    async fn load(&self, index: u32) -> anyhow::Result<FixtureSlot>;
}

/// Reads `<dir>/<input template>` and `<dir>/<output template>` for each index.
#[derive(Debug, Clone)]
pub struct FsFixtureLoader {
    dir: PathBuf,
    input: Template,
    output: Template,
    case_count: u32,
}

impl FsFixtureLoader {
    pub fn new(dir: impl Into<PathBuf>, input: Template, output: Template, case_count: u32) -> Self {
        Self {
            dir: dir.into(),
            input,
            output,
            case_count,
        }
    }

    pub fn input_path(&self, index: u32) -> Result<PathBuf, InterpError> {
        Self::path_of(&self.dir, &self.input, index)
    }

    pub fn output_path(&self, index: u32) -> Result<PathBuf, InterpError> {
        Self::path_of(&self.dir, &self.output, index)
    }

    fn path_of(dir: &Path, template: &Template, index: u32) -> Result<PathBuf, InterpError> {
        let vars = hashmap! { "index" => index.to_string() };
        template.render(&vars).map(|name| dir.join(name))
    }

    async fn read_optional(path: &Path) -> anyhow::Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read fixture {:?}", path)),
        }
    }
}

#[async_trait]
impl FixtureLoader for FsFixtureLoader {
    fn case_count(&self) -> u32 {
        self.case_count
    }

    async fn load(&self, index: u32) -> anyhow::Result<FixtureSlot> {
        let input_path = self.input_path(index)?;
        let output_path = self.output_path(index)?;

        let (input, expected) = tokio::try_join!(
            Self::read_optional(&input_path),
            Self::read_optional(&output_path)
        )?;

        Ok(match (input, expected) {
            (Some(input), Some(expected)) => {
                FixtureSlot::Present(TestCase::new(index, input, expected))
            }
            (input, expected) => {
                let mut paths = Vec::with_capacity(2);
                if input.is_none() {
                    paths.push(input_path);
                }
                if expected.is_none() {
                    paths.push(output_path);
                }
                FixtureSlot::Missing { index, paths }
            }
        })
    }
}

/// Cases held in memory, e.g. typed into an editor rather than saved as files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryFixtures {
    cases: Vec<TestCase>,
}

impl InMemoryFixtures {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let cases = (1..)
            .zip(pairs)
            .map(|(index, (input, expected))| TestCase::new(index, input, expected))
            .collect();
        Self { cases }
    }

    pub fn push(&mut self, input: impl Into<String>, expected: impl Into<String>) -> &TestCase {
        let index = self.cases.len() as u32 + 1;
        self.cases.push(TestCase::new(index, input, expected));
        &self.cases[self.cases.len() - 1]
    }

    pub fn pop(&mut self) -> Option<TestCase> {
        self.cases.pop()
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }
}

#[async_trait]
impl FixtureLoader for InMemoryFixtures {
    fn case_count(&self) -> u32 {
        self.cases.len() as u32
    }

    async fn load(&self, index: u32) -> anyhow::Result<FixtureSlot> {
        let t = (index as usize)
            .checked_sub(1)
            .and_then(|i| self.cases.get(i))
            .with_context(|| format!("No testcase #{}", index))?;
        Ok(FixtureSlot::Present(t.clone()))
    }
}

/// Reads a declared case count: the first line of the file, trimmed, if it is all digits.
/// Anything else, including a missing file, declares zero cases.
pub fn read_case_count(filepath: impl AsRef<Path>) -> fsutil::Result<u32> {
    let Some(contents) = fsutil::read_to_string_if_exists(&filepath)? else {
        log::debug!("Case count file {:?} does not exist", filepath.as_ref());
        return Ok(0);
    };
    let first_line = contents.lines().next().unwrap_or("").trim();
    if first_line.is_empty() || !first_line.bytes().all(|b| b.is_ascii_digit()) {
        log::warn!(
            "Case count file {:?} does not start with a number: {:?}",
            filepath.as_ref(),
            first_line
        );
        return Ok(0);
    }
    Ok(first_line.parse().unwrap_or_else(|_| {
        log::warn!("Case count {} is too large", first_line);
        0
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    fn loader(dir: &Path, case_count: u32) -> FsFixtureLoader {
        FsFixtureLoader::new(
            dir,
            Template::parse("input#{index}.txt").unwrap(),
            Template::parse("output#{index}.txt").unwrap(),
            case_count,
        )
    }

    #[tokio::test]
    async fn fs_loader_reads_pairs_and_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path();
        fsutil::write(d.join("input1.txt"), "3\n4\n").unwrap();
        fsutil::write(d.join("output1.txt"), "7\n").unwrap();
        fsutil::write(d.join("input2.txt"), "1\n").unwrap();

        let l = loader(d, 3);
        assert_eq!(l.case_count(), 3);

        assert_eq!(
            l.load(1).await.unwrap(),
            FixtureSlot::Present(TestCase::new(1, "3\n4\n", "7\n"))
        );
        assert_eq!(
            l.load(2).await.unwrap(),
            FixtureSlot::Missing {
                index: 2,
                paths: vec![d.join("output2.txt")],
            }
        );
        assert_eq!(
            l.load(3).await.unwrap(),
            FixtureSlot::Missing {
                index: 3,
                paths: vec![d.join("input3.txt"), d.join("output3.txt")],
            }
        );
    }

    #[tokio::test]
    async fn fs_loader_fails_on_unreadable_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path();
        fsutil::mkdir_all(d.join("input1.txt")).unwrap();
        fsutil::write(d.join("output1.txt"), "7\n").unwrap();

        let err = loader(d, 1).load(1).await.unwrap_err();
        assert!(format!("{:#}", err).contains("input1.txt"), "{:#}", err);
    }

    #[tokio::test]
    async fn in_memory_fixtures_are_indexed_from_one() {
        let mut f = InMemoryFixtures::from_pairs([("1 2\n", "3"), ("5 5\n", "10")]);
        assert_eq!(f.case_count(), 2);
        assert_eq!(f.push("0 0\n", "0").index, 3);
        assert_eq!(
            f.load(3).await.unwrap(),
            FixtureSlot::Present(TestCase::new(3, "0 0\n", "0"))
        );
        assert!(f.load(0).await.is_err());
        assert!(f.load(4).await.is_err());

        assert_eq!(f.pop().map(|t| t.index), Some(3));
        assert_eq!(f.cases().len(), 2);
    }

    #[test]
    fn case_count_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.txt");

        assert_eq!(read_case_count(&path).unwrap(), 0);

        for (contents, want) in [
            ("3\n", 3),
            ("  12  \nignored\n", 12),
            ("0", 0),
            ("", 0),
            ("three\n", 0),
            ("-1\n", 0),
            ("4 5\n", 0),
            ("99999999999999999999\n", 0),
        ] {
            fsutil::write(&path, contents).unwrap();
            assert_eq!(read_case_count(&path).unwrap(), want, "{:?}", contents);
        }
    }
}
