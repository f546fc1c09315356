use std::{
    fs::{self, ReadDir},
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("No entry matched glob '{0}' in '{1}'")]
        NoEntryMatchedGlob(::glob::Pattern, PathBuf),

        #[error("Cannot find '{0}' in '{1}' or its ancestors")]
        NotFoundInAncestors(String, PathBuf),
    }

    impl Error {
        pub fn is_not_found(&self) -> bool {
            match self {
                Error::SingleIO(_, _, e) => e.kind() == io::ErrorKind::NotFound,
                _ => false,
            }
        }
    }
}
pub use error::{Error, Result};

pub fn mkdir_all(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))
}

pub fn write<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

/// Writes `contents`, creating missing parent dirs first.
pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        if !dir.as_os_str().is_empty() {
            self::mkdir_all(dir)?;
        }
    }
    self::write(filepath, contents)
}

pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

/// Like [`read_to_string`], but a nonexistent file is `Ok(None)` instead of an error.
pub fn read_to_string_if_exists(filepath: impl AsRef<Path>) -> Result<Option<String>> {
    match fs::read_to_string(&filepath) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::SingleIO(
            "Cannot read file",
            filepath.as_ref().to_owned(),
            e,
        )),
    }
}

pub fn remove_file(filepath: impl AsRef<Path>) -> Result<()> {
    fs::remove_file(&filepath)
        .map_err(|e| Error::SingleIO("Cannot remove file", filepath.as_ref().to_owned(), e))
}

pub fn read_dir(dir: impl AsRef<Path>) -> Result<ReadDir> {
    fs::read_dir(&dir).map_err(|e| Error::SingleIO("Cannot read dir", dir.as_ref().to_owned(), e))
}

/// Find `filename` in `start_dir` and its ancestors, nearest first.
pub fn find_file_in_ancestors(start_dir: impl AsRef<Path>, filename: &str) -> Result<PathBuf> {
    let start_dir = start_dir.as_ref();
    start_dir
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|path| path.is_file())
        .ok_or_else(|| Error::NotFoundInAncestors(filename.to_owned(), start_dir.to_owned()))
}

pub fn find_most_recently_modified_file(
    dir: impl AsRef<Path>,
    filename_pattern: &::glob::Pattern,
) -> Result<PathBuf> {
    let mut ans_filepath = None;
    let mut max_modified = SystemTime::UNIX_EPOCH;

    for entry in self::read_dir(&dir)?.filter_map(std::result::Result::ok) {
        let file_type = entry.file_type();
        let modified = entry.metadata().and_then(|info| info.modified());
        let (Ok(file_type), Ok(modified)) = (file_type, modified) else {
            continue;
        };
        if file_type.is_dir() {
            continue;
        }
        let filename = entry.file_name();
        if filename_pattern.matches(filename.to_string_lossy().as_ref())
            && (ans_filepath.is_none() || max_modified < modified)
        {
            max_modified = modified;
            ans_filepath = Some(entry.path());
        }
    }
    ans_filepath.ok_or_else(|| {
        self::Error::NoEntryMatchedGlob(filename_pattern.to_owned(), dir.as_ref().to_owned())
    })
}
