use std::{
    path::{Path, PathBuf},
    process::exit,
};

pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("Failed to get current dir: {}", e);
        exit(1);
    })
}

/// Makes a user-given path independent of the config's base dir.
pub fn absolute(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_owned()
    } else {
        self::current_dir().join(path)
    }
}

pub fn replace_homedir_to_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(home_dir) = ::dirs::home_dir() else {
        return path;
    };
    path.strip_prefix(home_dir)
        .map(|path| Path::new("~").join(path))
        .unwrap_or(path)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn absolute_keeps_absolute_paths() {
        assert_eq!(absolute("/tmp/x"), Path::new("/tmp/x"));
        assert_eq!(absolute("x"), current_dir().join("x"));
    }

    #[test]
    fn tilde_only_for_home() {
        assert_eq!(replace_homedir_to_tilde("/"), Path::new("/"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                replace_homedir_to_tilde(home.join("a/b")),
                Path::new("~/a/b")
            );
        }
    }
}
