use std::{
    fs,
    io::{self, Read},
    os::unix::fs::{FileTypeExt, MetadataExt},
    path::{Path, PathBuf},
};

use once_cell::unsync::OnceCell;

use crate::{
    digest::{self, Algo},
    errors::{ResolveError, Result},
    identity,
    path::{HomeResolver, PathResolver},
};

/// Capability set of a filesystem entry probe.
///
/// Every operation is an independent point-in-time read against
/// the resolved path; nothing but the resolution itself is cached.
pub trait FileProbe {
    /// The path as supplied by the caller, shorthand included.
    fn path(&self) -> &str;
    /// Whether the entry is present. Broken symlinks count as
    /// present; only a clean "no such entry" maps to `Ok(false)`.
    fn exists(&self) -> Result<bool>;
    /// A readable stream over the entry's bytes, positioned at the
    /// start. The caller owns closing it.
    fn contains(&self) -> Result<Box<dyn Read>>;
    /// Permission bits of the entry itself as a 4-digit octal
    /// string, e.g. `"0644"`.
    fn mode(&self) -> Result<String>;
    /// Raw byte length; for symlinks, the length of the link text.
    fn size(&self) -> Result<u64>;
    /// One of `symlink`, `character-device`, `block-device`,
    /// `pipe`, `socket`, `directory` or `file`.
    fn filetype(&self) -> Result<String>;
    /// Owning user name.
    fn owner(&self) -> Result<String>;
    /// Owning group name.
    fn group(&self) -> Result<String>;
    /// Symlink target text; fails if the entry is not a symlink.
    fn linked_to(&self) -> Result<String>;
    fn md5(&self) -> Result<String>;
    fn sha256(&self) -> Result<String>;
}

/// Filesystem entry probe backed by the host filesystem.
///
/// The supplied path is resolved at most once, on first use;
/// success and failure alike are terminal. The cell is the
/// three-state resolution field: empty, resolved, or failed with
/// the sticky error every later query replays.
pub struct HostFile {
    path: String,
    resolver: Box<dyn PathResolver>,
    resolution: OnceCell<std::result::Result<PathBuf, ResolveError>>,
}

impl HostFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_resolver(path, Box::new(HomeResolver))
    }

    pub(crate) fn with_resolver(
        path: impl Into<String>,
        resolver: Box<dyn PathResolver>,
    ) -> Self {
        HostFile {
            path: path.into(),
            resolver,
            resolution: OnceCell::new(),
        }
    }

    fn real_path(&self) -> Result<&Path> {
        let resolution = self
            .resolution
            .get_or_init(|| self.resolver.resolve(&self.path));
        match resolution {
            Ok(path) => Ok(path),
            Err(err) => Err(err.clone().into()),
        }
    }

    // lstat, so symlinks describe themselves rather than their
    // target.
    fn stat(&self) -> Result<fs::Metadata> {
        Ok(fs::symlink_metadata(self.real_path()?)?)
    }
}

impl FileProbe for HostFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn exists(&self) -> Result<bool> {
        match fs::symlink_metadata(self.real_path()?) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn contains(&self) -> Result<Box<dyn Read>> {
        let file = fs::File::open(self.real_path()?)?;
        Ok(Box::new(file))
    }

    fn mode(&self) -> Result<String> {
        let meta = self.stat()?;
        Ok(format!("{:04o}", meta.mode() & 0o7777))
    }

    fn size(&self) -> Result<u64> {
        Ok(self.stat()?.len())
    }

    fn filetype(&self) -> Result<String> {
        let file_type = self.stat()?.file_type();
        let label = if file_type.is_symlink() {
            "symlink"
        } else if file_type.is_char_device() {
            "character-device"
        } else if file_type.is_block_device() {
            "block-device"
        } else if file_type.is_fifo() {
            "pipe"
        } else if file_type.is_socket() {
            "socket"
        } else if file_type.is_dir() {
            "directory"
        } else {
            // regular files, and the catch-all for type bits this
            // classification does not recognize
            "file"
        };
        Ok(label.to_string())
    }

    fn owner(&self) -> Result<String> {
        identity::user_name_for_uid(self.stat()?.uid())
    }

    fn group(&self) -> Result<String> {
        identity::group_name_for_gid(self.stat()?.gid())
    }

    fn linked_to(&self) -> Result<String> {
        let target = fs::read_link(self.real_path()?)?;
        Ok(target.to_string_lossy().into_owned())
    }

    fn md5(&self) -> Result<String> {
        digest::hash_file(self.real_path()?, Algo::Md5)
    }

    fn sha256(&self) -> Result<String> {
        digest::hash_file(self.real_path()?, Algo::Sha256)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::errors::ProbeError;

    struct CountingResolver {
        calls: Rc<Cell<usize>>,
        outcome: std::result::Result<PathBuf, ResolveError>,
    }

    impl PathResolver for CountingResolver {
        fn resolve(
            &self,
            _path: &str,
        ) -> std::result::Result<PathBuf, ResolveError> {
            self.calls.set(self.calls.get() + 1);
            self.outcome.clone()
        }
    }

    #[test]
    fn resolution_failure_is_sticky() {
        let calls = Rc::new(Cell::new(0));
        let file = HostFile::with_resolver(
            "~ghost/x",
            Box::new(CountingResolver {
                calls: Rc::clone(&calls),
                outcome: Err(ResolveError::Identity(
                    "no such user: ghost".to_string(),
                )),
            }),
        );

        let first = file.mode().unwrap_err();
        let second = file.size().unwrap_err();
        let third = file.exists().unwrap_err();
        assert_eq!(calls.get(), 1);

        for err in [first, second, third] {
            match err {
                ProbeError::Resolve(inner) => assert_eq!(
                    inner,
                    ResolveError::Identity(
                        "no such user: ghost".to_string()
                    )
                ),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn resolution_happens_once_on_success_too() {
        let calls = Rc::new(Cell::new(0));
        let file = HostFile::with_resolver(
            "/",
            Box::new(CountingResolver {
                calls: Rc::clone(&calls),
                outcome: Ok(PathBuf::from("/")),
            }),
        );

        assert!(file.exists().unwrap());
        assert_eq!(file.filetype().unwrap(), "directory");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn raw_path_is_reported_unresolved() {
        let file = HostFile::new("~/somewhere");
        assert_eq!(file.path(), "~/somewhere");
    }
}
