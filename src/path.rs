use std::path::{Component, Path, PathBuf};

use crate::{errors::ResolveError, identity};

/// Seam between file probes and the path resolution strategy.
pub trait PathResolver {
    fn resolve(
        &self,
        path: &str,
    ) -> std::result::Result<PathBuf, ResolveError>;
}

/// The resolver used outside of tests: expands `~`/`~user`
/// shorthands and normalizes against the process working directory.
pub struct HomeResolver;

impl PathResolver for HomeResolver {
    fn resolve(
        &self,
        path: &str,
    ) -> std::result::Result<PathBuf, ResolveError> {
        resolve_real_path(path)
    }
}

/// Expands a leading home-directory shorthand and returns the
/// lexically normalized absolute path.
///
/// `~` and `~/…` resolve against the current user's home, `~name`
/// and `~name/…` against the home of `name`. Anything else is
/// taken as-is, made absolute relative to the working directory.
pub fn resolve_real_path(
    path: &str,
) -> std::result::Result<PathBuf, ResolveError> {
    log::trace!("resolving path {:?}", path);

    if !path.starts_with('~') {
        return absolutize(Path::new(path));
    }

    let (first, rest) = match path.split_once('/') {
        Some((first, rest)) => (first, Some(rest)),
        None => (path, None),
    };
    let home = if first == "~" {
        identity::current_user_home()?
    } else {
        identity::home_of(&first[1..])?
    };
    let expanded = match rest {
        Some(rest) => home.join(rest),
        None => home,
    };
    absolutize(&expanded)
}

fn absolutize(
    path: &Path,
) -> std::result::Result<PathBuf, ResolveError> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|err| {
            ResolveError::Normalize(format!(
                "cannot determine working directory: {err}"
            ))
        })?;
        cwd.join(path)
    };
    Ok(clean(&abs))
}

// Lexical cleanup only, never touching the filesystem: the entry
// itself may be a symlink that later queries must lstat, so
// `fs::canonicalize` would resolve one level too many. Input is
// absolute at this point.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use nix::unistd::{Uid, User};

    use super::*;

    fn own_home() -> PathBuf {
        User::from_uid(Uid::effective()).unwrap().unwrap().dir
    }

    #[test]
    fn absolute_path_is_cleaned_but_unchanged() {
        assert_eq!(
            resolve_real_path("/etc/./ssh/../hosts").unwrap(),
            PathBuf::from("/etc/hosts")
        );
    }

    #[test]
    fn relative_path_resolves_against_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            resolve_real_path("sub/./file").unwrap(),
            cwd.join("sub/file")
        );
    }

    #[test]
    fn bare_tilde_is_own_home() {
        assert_eq!(resolve_real_path("~").unwrap(), own_home());
    }

    #[test]
    fn tilde_prefix_resolves_against_own_home() {
        assert_eq!(
            resolve_real_path("~/sub/file").unwrap(),
            own_home().join("sub/file")
        );
    }

    #[test]
    fn named_tilde_resolves_against_that_users_home() {
        let root_home =
            User::from_name("root").unwrap().unwrap().dir;
        assert_eq!(
            resolve_real_path("~root/x").unwrap(),
            root_home.join("x")
        );
    }

    #[test]
    fn unknown_user_is_an_identity_error() {
        let err =
            resolve_real_path("~no_such_user_0x5f/x").unwrap_err();
        assert!(matches!(err, ResolveError::Identity(_)));
    }
}
