use std::{path::PathBuf, process::Command};

use nix::unistd::{Gid, Group, Uid, User};

use crate::errors::{IdentityKind, ProbeError, ResolveError, Result};

/// Home directory of the user owning the current process.
pub(crate) fn current_user_home(
) -> std::result::Result<PathBuf, ResolveError> {
    match User::from_uid(Uid::effective()) {
        Ok(Some(user)) => Ok(user.dir),
        Ok(None) => Err(ResolveError::Identity(
            "current user has no passwd entry".to_string(),
        )),
        Err(err) => Err(ResolveError::Identity(format!(
            "user database unreadable: {err}"
        ))),
    }
}

/// Home directory of the named user.
pub(crate) fn home_of(
    name: &str,
) -> std::result::Result<PathBuf, ResolveError> {
    match User::from_name(name) {
        Ok(Some(user)) => Ok(user.dir),
        Ok(None) => {
            Err(ResolveError::Identity(format!("no such user: {name}")))
        }
        Err(err) => Err(ResolveError::Identity(format!(
            "user database unreadable: {err}"
        ))),
    }
}

/// Name for `uid`, falling back to `getent passwd` for entries
/// visible only through NSS-backed directory services.
pub fn user_name_for_uid(uid: u32) -> Result<String> {
    if let Ok(Some(user)) = User::from_uid(Uid::from_raw(uid)) {
        return Ok(user.name);
    }
    getent_name(IdentityKind::User, uid)
}

/// Name for `gid`, with the same `getent group` fallback.
pub fn group_name_for_gid(gid: u32) -> Result<String> {
    if let Ok(Some(group)) = Group::from_gid(Gid::from_raw(gid)) {
        return Ok(group.name);
    }
    getent_name(IdentityKind::Group, gid)
}

// Attempted exactly once after the in-process lookup misses; a
// failed invocation is terminal for the query.
fn getent_name(kind: IdentityKind, id: u32) -> Result<String> {
    let database = match kind {
        IdentityKind::User => "passwd",
        IdentityKind::Group => "group",
    };
    log::debug!("falling back to getent {} {}", database, id);

    let output = match Command::new("getent")
        .arg(database)
        .arg(id.to_string())
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            return Err(ProbeError::IdentityNotFound {
                kind,
                id,
                detail: format!("getent unavailable: {err}"),
            })
        }
    };

    if !output.status.success() {
        return Err(ProbeError::IdentityNotFound {
            kind,
            id,
            detail: format!(
                "getent {} exited with {}: {}",
                database,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    match first_field(&stdout) {
        Some(name) => Ok(name.to_string()),
        None => Err(ProbeError::IdentityNotFound {
            kind,
            id,
            detail: "getent produced no matching line".to_string(),
        }),
    }
}

/// First `:`-delimited field of a getent output line.
fn first_field(output: &str) -> Option<&str> {
    let name = output.lines().next()?.split(':').next()?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
