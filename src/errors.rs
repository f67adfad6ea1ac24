use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors surfaced by probe queries.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("path resolution error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("no matching {kind} entry for id {id}: {detail}")]
    IdentityNotFound {
        kind: IdentityKind,
        id: u32,
        detail: String,
    },
    #[error("IPC query error: {0}")]
    Ipc(#[from] zbus::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures of the one-shot path resolution step.
///
/// Kept apart from [`ProbeError`] and cloneable: a file probe
/// caches the failure of its single resolution attempt and replays
/// it on every later query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("identity lookup failed: {0}")]
    Identity(String),
    #[error("path normalization failed: {0}")]
    Normalize(String),
}

/// Which identity database a lookup went against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    User,
    Group,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityKind::User => write!(f, "user"),
            IdentityKind::Group => write!(f, "group"),
        }
    }
}
