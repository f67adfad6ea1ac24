//! # sys-probe
//!
//! Host-system introspection primitives for declarative
//! validation engines. The crate answers point queries about two
//! resource classes: filesystem entries ([`FileProbe`] backed by
//! [`HostFile`]) and systemd units ([`ServiceProbe`] backed by
//! [`SystemdService`]).
//!
//! Callers declare expectations elsewhere; this layer only reports
//! observed state, one named resource per query, synchronously.
//! Every operation returns an explicit [`Result`]; nothing here
//! panics, retries, or formats output.

pub mod digest;
pub mod errors;
pub mod file;
pub mod identity;
pub mod path;
pub mod service;

pub use digest::Algo;
pub use errors::{IdentityKind, ProbeError, ResolveError, Result};
pub use file::{FileProbe, HostFile};
pub use path::{resolve_real_path, HomeResolver, PathResolver};
pub use service::{ServiceProbe, SystemdService};

use zbus::blocking::Connection;

/// Process-wide context owning the shared resources probes borrow.
///
/// Today that is the D-Bus system connection: it is opened once
/// here and outlives every [`SystemdService`] built from it. File
/// probes need no shared state but are constructed through the
/// same context for symmetry.
pub struct System {
    dbus: Connection,
}

impl System {
    /// Connects to the system bus. Service probes built from this
    /// context reuse the one connection; it is closed only when
    /// the context is dropped.
    pub fn connect() -> Result<Self> {
        let dbus = Connection::system()?;
        Ok(System { dbus })
    }

    pub fn file(&self, path: impl Into<String>) -> HostFile {
        HostFile::new(path)
    }

    pub fn service(&self, name: impl Into<String>) -> SystemdService<'_> {
        SystemdService::new(name, &self.dbus)
    }
}
