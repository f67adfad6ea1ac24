use zbus::{
    blocking::{Connection, Proxy},
    zvariant::OwnedValue,
};

use crate::errors::Result;

const SYSTEMD_DEST: &str = "org.freedesktop.systemd1";
const UNIT_PATH_PREFIX: &str = "/org/freedesktop/systemd1/unit/";
const UNIT_INTERFACE: &str = "org.freedesktop.systemd1.Unit";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Capability set of a service probe. Backends for other init
/// systems implement the same three operations.
pub trait ServiceProbe {
    /// Unit name without suffix, as supplied by the caller.
    fn name(&self) -> &str;
    /// Whether the unit file state is exactly `enabled`. Every
    /// other state (disabled, static, masked, …) is `false`.
    fn enabled(&self) -> Result<bool>;
    /// Whether the active state is exactly `active`.
    fn running(&self) -> Result<bool>;
}

/// systemd unit probe over a shared D-Bus connection.
///
/// The connection belongs to the surrounding [`crate::System`]
/// context and outlives every probe; the probe borrows it per
/// query and never closes it. Each query is one fresh synchronous
/// round-trip, nothing is cached.
pub struct SystemdService<'conn> {
    name: String,
    conn: &'conn Connection,
}

impl<'conn> SystemdService<'conn> {
    pub fn new(name: impl Into<String>, conn: &'conn Connection) -> Self {
        SystemdService {
            name: name.into(),
            conn,
        }
    }

    fn unit_property(&self, property: &str) -> Result<String> {
        let unit = format!("{}.service", self.name);
        log::debug!("querying {} of {}", property, unit);

        // The unit object path is derived client-side; a missing
        // unit surfaces as a failed property read.
        let proxy = Proxy::new(
            self.conn,
            SYSTEMD_DEST,
            unit_dbus_path(&unit),
            PROPERTIES_INTERFACE,
        )?;
        let value: OwnedValue =
            proxy.call("Get", &(UNIT_INTERFACE, property))?;
        String::try_from(value)
            .map_err(|err| zbus::Error::Variant(err).into())
    }
}

impl ServiceProbe for SystemdService<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> Result<bool> {
        Ok(is_state(&self.unit_property("UnitFileState")?, "enabled"))
    }

    fn running(&self) -> Result<bool> {
        Ok(is_state(&self.unit_property("ActiveState")?, "active"))
    }
}

/// Whether a property value equals the literal state, after
/// stripping the quote wrapping some variant stringifications
/// carry.
fn is_state(value: &str, state: &str) -> bool {
    value.trim_matches('"') == state
}

/// systemd's bus-label escaping for unit object paths: every byte
/// outside `[A-Za-z0-9]`, and a leading digit, becomes `_xx`.
fn unit_dbus_path(unit: &str) -> String {
    let mut escaped = String::with_capacity(unit.len());
    for (i, byte) in unit.bytes().enumerate() {
        let literal = byte.is_ascii_alphanumeric()
            && !(i == 0 && byte.is_ascii_digit());
        if literal {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("_{byte:02x}"));
        }
    }
    if escaped.is_empty() {
        escaped.push('_');
    }
    format!("{UNIT_PATH_PREFIX}{escaped}")
}
