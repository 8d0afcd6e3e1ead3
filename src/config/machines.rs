//! Remote machine registry loaded from `machines.yaml`.
//!
//! ```yaml
//! machines:
//!   devbox:
//!     user: alice
//!     host: 192.168.1.20
//!     os: linux
//!   gaming-pc:
//!     user: alice
//!     host: 192.168.1.30
//!     password: hunter2
//!     os: windows
//! ```
//!
//! Loading is fail-open: a missing or broken file yields an empty registry so
//! that local installation keeps working without any remote configuration.
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::ConfigError;
use crate::platform::Os;

/// File name of the registry, relative to the dotfiles root.
pub const MACHINES_FILE: &str = "machines.yaml";

/// Connection info for a remote machine.
#[derive(Clone, PartialEq, Eq)]
pub struct Machine {
    /// Registry key.
    pub name: String,
    /// Remote login name.
    pub user: String,
    /// Network address.
    pub host: String,
    password: Option<String>,
    os_tag: Option<String>,
}

impl Machine {
    /// Create a machine using key-based authentication.
    #[must_use]
    pub fn new(name: &str, user: &str, host: &str, os_tag: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            user: user.to_string(),
            host: host.to_string(),
            password: None,
            os_tag: os_tag.map(String::from),
        }
    }

    /// Attach a password; authentication then goes through `sshpass`.
    #[must_use]
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Configured password, if any.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// OS family derived from the `os` tag.
    #[must_use]
    pub fn os(&self) -> Os {
        Os::from_tag(self.os_tag.as_deref())
    }

    /// The raw `os` tag, or `unknown` when absent.
    #[must_use]
    pub fn os_label(&self) -> &str {
        self.os_tag.as_deref().unwrap_or("unknown")
    }

    /// `user@host` destination string for ssh, rsync and scp.
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("os", &self.os_tag)
            .finish()
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.name, self.destination(), self.os_label())
    }
}

/// Ordered collection of configured machines.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    machines: Vec<Machine>,
}

impl Registry {
    /// Look up a machine by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.name == name)
    }

    /// Iterate machines in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Machine> {
        self.machines.iter()
    }

    /// Number of configured machines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.machines.len()
    }

    /// Returns `true` when no machines are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}

impl FromIterator<Machine> for Registry {
    fn from_iter<I: IntoIterator<Item = Machine>>(iter: I) -> Self {
        Self {
            machines: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MachinesFile {
    #[serde(default)]
    machines: Option<Mapping>,
}

/// Load the registry from `<root>/machines.yaml`, never failing.
///
/// Any error is logged as a warning and an empty registry is returned.
#[must_use]
pub fn load(root: &Path) -> Registry {
    let path = root.join(MACHINES_FILE);
    match load_file(&path) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::warn!("ignoring {}: {e}", path.display());
            Registry::default()
        }
    }
}

/// Load the registry from `path`. A missing file is an empty registry.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_file(path: &Path) -> Result<Registry, ConfigError> {
    if !path.exists() {
        tracing::debug!("{} not found, no remote machines", path.display());
        return Ok(Registry::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Parse a registry document. Entries missing `user` or `host` are skipped
/// with a warning.
///
/// # Errors
///
/// Returns an error if `content` is not valid YAML or the `machines` key is
/// not a mapping.
pub fn parse(content: &str) -> Result<Registry, serde_yaml::Error> {
    // An empty document deserializes to `None`.
    let file: Option<MachinesFile> = serde_yaml::from_str(content)?;
    let Some(entries) = file.and_then(|f| f.machines) else {
        return Ok(Registry::default());
    };

    let mut machines = Vec::with_capacity(entries.len());
    for (key, value) in &entries {
        let Some(name) = scalar(key) else {
            tracing::warn!("skipping machine with non-scalar name");
            continue;
        };
        match entry(&name, value) {
            Ok(machine) => machines.push(machine),
            Err(e) => tracing::warn!("skipping machine: {e}"),
        }
    }
    Ok(Registry { machines })
}

fn entry(name: &str, value: &Value) -> Result<Machine, ConfigError> {
    let field = |key: &str| value.get(key).and_then(scalar).filter(|s| !s.is_empty());
    let user = field("user").ok_or_else(|| ConfigError::InvalidMachine {
        name: name.to_string(),
        field: "user",
    })?;
    let host = field("host").ok_or_else(|| ConfigError::InvalidMachine {
        name: name.to_string(),
        field: "host",
    })?;
    Ok(Machine {
        name: name.to_string(),
        user,
        host,
        password: field("password"),
        os_tag: field("os"),
    })
}

/// Render a YAML scalar as a string (`password: 1234` is a number in YAML).
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
