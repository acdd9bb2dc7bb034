//! Configured database targets.
//!
//! Targets are loaded once at startup and never change afterwards. The
//! registry owns them; everything else borrows.

use crate::error::RegistryError;
use ploughman_core::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

/// A database target as written in configuration.
#[derive(Clone, Deserialize)]
pub struct DatabaseTargetConfig {
    /// Logical name; defaults to the database name.
    #[serde(default)]
    pub name: Option<String>,
    /// Server host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Default database (schema) selected on connect.
    pub database: String,
}

/// One configured database backend.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    /// Logical name; key of this target's slot in fan-out results.
    pub name: String,
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Default database (schema) selected on connect.
    pub database: String,
}

impl DatabaseTarget {
    /// Creates a target whose logical name is its database name.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        let database = database.into();
        Self {
            name: database.clone(),
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database,
        }
    }

    /// Overrides the logical name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl From<DatabaseTargetConfig> for DatabaseTarget {
    fn from(config: DatabaseTargetConfig) -> Self {
        Self {
            name: config.name.unwrap_or_else(|| config.database.clone()),
            host: config.host,
            port: config.port,
            user: config.user,
            password: config.password,
            database: config.database,
        }
    }
}

impl fmt::Debug for DatabaseTargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseTargetConfig")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseTarget")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// The fixed list of configured targets.
#[derive(Debug, Default)]
pub struct DatabaseTargetRegistry {
    targets: Vec<DatabaseTarget>,
}

impl DatabaseTargetRegistry {
    /// Builds a registry, keeping configuration order.
    ///
    /// # Errors
    ///
    /// Returns an error if two targets share a logical name or a target
    /// lacks a host, user or database.
    pub fn new(targets: Vec<DatabaseTarget>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for target in &targets {
            for (field, value) in [
                ("host", &target.host),
                ("user", &target.user),
                ("database", &target.database),
            ] {
                if value.trim().is_empty() {
                    return Err(RegistryError::InvalidTarget {
                        name: target.name.clone(),
                        reason: format!("{field} must not be empty"),
                    }
                    .into());
                }
            }
            if !seen.insert(target.name.as_str()) {
                return Err(RegistryError::DuplicateTarget {
                    name: target.name.clone(),
                }
                .into());
            }
        }
        Ok(Self { targets })
    }

    /// Builds a registry from configuration entries.
    ///
    /// # Errors
    ///
    /// See [`DatabaseTargetRegistry::new`].
    pub fn from_config(configs: Vec<DatabaseTargetConfig>) -> Result<Self, RegistryError> {
        Self::new(configs.into_iter().map(DatabaseTarget::from).collect())
    }

    /// The default target: the first one configured.
    #[must_use]
    pub fn first(&self) -> Option<&DatabaseTarget> {
        self.targets.first()
    }

    /// Looks a target up by logical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DatabaseTarget> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Finds the first target whose default database is `database`.
    #[must_use]
    pub fn find_by_database(&self, database: &str) -> Option<&DatabaseTarget> {
        self.targets.iter().find(|t| t.database == database)
    }

    /// Iterates targets in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &DatabaseTarget> {
        self.targets.iter()
    }

    /// Logical names in configuration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name.as_str()).collect()
    }

    /// Returns the number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns whether no targets are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
