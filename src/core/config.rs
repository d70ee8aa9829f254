use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use super::error::DatabaseError;

/// Database name that keeps JSON tables purely in memory.
pub const MEMORY_DATABASE: &str = "memory";

/// Flat-file engine backing a connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Csv,
    Json,
    Yaml,
}

impl Driver {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl FromStr for Driver {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(DatabaseError::ParseError(format!("Unknown driver: {other}"))),
        }
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Connection settings. Host, port, user and password are carried for
/// parity with the server engines; flat files only read `database`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    #[serde(default)]
    driver: Driver,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default)]
    port: u16,
    #[serde(default)]
    user: String,
    #[serde(default)]
    password: String,
    #[serde(default = "default_database")]
    database: String,
    #[serde(default = "default_charset")]
    charset: String,
    #[serde(default)]
    options: HashMap<String, String>,
    #[serde(default)]
    auto_save: bool,
    #[serde(skip)]
    connected: bool,
}

fn default_host() -> String { "localhost".to_string() }
fn default_database() -> String { ".".to_string() }
fn default_charset() -> String { "utf8".to_string() }

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: Driver::default(),
            host: default_host(),
            port: 0,
            user: String::new(),
            password: String::new(),
            database: default_database(),
            charset: default_charset(),
            options: HashMap::new(),
            auto_save: false,
            connected: false,
        }
    }
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(driver: Driver, database: impl Into<String>) -> Self {
        Self {
            driver,
            database: database.into(),
            ..Self::default()
        }
    }

    /// Loads settings with priority: `FLATQL_*` environment > config file > defaults.
    ///
    /// Without an explicit `file`, `./flatql.toml` is used when it exists.
    pub fn load(file: Option<&Path>) -> Result<Self, DatabaseError> {
        let mut builder = Config::builder();

        match file {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None if Path::new("flatql.toml").exists() => {
                builder = builder.add_source(File::with_name("flatql.toml"));
            }
            None => {}
        }

        builder = builder.add_source(Environment::with_prefix("FLATQL").try_parsing(true));

        let config = builder.build()?.try_deserialize::<Self>()?;
        tracing::debug!(driver = %config.driver, database = %config.database, "connection config loaded");
        Ok(config)
    }

    #[must_use]
    pub const fn driver(&self) -> Driver { self.driver }
    #[must_use]
    pub fn host(&self) -> &str { &self.host }
    #[must_use]
    pub const fn port(&self) -> u16 { self.port }
    #[must_use]
    pub fn user(&self) -> &str { &self.user }
    #[must_use]
    pub fn password(&self) -> &str { &self.password }
    #[must_use]
    pub fn database(&self) -> &str { &self.database }
    #[must_use]
    pub fn charset(&self) -> &str { &self.charset }
    #[must_use]
    pub const fn options(&self) -> &HashMap<String, String> { &self.options }
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> { self.options.get(key).map(String::as_str) }
    #[must_use]
    pub const fn auto_save(&self) -> bool { self.auto_save }
    #[must_use]
    pub const fn is_connected(&self) -> bool { self.connected }

    /// JSON tables with database `memory` never touch the filesystem.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.driver == Driver::Json && self.database == MEMORY_DATABASE
    }

    #[must_use]
    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.driver = driver;
        self
    }

    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    pub(crate) const fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}
