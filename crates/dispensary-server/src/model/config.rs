//! Configuration management for the Dispensary server
//!
//! Sources, lowest precedence first: `conf/application.yml` (optional),
//! `DISPENSARY_*` environment variables, command line flags.

use std::time::Duration;

use clap::Parser;
use config::{Config, ConfigError, Environment};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use dispensary_consistency::LockOptions;
use dispensary_consistency::lock::{
    DEFAULT_LOCK_TTL_MS, DEFAULT_MAX_WAIT_MS, DEFAULT_POLL_INTERVAL_MS,
};
use dispensary_persistence::StorageMode;

use crate::startup::LoggingConfig;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Command line arguments for the server
#[derive(Debug, Default, Parser)]
#[command(version, about = "Pharmacy inventory server")]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short = 'c', long = "config")]
    pub config_file: Option<String>,
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
    #[arg(long = "db-url", env = "DATABASE_URL")]
    pub database_url: Option<String>,
    #[arg(long = "redis-url", env = "REDIS_URL")]
    pub redis_url: Option<String>,
    /// `external` or `memory`
    #[arg(long = "persistence-mode")]
    pub persistence_mode: Option<String>,
    /// `redis` or `memory`
    #[arg(long = "lock-store")]
    pub lock_store: Option<String>,
}

/// Backend for the distributed half of the resource lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStoreKind {
    Redis,
    /// Single-process deployments only
    Memory,
}

impl std::str::FromStr for LockStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(LockStoreKind::Redis),
            "memory" => Ok(LockStoreKind::Memory),
            _ => Err(format!("Invalid lock store: {}", s)),
        }
    }
}

impl std::fmt::Display for LockStoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockStoreKind::Redis => write!(f, "redis"),
            LockStoreKind::Memory => write!(f, "memory"),
        }
    }
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Parse the process arguments and load every source.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Cli::parse())
    }

    pub fn load(args: Cli) -> Result<Self, ConfigError> {
        let file = args
            .config_file
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut builder = Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("DISPENSARY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(v) = args.port {
            builder = builder.set_override("server.port", v)?;
        }
        if let Some(v) = args.database_url {
            builder = builder.set_override("db.url", v)?;
        }
        if let Some(v) = args.redis_url {
            builder = builder.set_override("redis.url", v)?;
        }
        if let Some(v) = args.persistence_mode {
            builder = builder.set_override("persistence.mode", v)?;
        }
        if let Some(v) = args.lock_store {
            builder = builder.set_override("lock.store", v)?;
        }

        Ok(Configuration {
            config: builder.build()?,
        })
    }

    pub fn from_config(config: Config) -> Self {
        Configuration { config }
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string("server.address")
            .unwrap_or("0.0.0.0".to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int("server.port")
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    // ========================================================================
    // Persistence Configuration
    // ========================================================================

    pub fn persistence_mode(&self) -> StorageMode {
        self.config
            .get_string("persistence.mode")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(StorageMode::ExternalDb)
    }

    /// Create tables from the entities on startup; bootstrap and demos only
    pub fn init_schema(&self) -> bool {
        self.config
            .get_bool("persistence.init_schema")
            .unwrap_or(false)
    }

    pub fn db_url(&self) -> Option<String> {
        self.config.get_string("db.url").ok()
    }

    pub async fn database_connection(
        &self,
    ) -> Result<DatabaseConnection, Box<dyn std::error::Error>> {
        let max_connections = self
            .config
            .get_int("db.pool.max_connections")
            .unwrap_or(20) as u32;
        let min_connections = self
            .config
            .get_int("db.pool.min_connections")
            .unwrap_or(1) as u32;
        let connect_timeout = self
            .config
            .get_int("db.pool.connect_timeout")
            .unwrap_or(30) as u64;
        let acquire_timeout = self
            .config
            .get_int("db.pool.acquire_timeout")
            .unwrap_or(8) as u64;
        let idle_timeout = self
            .config
            .get_int("db.pool.idle_timeout")
            .unwrap_or(600) as u64;
        let max_lifetime = self
            .config
            .get_int("db.pool.max_lifetime")
            .unwrap_or(1800) as u64;
        let sqlx_logging = self
            .config
            .get_bool("db.pool.sqlx_logging")
            .unwrap_or(false);

        let url = self.config.get_string("db.url")?;

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .acquire_timeout(Duration::from_secs(acquire_timeout))
            .idle_timeout(Duration::from_secs(idle_timeout))
            .max_lifetime(Duration::from_secs(max_lifetime))
            .sqlx_logging(sqlx_logging);

        let database_connection: DatabaseConnection = Database::connect(opt).await?;

        Ok(database_connection)
    }

    // ========================================================================
    // Lock Configuration
    // ========================================================================

    pub fn lock_store(&self) -> LockStoreKind {
        self.config
            .get_string("lock.store")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LockStoreKind::Redis)
    }

    pub fn redis_url(&self) -> String {
        self.config
            .get_string("redis.url")
            .unwrap_or("redis://127.0.0.1:6379".to_string())
    }

    pub fn lock_options(&self) -> LockOptions {
        let millis = |key: &str, default: u64| {
            self.config
                .get_int(key)
                .ok()
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(default)
        };

        LockOptions::from_millis(
            millis("lock.ttl_ms", DEFAULT_LOCK_TTL_MS),
            millis("lock.max_wait_ms", DEFAULT_MAX_WAIT_MS),
            millis("lock.poll_interval_ms", DEFAULT_POLL_INTERVAL_MS),
        )
    }

    /// Sweep interval for expired entries when the memory lock store is used
    pub fn lock_cleanup_interval(&self) -> Duration {
        Duration::from_millis(
            self.config
                .get_int("lock.cleanup_interval_ms")
                .ok()
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(30_000),
        )
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string("log.dir").ok(),
            self.config.get_bool("log.console").unwrap_or(true),
            self.config.get_bool("log.file").unwrap_or(true),
            self.config
                .get_string("log.level")
                .unwrap_or("info".to_string()),
            self.config.get_string("log.rotation").ok(),
        )
    }
}
