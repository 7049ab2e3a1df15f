//! Daemon configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `DISPATCH__*`
//! environment variables (`__` separates sections, e.g. `DISPATCH__HTTP__PORT`).

use anyhow::{bail, Context, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;

use dispatch_api_http::server::{DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT};
use dispatch_api_rpc::server::{DEFAULT_RPC_HOST, DEFAULT_RPC_PORT};
use dispatch_core::application::worker::constants::{DEFAULT_TICK_INTERVAL, DEFAULT_WORKER_COUNT};
use dispatch_infra_system::{HandlerKind, JobKind};

/// Overrides the config file location
pub const CONFIG_PATH_ENV: &str = "DISPATCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "~/.dispatch/dispatch.toml";
const ENV_PREFIX: &str = "DISPATCH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub http: HttpConfig,
    pub rpc: RpcConfig,
    pub workers: WorkersConfig,
    pub scheduler: SchedulerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub count: usize,
    pub handler: HandlerKind,
    pub env_allowlist: Vec<String>,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_WORKER_COUNT,
            handler: HandlerKind::default(),
            env_allowlist: vec!["PATH".to_string(), "HOME".to_string(), "USER".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_ms: u64,
    pub jobs: Vec<JobConfig>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            jobs: vec![
                JobConfig::new("system-health", JobKind::SystemHealth, 30_000),
                JobConfig::new("queue-depth", JobKind::QueueDepth, 10_000),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub kind: JobKind,
    pub interval_ms: u64,
    #[serde(default)]
    pub detached: bool,
    /// Only used by `delayed-check`
    #[serde(default)]
    pub delay_ms: u64,
}

impl JobConfig {
    fn new(name: &str, kind: JobKind, interval_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            interval_ms,
            detached: false,
            delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl DaemonConfig {
    /// Load from the config file and environment
    pub fn load() -> Result<Self> {
        let path = config_path();
        let builder = Config::builder()
            .add_source(
                File::from(path.clone())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(env_source());
        Self::from_builder(builder)
            .with_context(|| format!("Failed to load configuration ({})", path.display()))
    }

    pub fn from_builder(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers.count < 1 {
            bail!("workers.count must be at least 1");
        }
        if self.scheduler.tick_ms < 1 {
            bail!("scheduler.tick_ms must be at least 1");
        }
        for job in &self.scheduler.jobs {
            if job.interval_ms < 1 {
                bail!("scheduler job '{}': interval_ms must be at least 1", job.name);
            }
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("workers.env_allowlist")
}

fn config_path() -> PathBuf {
    let raw = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}
