//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the entrypoint.
//! All types derive Serde traits so the same structure can be read from an
//! optional TOML file before environment overrides are applied.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Interface the web server always binds to.
pub const SERVER_BIND_HOST: &str = "0.0.0.0";

/// Port the web server always binds to.
pub const SERVER_PORT: u16 = 8000;

/// Root configuration for the entrypoint.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EntrypointConfig {
    /// Which long-running program this container hands off to.
    pub role: Role,

    /// How control is transferred to that program.
    pub handoff: HandoffMode,

    /// Database connection descriptor. Presence triggers the dependency wait.
    pub database_url: Option<String>,

    /// Web server (gunicorn) settings.
    pub server: ServerConfig,

    /// Dependency wait settings.
    pub readiness: ReadinessConfig,

    /// Setup step settings (migrate, collectstatic, extra commands).
    pub setup: SetupConfig,

    /// Celery settings for the worker and beat roles.
    pub worker: WorkerConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Process role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Run setup steps, then serve HTTP with gunicorn.
    #[default]
    Web,
    /// Celery task worker.
    Worker,
    /// Celery beat scheduler.
    Beat,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Web => "web",
            Role::Worker => "worker",
            Role::Beat => "beat",
        }
    }

    /// Only the web role migrates the schema and stages assets.
    pub fn runs_setup(&self) -> bool {
        matches!(self, Role::Web)
    }

    /// Worker and beat talk to the Celery broker.
    pub fn needs_broker(&self) -> bool {
        matches!(self, Role::Worker | Role::Beat)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Role::Web),
            "worker" => Ok(Role::Worker),
            "beat" => Ok(Role::Beat),
            other => Err(format!("unknown role '{}' (expected web, worker or beat)", other)),
        }
    }
}

/// Process handoff strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffMode {
    /// Replace the process image (keeps the PID, signals go straight to the server).
    Exec,
    /// Spawn the server as a child, relay termination and mirror its exit status.
    Supervise,
}

impl Default for HandoffMode {
    fn default() -> Self {
        if cfg!(unix) {
            HandoffMode::Exec
        } else {
            HandoffMode::Supervise
        }
    }
}

impl FromStr for HandoffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exec" => Ok(HandoffMode::Exec),
            "supervise" => Ok(HandoffMode::Supervise),
            other => Err(format!("unknown handoff mode '{}' (expected exec or supervise)", other)),
        }
    }
}

/// Web server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server executable.
    pub program: String,

    /// WSGI application path (module:callable).
    pub wsgi_app: String,

    /// Number of worker processes.
    pub workers: u32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Extra arguments appended after the managed flags.
    pub extra_args: Vec<String>,
}

impl ServerConfig {
    /// Bind address passed to the server. Not configurable.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", SERVER_BIND_HOST, SERVER_PORT)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: "gunicorn".to_string(),
            wsgi_app: "API.wsgi:application".to_string(),
            workers: 3,
            timeout_secs: 120,
            extra_args: Vec::new(),
        }
    }
}

/// Dependency wait configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Poll dependencies before setup. When false, descriptors are ignored.
    pub enabled: bool,

    /// Maximum total wait in seconds across all targets.
    pub timeout_secs: u64,

    /// Timeout of a single probe attempt in milliseconds.
    pub connect_timeout_ms: u64,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay between attempts in milliseconds.
    pub max_delay_ms: u64,

    /// Celery broker descriptor, waited on by the worker and beat roles.
    pub redis_url: Option<String>,

    /// Additional targets (`host:port`, `tcp://`, `http(s)://`, service URLs).
    pub extra_targets: Vec<String>,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 60,
            connect_timeout_ms: 2000,
            base_delay_ms: 250,
            max_delay_ms: 5000,
            redis_url: None,
            extra_targets: Vec::new(),
        }
    }
}

/// Setup step configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Python interpreter used to run `manage.py`.
    pub python: String,

    /// Path to the Django management script.
    pub manage_script: String,

    /// Settings module exported to every child process.
    pub settings_module: String,

    /// Management commands run after collectstatic, in order.
    pub extra_commands: Vec<String>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            manage_script: "manage.py".to_string(),
            settings_module: "API.settings".to_string(),
            extra_commands: Vec::new(),
        }
    }
}

/// Celery configuration for the worker and beat roles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub program: String,
    pub app: String,
    pub log_level: String,
    pub concurrency: Option<u32>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: "celery".to_string(),
            app: "API".to_string(),
            log_level: "INFO".to_string(),
            concurrency: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected pretty or json)", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
