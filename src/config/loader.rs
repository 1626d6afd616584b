//! Configuration loading from an optional file and the process environment.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::EntrypointConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error reading config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error in config file: {}", e),
            ConfigError::InvalidValue { var, value, reason } => {
                write!(f, "Invalid value '{}' for {}: {}", value, var, reason)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Snapshot of environment variables. Empty values read as unset.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Override a single variable, e.g. from a CLI flag.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    var: key,
                    value: raw.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    fn flag(&self, key: &'static str) -> Result<Option<bool>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(ConfigError::InvalidValue {
                    var: key,
                    value: raw.to_string(),
                    reason: "expected a boolean (true/false, 1/0, yes/no, on/off)".to_string(),
                }),
            },
        }
    }

    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}

/// Load configuration: defaults, then the optional TOML file, then the environment.
///
/// The result is validated before it is returned.
pub fn load_config(path: Option<&Path>, env: &Env) -> Result<EntrypointConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => EntrypointConfig::default(),
    };

    apply_env(&mut config, env)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<EntrypointConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Apply environment overrides on top of `config`.
pub fn apply_env(config: &mut EntrypointConfig, env: &Env) -> Result<(), ConfigError> {
    if let Some(role) = env.parse("ENTRYPOINT_ROLE")? {
        config.role = role;
    }
    if let Some(mode) = env.parse("ENTRYPOINT_HANDOFF")? {
        config.handoff = mode;
    }
    if let Some(url) = env.string("DATABASE_URL") {
        config.database_url = Some(url);
    }

    let server = &mut config.server;
    if let Some(workers) = env.parse("GUNICORN_WORKERS")? {
        server.workers = workers;
    }
    if let Some(timeout) = env.parse("GUNICORN_TIMEOUT")? {
        server.timeout_secs = timeout;
    }
    if let Some(program) = env.string("GUNICORN_BIN") {
        server.program = program;
    }
    if let Some(app) = env.string("WSGI_APPLICATION") {
        server.wsgi_app = app;
    }

    let readiness = &mut config.readiness;
    if let Some(enabled) = env.flag("ENTRYPOINT_WAIT_ENABLED")? {
        readiness.enabled = enabled;
    }
    if let Some(timeout) = env.parse("ENTRYPOINT_WAIT_TIMEOUT")? {
        readiness.timeout_secs = timeout;
    }
    if let Some(timeout) = env.parse("ENTRYPOINT_WAIT_CONNECT_TIMEOUT_MS")? {
        readiness.connect_timeout_ms = timeout;
    }
    if let Some(url) = env.string("REDIS_URL") {
        readiness.redis_url = Some(url);
    }
    if let Some(targets) = env.list("ENTRYPOINT_WAIT_FOR") {
        readiness.extra_targets = targets;
    }

    let setup = &mut config.setup;
    if let Some(python) = env.string("PYTHON_BIN") {
        setup.python = python;
    }
    if let Some(script) = env.string("DJANGO_MANAGE_SCRIPT") {
        setup.manage_script = script;
    }
    if let Some(module) = env.string("DJANGO_SETTINGS_MODULE") {
        setup.settings_module = module;
    }
    if let Some(commands) = env.list("ENTRYPOINT_MANAGE_COMMANDS") {
        setup.extra_commands = commands;
    }

    let worker = &mut config.worker;
    if let Some(program) = env.string("CELERY_BIN") {
        worker.program = program;
    }
    if let Some(app) = env.string("CELERY_APP") {
        worker.app = app;
    }
    if let Some(level) = env.string("CELERY_LOG_LEVEL") {
        worker.log_level = level;
    }
    if let Some(concurrency) = env.parse("CELERY_CONCURRENCY")? {
        worker.concurrency = Some(concurrency);
    }

    let observability = &mut config.observability;
    if let Some(level) = env.string("ENTRYPOINT_LOG_LEVEL") {
        observability.log_level = level;
    }
    if let Some(format) = env.parse("ENTRYPOINT_LOG_FORMAT")? {
        observability.log_format = format;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{HandoffMode, LogFormat, Role};
    use std::io::Write;

    #[test]
    fn empty_environment_yields_defaults() {
        let config = load_config(None, &Env::default()).unwrap();
        assert_eq!(config.server.workers, 3);
        assert_eq!(config.server.timeout_secs, 120);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let env = Env::from_pairs([
            ("GUNICORN_WORKERS", "8"),
            ("GUNICORN_TIMEOUT", "30"),
            ("DATABASE_URL", "postgres://app:secret@db:5432/app"),
            ("ENTRYPOINT_ROLE", "worker"),
            ("ENTRYPOINT_HANDOFF", "supervise"),
            ("ENTRYPOINT_MANAGE_COMMANDS", "init_ai_models, init_trial_credits,"),
            ("ENTRYPOINT_LOG_FORMAT", "json"),
            ("ENTRYPOINT_WAIT_ENABLED", "off"),
        ]);
        let config = load_config(None, &env).unwrap();

        assert_eq!(config.server.workers, 8);
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.role, Role::Worker);
        assert_eq!(config.handoff, HandoffMode::Supervise);
        assert_eq!(
            config.setup.extra_commands,
            vec!["init_ai_models".to_string(), "init_trial_credits".to_string()]
        );
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(!config.readiness.enabled);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://app:secret@db:5432/app")
        );
    }

    #[test]
    fn empty_values_count_as_unset() {
        let env = Env::from_pairs([("GUNICORN_WORKERS", ""), ("DATABASE_URL", "  ")]);
        let config = load_config(None, &env).unwrap();
        assert_eq!(config.server.workers, 3);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn unparsable_number_names_the_variable() {
        let env = Env::from_pairs([("GUNICORN_WORKERS", "three")]);
        let err = load_config(None, &env).unwrap_err();
        match err {
            ConfigError::InvalidValue { var, value, .. } => {
                assert_eq!(var, "GUNICORN_WORKERS");
                assert_eq!(value, "three");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn environment_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nworkers = 6\ntimeout_secs = 90\n\n[setup]\npython = \"/usr/bin/python3\""
        )
        .unwrap();

        let env = Env::from_pairs([("GUNICORN_WORKERS", "2")]);
        let config = load_config(Some(file.path()), &env).unwrap();

        assert_eq!(config.server.workers, 2);
        assert_eq!(config.server.timeout_secs, 90);
        assert_eq!(config.setup.python, "/usr/bin/python3");
    }

    #[test]
    fn file_cannot_smuggle_managed_server_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nextra_args = [\"--workers\", \"1\", \"--bind\", \"127.0.0.1:9000\", \"--timeout\", \"5\"]"
        )
        .unwrap();

        let env = Env::from_pairs([("GUNICORN_WORKERS", "8")]);
        let err = load_config(Some(file.path()), &env).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().all(|e| e.field == "server.extra_args"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(
            Some(Path::new("/nonexistent/entrypoint.toml")),
            &Env::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let env = Env::from_pairs([("GUNICORN_WORKERS", "0")]);
        let err = load_config(None, &env).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
    }
}
