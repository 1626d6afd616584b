//! Long-running program for each role.

use crate::config::{EntrypointConfig, Role};
use crate::process::CommandSpec;
use crate::setup::SETTINGS_MODULE_ENV;

/// Build the command the entrypoint hands off to.
///
/// The web server always binds `0.0.0.0:8000`; only worker count, timeout
/// and trailing extra arguments come from configuration.
pub fn server_command(config: &EntrypointConfig) -> CommandSpec {
    let settings = config.setup.settings_module.as_str();

    match config.role {
        Role::Web => {
            let server = &config.server;
            CommandSpec::new("gunicorn", server.program.as_str())
                .arg(server.wsgi_app.as_str())
                .arg("--bind")
                .arg(server.bind_address())
                .arg("--workers")
                .arg(server.workers.to_string())
                .arg("--timeout")
                .arg(server.timeout_secs.to_string())
                .args(server.extra_args.iter().cloned())
                .env(SETTINGS_MODULE_ENV, settings)
        }
        Role::Worker => {
            let worker = &config.worker;
            let mut cmd = CommandSpec::new("celery-worker", worker.program.as_str())
                .arg("-A")
                .arg(worker.app.as_str())
                .arg("worker")
                .arg("-l")
                .arg(worker.log_level.as_str());
            if let Some(concurrency) = worker.concurrency {
                cmd = cmd.arg("--concurrency").arg(concurrency.to_string());
            }
            cmd.env(SETTINGS_MODULE_ENV, settings)
        }
        Role::Beat => {
            let worker = &config.worker;
            CommandSpec::new("celery-beat", worker.program.as_str())
                .arg("-A")
                .arg(worker.app.as_str())
                .arg("beat")
                .arg("-l")
                .arg(worker.log_level.as_str())
                .env(SETTINGS_MODULE_ENV, settings)
        }
    }
}
