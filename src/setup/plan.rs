//! Ordered list of setup steps for a role.

use crate::config::EntrypointConfig;
use crate::process::CommandSpec;

/// Variable every Django child process needs.
pub const SETTINGS_MODULE_ENV: &str = "DJANGO_SETTINGS_MODULE";

/// Build the setup steps for the configured role, in execution order.
///
/// Only the web role migrates and collects static files; worker and beat
/// start straight after the dependency wait.
pub fn setup_steps(config: &EntrypointConfig) -> Vec<CommandSpec> {
    if !config.role.runs_setup() {
        return Vec::new();
    }

    let mut steps = vec![
        manage(config, "migrate", ["migrate", "--noinput"]),
        manage(config, "collectstatic", ["collectstatic", "--noinput"]),
    ];

    for command in &config.setup.extra_commands {
        let words: Vec<&str> = command.split_whitespace().collect();
        if let Some(name) = words.first() {
            steps.push(manage(config, *name, words.iter().copied()));
        }
    }

    steps
}

fn manage<I, S>(config: &EntrypointConfig, label: &str, args: I) -> CommandSpec
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CommandSpec::new(label, config.setup.python.as_str())
        .arg(config.setup.manage_script.as_str())
        .args(args)
        .env(SETTINGS_MODULE_ENV, config.setup.settings_module.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Role;

    #[test]
    fn web_role_migrates_then_collects() {
        let steps = setup_steps(&EntrypointConfig::default());
        let lines: Vec<String> = steps.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "python manage.py migrate --noinput",
                "python manage.py collectstatic --noinput",
            ]
        );
        assert_eq!(
            steps[0].env.get(SETTINGS_MODULE_ENV).map(String::as_str),
            Some("API.settings")
        );
    }

    #[test]
    fn extra_commands_run_last_in_order() {
        let mut config = EntrypointConfig::default();
        config.setup.extra_commands = vec![
            "init_ai_models".to_string(),
            "update_plan_features --verbosity 2".to_string(),
        ];
        let steps = setup_steps(&config);
        let labels: Vec<&str> = steps.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "migrate",
                "collectstatic",
                "init_ai_models",
                "update_plan_features"
            ]
        );
        assert_eq!(
            steps[3].args,
            vec!["manage.py", "update_plan_features", "--verbosity", "2"]
        );
    }

    #[test]
    fn celery_roles_have_no_setup() {
        let mut config = EntrypointConfig::default();
        config.role = Role::Worker;
        assert!(setup_steps(&config).is_empty());
        config.role = Role::Beat;
        assert!(setup_steps(&config).is_empty());
    }
}
