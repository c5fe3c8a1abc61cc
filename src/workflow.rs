use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};
use crate::prompt::Prompts;
use crate::remote::Remote;
use crate::steps::{StepContext, database, django, runtime, services, settings, source, system, tls};

/// A named step of a workflow.
#[derive(Clone, Copy, Serialize)]
pub struct Step {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub run: fn(&StepContext) -> DeployResult<()>,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

const fn step(
    name: &'static str,
    description: &'static str,
    run: fn(&StepContext) -> DeployResult<()>,
) -> Step {
    Step {
        name,
        description,
        run,
    }
}

const SETUP: &[Step] = &[
    step("install-updates", "apt-get update and dist-upgrade", system::install_updates),
    step("install-packages", "system packages and virtualenvwrapper", system::install_packages),
    step("create-database", "PostgreSQL database, role and grants", database::create_database),
    step("shell-profile", "virtualenvwrapper lines in ~/.bashrc", system::shell_profile),
    step("runtime", "python interpreter and virtualenv", runtime::setup),
    step("directories", "site directory tree", source::directories),
    step("source", "clone or reset to the local commit", source::sync),
    step("settings", "production settings and secret key", settings::materialize),
    step("dependencies", "pip install requirements", runtime::update_dependencies),
    step("gunicorn", "gunicorn systemd unit", services::gunicorn),
    step("nginx", "nginx site over HTTP", services::nginx),
    step("firewall", "ufw rules", system::firewall),
    step("certificates", "DH params, TLS snippets, letsencrypt", tls::certificates),
    step("nginx-tls", "nginx site over HTTPS", services::nginx_tls),
    step("renewal-cron", "certificate renewal crontab", system::renewal_cron),
    step("initial-migration", "migrations, static files, superuser", django::initial_migration),
    step("restart-gunicorn", "restart the application", services::restart_gunicorn),
];

const DEPLOY: &[Step] = &[
    step("directories", "site directory tree", source::directories),
    step("source", "clone or reset to the local commit", source::sync),
    step("settings", "production settings and secret key", settings::materialize),
    step("dependencies", "pip install requirements", runtime::update_dependencies),
    step("static-files", "collectstatic", django::static_files),
    step("migrate", "apply database migrations", django::migrate),
    step("restart-gunicorn", "restart the application", services::restart_gunicorn),
];

/// The two top-level workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    /// Provision a fresh host end to end.
    Setup,
    /// Redeploy code to an already provisioned host.
    Deploy,
}

impl Workflow {
    #[must_use]
    pub const fn steps(self) -> &'static [Step] {
        match self {
            Self::Setup => SETUP,
            Self::Deploy => DEPLOY,
        }
    }

    /// Prompts this workflow expects remote commands to raise.
    #[must_use]
    pub fn prompts(self, config: &DeployConfig) -> Prompts {
        match self {
            Self::Setup => Prompts::for_setup(config),
            Self::Deploy => Prompts::for_deploy(config),
        }
    }

    /// Run every step in order against `remote`. The first failure
    /// stops the workflow and is reported with the step's name.
    pub fn run(
        self,
        remote: &dyn Remote,
        config: &DeployConfig,
        login_user: &str,
        commit: &str,
    ) -> DeployResult<()> {
        if login_user != config.user_name {
            tracing::warn!(
                "logging in as {login_user} but configured user is {}; \
                 the site tree belongs to {login_user}",
                config.user_name
            );
        }

        let ctx = StepContext::new(remote, config, login_user, commit);
        let steps = self.steps();
        let total = steps.len();

        for (i, step) in steps.iter().enumerate() {
            tracing::info!("[{}/{total}] {}: {}", i + 1, step.name, step.description);
            (step.run)(&ctx).map_err(|e| DeployError::StepFailed {
                step: step.name,
                source: Box::new(e),
            })?;
        }

        tracing::info!("{self} finished at commit {commit}");
        Ok(())
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::Deploy => "deploy",
        })
    }
}

impl FromStr for Workflow {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(Self::Setup),
            "deploy" => Ok(Self::Deploy),
            other => Err(DeployError::Other(format!("unknown workflow: {other}"))),
        }
    }
}

/// Names of the steps that only the setup workflow runs.
#[must_use]
pub fn provisioning_only() -> Vec<&'static str> {
    let deploy: Vec<&str> = DEPLOY.iter().map(|s| s.name).collect();
    SETUP
        .iter()
        .map(|s| s.name)
        .filter(|name| !deploy.contains(name))
        .collect()
}
