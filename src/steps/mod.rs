//! Named provisioning and deployment steps.
//!
//! Each step is a plain function over a [`StepContext`]. Steps run
//! their commands strictly in order and return on the first
//! failure.

pub mod database;
pub mod django;
pub mod runtime;
pub mod services;
pub mod settings;
pub mod source;
pub mod system;
pub mod tls;

use crate::config::DeployConfig;
use crate::error::DeployResult;
use crate::layout::SiteLayout;
use crate::remote::{Remote, RemoteCommand};

/// Everything a step needs: the host, the configuration, the
/// derived remote paths, and the commit to deploy.
pub struct StepContext<'a> {
    pub remote: &'a dyn Remote,
    pub config: &'a DeployConfig,
    pub layout: SiteLayout,
    pub commit: String,
}

impl<'a> StepContext<'a> {
    /// `login_user` is the SSH user; it owns the site tree.
    #[must_use]
    pub fn new(
        remote: &'a dyn Remote,
        config: &'a DeployConfig,
        login_user: &str,
        commit: &str,
    ) -> Self {
        Self {
            remote,
            config,
            layout: SiteLayout::new(login_user, &config.site_name, &config.venv_name),
            commit: commit.to_string(),
        }
    }

    /// Run a command as the login user.
    pub fn run(&self, line: impl Into<String>) -> DeployResult<String> {
        self.remote.exec(&RemoteCommand::new(line))
    }

    /// Run a command through `sudo`.
    pub fn sudo(&self, line: impl Into<String>) -> DeployResult<String> {
        self.remote.exec(&RemoteCommand::new(line).sudo())
    }

    pub fn exists(&self, path: &str) -> DeployResult<bool> {
        crate::guard::exists(self.remote, path)
    }

    /// `cd <source> && <venv>/bin/python manage.py <args>`
    pub fn manage(&self, args: &str) -> DeployResult<String> {
        self.run(format!(
            "cd {} && {} manage.py {args}",
            self.layout.source,
            self.layout.venv_bin("python")
        ))
    }
}
