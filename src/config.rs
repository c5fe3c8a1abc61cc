use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DeployError, DeployResult};

/// Environment variable consulted when the config file leaves
/// `password` empty.
pub const PASSWORD_ENV: &str = "DEPLOY_PASSWORD";

/// Named values shared by every provisioning and deployment
/// step.
///
/// Loaded once per invocation and passed by reference; steps
/// never read configuration from anywhere else.
///
/// # Example
///
/// ```
/// use trebuchet::DeployConfig;
///
/// let config = DeployConfig::new("blog", "blog.example.com")
///     .repo_url("https://github.com/me/blog.git")
///     .python_version("3.6.1")
///     .venv_name("blog")
///     .user_name("deploy")
///     .password("hunter2")
///     .letsencrypt_email("ops@example.com");
///
/// assert_eq!(config.database_name(), "blog_db");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    pub app_name: String,
    pub site_name: String,
    pub repo_url: String,
    pub python_version: String,
    pub venv_name: String,
    pub user_name: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    pub letsencrypt_email: String,
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
    #[serde(default = "default_renew_schedule")]
    pub renew_schedule: String,
}

fn default_packages() -> Vec<String> {
    [
        "git",
        "python3-pip",
        "python3-dev",
        "libpq-dev",
        "postgresql",
        "postgresql-contrib",
        "nginx",
        "letsencrypt",
        "build-essential",
        "libssl-dev",
        "zlib1g-dev",
        "libbz2-dev",
        "libreadline-dev",
        "libsqlite3-dev",
    ]
    .iter()
    .map(|p| (*p).to_string())
    .collect()
}

fn default_renew_schedule() -> String {
    "15 3 * * *".to_string()
}

impl DeployConfig {
    #[must_use]
    pub fn new(app_name: &str, site_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            site_name: site_name.to_string(),
            repo_url: String::new(),
            python_version: String::new(),
            venv_name: app_name.to_string(),
            user_name: String::new(),
            password: String::new(),
            letsencrypt_email: String::new(),
            packages: default_packages(),
            renew_schedule: default_renew_schedule(),
        }
    }

    #[must_use]
    pub fn repo_url(mut self, url: &str) -> Self {
        self.repo_url = url.to_string();
        self
    }

    #[must_use]
    pub fn python_version(mut self, version: &str) -> Self {
        self.python_version = version.to_string();
        self
    }

    #[must_use]
    pub fn venv_name(mut self, name: &str) -> Self {
        self.venv_name = name.to_string();
        self
    }

    #[must_use]
    pub fn user_name(mut self, name: &str) -> Self {
        self.user_name = name.to_string();
        self
    }

    #[must_use]
    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    #[must_use]
    pub fn letsencrypt_email(mut self, email: &str) -> Self {
        self.letsencrypt_email = email.to_string();
        self
    }

    #[must_use]
    pub fn packages(mut self, packages: &[&str]) -> Self {
        self.packages = packages.iter().map(|p| (*p).to_string()).collect();
        self
    }

    #[must_use]
    pub fn renew_schedule(mut self, schedule: &str) -> Self {
        self.renew_schedule = schedule.to_string();
        self
    }

    /// Name of the PostgreSQL database owned by the application.
    #[must_use]
    pub fn database_name(&self) -> String {
        format!("{}_db", self.app_name)
    }

    /// Parse a YAML document. The password falls back to
    /// [`PASSWORD_ENV`] when the document leaves it empty.
    pub fn from_yaml(content: &str) -> DeployResult<Self> {
        let mut config: Self = serde_yaml::from_str(content)?;
        if config.password.is_empty() {
            config.password = std::env::var(PASSWORD_ENV)
                .map_err(|_| DeployError::EnvMissing(PASSWORD_ENV.into()))?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file.
    pub fn load(path: &Path) -> DeployResult<Self> {
        if !path.exists() {
            return Err(DeployError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Reject values that would produce broken paths or commands.
    pub fn validate(&self) -> DeployResult<()> {
        let required = [
            ("app_name", &self.app_name),
            ("site_name", &self.site_name),
            ("repo_url", &self.repo_url),
            ("python_version", &self.python_version),
            ("venv_name", &self.venv_name),
            ("user_name", &self.user_name),
            ("password", &self.password),
            ("letsencrypt_email", &self.letsencrypt_email),
            ("renew_schedule", &self.renew_schedule),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DeployError::InvalidConfig(format!("{field} is empty")));
            }
        }

        let names = [
            ("app_name", &self.app_name),
            ("site_name", &self.site_name),
            ("venv_name", &self.venv_name),
            ("user_name", &self.user_name),
        ];
        for (field, value) in names {
            if value.contains(|c: char| c.is_whitespace() || matches!(c, '/' | '\'' | '"')) {
                return Err(DeployError::InvalidConfig(format!(
                    "{field} '{value}' contains whitespace, a quote or '/'"
                )));
            }
        }

        if self.renew_schedule.split_whitespace().count() != 5 {
            return Err(DeployError::InvalidConfig(format!(
                "renew_schedule '{}' is not a five-field cron expression",
                self.renew_schedule
            )));
        }

        Ok(())
    }
}

/// The host a workflow runs against, given as `user@host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub user: String,
    pub host: String,
}

impl Target {
    #[must_use]
    pub fn new(user: &str, host: &str) -> Self {
        Self {
            user: user.to_string(),
            host: host.to_string(),
        }
    }
}

impl FromStr for Target {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user, host) = s
            .split_once('@')
            .ok_or_else(|| DeployError::InvalidTarget(s.to_string()))?;
        if user.is_empty() || host.is_empty() || host.contains('@') {
            return Err(DeployError::InvalidTarget(s.to_string()));
        }
        Ok(Self::new(user, host))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}
