/// Remote paths for one site, rooted in the login user's home.
///
/// ```text
/// /home/<user>/
///   .virtualenvs/<venv>/
///   .pyenv/
///   sites/<site>/
///     database/  static/  source/  media/
///     source/deploy_tools/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    pub user: String,
    pub home: String,
    pub site: String,
    pub source: String,
    pub deploy_tools: String,
    pub venv: String,
    pub pyenv: String,
}

impl SiteLayout {
    pub const SUBDIRS: [&'static str; 4] = ["database", "static", "source", "media"];

    #[must_use]
    pub fn new(user: &str, site_name: &str, venv_name: &str) -> Self {
        let home = format!("/home/{user}");
        let site = format!("{home}/sites/{site_name}");
        let source = format!("{site}/source");
        Self {
            user: user.to_string(),
            deploy_tools: format!("{source}/deploy_tools"),
            venv: format!("{home}/.virtualenvs/{venv_name}"),
            pyenv: format!("{home}/.pyenv"),
            home,
            site,
            source,
        }
    }

    #[must_use]
    pub fn subdirs(&self) -> Vec<String> {
        Self::SUBDIRS
            .iter()
            .map(|d| format!("{}/{d}", self.site))
            .collect()
    }

    #[must_use]
    pub fn venv_bin(&self, program: &str) -> String {
        format!("{}/bin/{program}", self.venv)
    }

    #[must_use]
    pub fn pyenv_python(&self, version: &str) -> String {
        format!("{}/versions/{version}/bin/python", self.pyenv)
    }

    #[must_use]
    pub fn settings_file(&self, app_name: &str) -> String {
        format!("{}/{app_name}/settings.py", self.source)
    }

    #[must_use]
    pub fn secret_key_file(&self, app_name: &str) -> String {
        format!("{}/{app_name}/secret_key.py", self.source)
    }

    #[must_use]
    pub fn bashrc(&self) -> String {
        format!("{}/.bashrc", self.home)
    }
}
