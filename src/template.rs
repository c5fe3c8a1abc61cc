use std::collections::BTreeMap;

use handlebars::Handlebars;
use regex::Regex;

use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};
use crate::guard;
use crate::layout::SiteLayout;
use crate::remote::Remote;

/// The service configuration files rendered during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    GunicornUnit,
    NginxSite,
    NginxTlsSite,
    TlsSiteSnippet,
    TlsParams,
}

impl TemplateKind {
    /// File name looked up in the deployed `deploy_tools`
    /// directory before falling back to the built-in default.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::GunicornUnit => "gunicorn-systemd.template.conf",
            Self::NginxSite => "nginx.template.conf",
            Self::NginxTlsSite => "nginx.ssl-template.conf",
            Self::TlsSiteSnippet => "ssl-sitename.conf",
            Self::TlsParams => "ssl-params.conf",
        }
    }

    #[must_use]
    pub const fn default_text(self) -> &'static str {
        match self {
            Self::GunicornUnit => include_str!("../templates/gunicorn-systemd.template.conf"),
            Self::NginxSite => include_str!("../templates/nginx.template.conf"),
            Self::NginxTlsSite => include_str!("../templates/nginx.ssl-template.conf"),
            Self::TlsSiteSnippet => include_str!("../templates/ssl-sitename.conf"),
            Self::TlsParams => include_str!("../templates/ssl-params.conf"),
        }
    }
}

/// Token names substituted into templates as `{{APP_NAME}}`,
/// `{{SITE_NAME}}`, `{{VENV_NAME}}` and `{{USER_NAME}}`.
pub const TOKENS: [&str; 4] = ["APP_NAME", "SITE_NAME", "VENV_NAME", "USER_NAME"];

/// Values for [`TOKENS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars(BTreeMap<&'static str, String>);

impl TemplateVars {
    #[must_use]
    pub fn new(config: &DeployConfig, layout: &SiteLayout) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("APP_NAME", config.app_name.clone());
        vars.insert("SITE_NAME", config.site_name.clone());
        vars.insert("VENV_NAME", config.venv_name.clone());
        vars.insert("USER_NAME", layout.user.clone());
        Self(vars)
    }
}

/// Fill every `{{TOKEN}}` in `text`. An unknown token is an
/// error rather than an empty substitution, and so is a token name
/// left bare (`SITE_NAME` without braces) in the output.
pub fn render(name: &str, text: &str, vars: &TemplateVars) -> DeployResult<String> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);

    let rendered = handlebars
        .render_template(text, &vars.0)
        .map_err(|e| DeployError::Template(format!("{name}: {e}")))?;

    if let Some(token) = bare_token(&rendered)? {
        return Err(DeployError::Template(format!(
            "{name}: unresolved token {token}, expected {{{{{token}}}}}"
        )));
    }
    Ok(rendered)
}

fn bare_token(rendered: &str) -> DeployResult<Option<String>> {
    let re = Regex::new(&format!(r"\b({})\b", TOKENS.join("|")))
        .map_err(|e| DeployError::Template(e.to_string()))?;
    Ok(re.find(rendered).map(|m| m.as_str().to_string()))
}

/// Load a template, preferring the copy shipped in the deployed
/// source tree, and render it.
pub fn render_kind(
    remote: &dyn Remote,
    layout: &SiteLayout,
    kind: TemplateKind,
    vars: &TemplateVars,
) -> DeployResult<String> {
    let override_path = format!("{}/{}", layout.deploy_tools, kind.file_name());
    let text = if guard::exists(remote, &override_path)? {
        tracing::debug!("using template {override_path}");
        remote.read_file(&override_path)?
    } else {
        kind.default_text().to_string()
    };
    render(kind.file_name(), &text, vars)
}
