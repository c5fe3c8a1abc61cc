use crate::error::DeployResult;
use crate::steps::StepContext;
use crate::template::{self, TemplateKind, TemplateVars};

pub const GUNICORN_SERVICE: &str = "gunicorn";
pub const GUNICORN_UNIT_PATH: &str = "/etc/systemd/system/gunicorn.service";

/// Render `kind`, stage it under `deploy_tools/<staged_name>`, and
/// copy it to `system_path`. The copy always runs so template
/// changes reach the host.
pub(crate) fn install_config(
    ctx: &StepContext,
    kind: TemplateKind,
    staged_name: &str,
    system_path: &str,
) -> DeployResult<()> {
    let vars = TemplateVars::new(ctx.config, &ctx.layout);
    let rendered = template::render_kind(ctx.remote, &ctx.layout, kind, &vars)?;

    let staged = format!("{}/{staged_name}", ctx.layout.deploy_tools);
    ctx.run(format!("mkdir -p {}", ctx.layout.deploy_tools))?;
    ctx.remote.write_file(&rendered, &staged)?;
    ctx.sudo(format!("cp {staged} {system_path}"))?;
    Ok(())
}

/// Install the gunicorn systemd unit. The service is enabled only
/// the first time the unit appears.
pub fn gunicorn(ctx: &StepContext) -> DeployResult<()> {
    let registered = ctx.exists(GUNICORN_UNIT_PATH)?;

    install_config(
        ctx,
        TemplateKind::GunicornUnit,
        "gunicorn.service",
        GUNICORN_UNIT_PATH,
    )?;

    ctx.sudo("systemctl daemon-reload")?;
    if registered {
        tracing::info!("{GUNICORN_SERVICE} already enabled");
    } else {
        ctx.sudo(format!("systemctl enable {GUNICORN_SERVICE}"))?;
    }
    restart_gunicorn(ctx)
}

fn nginx_site(ctx: &StepContext, kind: TemplateKind) -> DeployResult<()> {
    let site = &ctx.config.site_name;
    let available = format!("/etc/nginx/sites-available/{site}");
    let enabled = format!("/etc/nginx/sites-enabled/{site}");

    install_config(ctx, kind, site, &available)?;

    if ctx.exists(&enabled)? {
        tracing::info!("{enabled} already linked");
    } else {
        ctx.sudo(format!("ln -s {available} {enabled}"))?;
    }
    ctx.sudo("systemctl restart nginx")?;
    Ok(())
}

/// Serve the site over plain HTTP; this also exposes the ACME
/// webroot for certificate issuance.
pub fn nginx(ctx: &StepContext) -> DeployResult<()> {
    nginx_site(ctx, TemplateKind::NginxSite)
}

/// Switch the site to the TLS configuration once certificates
/// exist.
pub fn nginx_tls(ctx: &StepContext) -> DeployResult<()> {
    nginx_site(ctx, TemplateKind::NginxTlsSite)
}

pub fn restart_gunicorn(ctx: &StepContext) -> DeployResult<()> {
    ctx.sudo(format!("systemctl restart {GUNICORN_SERVICE}"))?;
    Ok(())
}
