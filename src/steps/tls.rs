use crate::error::DeployResult;
use crate::steps::StepContext;
use crate::steps::services::install_config;
use crate::template::TemplateKind;

pub const DHPARAM_PATH: &str = "/etc/ssl/certs/dhparam.pem";

#[must_use]
pub fn webroot(site_name: &str) -> String {
    format!("/var/www/{site_name}/html")
}

/// The `letsencrypt` invocation. `--keep-until-expiring` makes a
/// rerun reuse a valid certificate instead of reissuing.
#[must_use]
pub fn issue_command(site_name: &str, email: &str) -> String {
    format!(
        "letsencrypt certonly -a webroot --keep-until-expiring --agree-tos \
         --email {email} --webroot-path={} -d {site_name}",
        webroot(site_name)
    )
}

/// Generate Diffie-Hellman parameters once, install the TLS nginx
/// snippets, and request a certificate through the webroot.
pub fn certificates(ctx: &StepContext) -> DeployResult<()> {
    let site = &ctx.config.site_name;

    if ctx.exists(DHPARAM_PATH)? {
        tracing::info!("{DHPARAM_PATH} already generated");
    } else {
        tracing::info!("generating {DHPARAM_PATH}, this takes a while");
        ctx.sudo(format!("openssl dhparam -out {DHPARAM_PATH} 2048"))?;
    }

    install_config(
        ctx,
        TemplateKind::TlsSiteSnippet,
        &format!("ssl-{site}.conf"),
        &format!("/etc/nginx/snippets/ssl-{site}.conf"),
    )?;
    install_config(
        ctx,
        TemplateKind::TlsParams,
        "nginx-ssl-params.conf",
        "/etc/nginx/snippets/ssl-params.conf",
    )?;

    ctx.sudo(format!("mkdir -p {}", webroot(site)))?;
    ctx.sudo(issue_command(site, &ctx.config.letsencrypt_email))?;
    Ok(())
}
