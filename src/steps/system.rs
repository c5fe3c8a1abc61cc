use crate::error::DeployResult;
use crate::guard;
use crate::steps::StepContext;

/// Lines virtualenvwrapper needs in `~/.bashrc`.
pub const PROFILE_LINES: [&str; 3] = [
    "export WORKON_HOME=~/.virtualenvs",
    "export VIRTUALENVWRAPPER_PYTHON=/usr/bin/python3",
    "source /usr/local/bin/virtualenvwrapper.sh",
];

/// Firewall rules opened on a fresh host, as passed to `ufw allow`.
pub const FIREWALL_RULES: [&str; 2] = ["OpenSSH", "Nginx Full"];

pub fn install_updates(ctx: &StepContext) -> DeployResult<()> {
    ctx.sudo("apt-get update")?;
    ctx.sudo("apt-get dist-upgrade -y")?;
    Ok(())
}

pub fn install_packages(ctx: &StepContext) -> DeployResult<()> {
    ctx.sudo(format!("apt-get install -y {}", ctx.config.packages.join(" ")))?;
    ctx.sudo("pip3 install virtualenv virtualenvwrapper")?;
    Ok(())
}

pub fn shell_profile(ctx: &StepContext) -> DeployResult<()> {
    let bashrc = ctx.layout.bashrc();
    for line in PROFILE_LINES {
        if guard::append_line(ctx.remote, &bashrc, line)? {
            tracing::info!("added to {bashrc}: {line}");
        }
    }
    Ok(())
}

/// Open SSH and HTTP(S), then enable the firewall. Rules already
/// listed by `ufw status` are not added again.
pub fn firewall(ctx: &StepContext) -> DeployResult<()> {
    let status = ctx.sudo("ufw status")?;

    for rule in FIREWALL_RULES {
        if status.lines().any(|l| l.starts_with(rule)) {
            tracing::info!("firewall already allows {rule}");
            continue;
        }
        ctx.sudo(format!("ufw allow '{rule}'"))?;
    }

    if status.contains("Status: active") {
        tracing::info!("firewall already active");
    } else {
        ctx.sudo("ufw enable")?;
    }
    Ok(())
}

/// The crontab entry renewing certificates.
#[must_use]
pub fn renewal_line(schedule: &str) -> String {
    format!("{schedule} /usr/bin/letsencrypt renew")
}

/// Add the certificate renewal line to the login user's crontab,
/// keeping existing entries.
pub fn renewal_cron(ctx: &StepContext) -> DeployResult<()> {
    let line = renewal_line(&ctx.config.renew_schedule);
    let current = ctx.run("crontab -l 2>/dev/null || true")?;

    if current.lines().any(|l| l.trim() == line) {
        tracing::info!("crontab already renews certificates");
        return Ok(());
    }

    ctx.run(format!("(crontab -l 2>/dev/null; echo '{line}') | crontab -"))?;
    Ok(())
}
