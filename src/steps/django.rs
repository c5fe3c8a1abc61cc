use crate::error::DeployResult;
use crate::ssh::quote;
use crate::steps::StepContext;

/// Python run through `manage.py shell -c`; prints `True` when the
/// user exists.
#[must_use]
pub fn user_exists_script(user: &str) -> String {
    format!(
        "from django.contrib.auth import get_user_model; \
         print(get_user_model().objects.filter(username='{user}').exists())"
    )
}

fn superuser_exists(ctx: &StepContext) -> DeployResult<bool> {
    let script = user_exists_script(&ctx.config.user_name);
    let out = ctx.manage(&format!("shell -c {}", quote(&script)?))?;
    Ok(out.lines().any(|l| l.trim() == "True"))
}

/// First migration on a fresh host, ending with the superuser.
/// `createsuperuser` asks for the password twice; the setup
/// prompt table answers both. An existing user is left alone.
pub fn initial_migration(ctx: &StepContext) -> DeployResult<()> {
    ctx.manage("makemigrations")?;
    ctx.manage("migrate --noinput")?;
    ctx.manage("collectstatic --noinput")?;

    let user = &ctx.config.user_name;
    if superuser_exists(ctx)? {
        tracing::info!("superuser {user} already exists");
        return Ok(());
    }
    ctx.manage(&format!(
        "createsuperuser --username={user} --email={user}@{}",
        ctx.config.site_name
    ))?;
    Ok(())
}

pub fn static_files(ctx: &StepContext) -> DeployResult<()> {
    ctx.manage("collectstatic --noinput")?;
    Ok(())
}

pub fn migrate(ctx: &StepContext) -> DeployResult<()> {
    ctx.manage("migrate --noinput")?;
    Ok(())
}
