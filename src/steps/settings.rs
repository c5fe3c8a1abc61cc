use crate::error::DeployResult;
use crate::guard;
use crate::secret;
use crate::steps::StepContext;

pub const DEBUG_ON: &str = "DEBUG = True";
pub const DEBUG_OFF: &str = "DEBUG = False";
pub const ALLOWED_HOSTS_PATTERN: &str = "ALLOWED_HOSTS =.+$";
pub const SECRET_KEY_IMPORT: &str = "from .secret_key import SECRET_KEY";

#[must_use]
pub fn allowed_hosts_line(site_name: &str) -> String {
    format!("ALLOWED_HOSTS = [\"{site_name}\"]")
}

/// Turn the checked-out settings into production settings.
///
/// Edits are textual and hit the first match only. The secret key
/// file is written once and survives the hard reset because it is
/// untracked; the import line is re-added whenever the reset has
/// dropped it.
pub fn materialize(ctx: &StepContext) -> DeployResult<()> {
    let app = &ctx.config.app_name;
    let settings = ctx.layout.settings_file(app);

    guard::replace_literal_first(ctx.remote, &settings, DEBUG_ON, DEBUG_OFF)?;
    guard::sed_first(
        ctx.remote,
        &settings,
        ALLOWED_HOSTS_PATTERN,
        &allowed_hosts_line(&ctx.config.site_name),
    )?;

    let key_file = ctx.layout.secret_key_file(app);
    if ctx.exists(&key_file)? {
        tracing::info!("keeping existing secret key");
    } else {
        ctx.remote
            .write_file(&secret::key_module(&secret::generate_key()), &key_file)?;
        tracing::info!("generated secret key at {key_file}");
    }

    guard::append_line(ctx.remote, &settings, SECRET_KEY_IMPORT)?;
    Ok(())
}
