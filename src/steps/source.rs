use std::path::Path;

use crate::cmd;
use crate::error::{DeployError, DeployResult};
use crate::steps::StepContext;

/// The commit checked out in the local repository at `repo_dir`.
///
/// Deployments are pinned to this commit rather than to a branch
/// tip: the host ends up running whatever the operator has checked
/// out when invoking the tool.
pub fn local_commit(repo_dir: &Path) -> DeployResult<String> {
    let dir = repo_dir.to_string_lossy();
    let commit = cmd::run("git", &["-C", &dir, "log", "-n", "1", "--format=%H"])?;
    if commit.is_empty() {
        return Err(DeployError::Other(format!(
            "no commit checked out in {dir}"
        )));
    }
    Ok(commit)
}

/// Create the site tree. `mkdir -p` leaves existing directories
/// and their contents alone.
pub fn directories(ctx: &StepContext) -> DeployResult<()> {
    for dir in ctx.layout.subdirs() {
        ctx.run(format!("mkdir -p {dir}"))?;
    }
    Ok(())
}

/// Clone on first run, then fetch and hard-reset the working copy
/// to the pinned commit.
pub fn sync(ctx: &StepContext) -> DeployResult<()> {
    let source = &ctx.layout.source;

    if ctx.exists(&format!("{source}/.git"))? {
        tracing::info!("{source} already cloned");
    } else {
        ctx.run(format!("git clone {} {source}", ctx.config.repo_url))?;
    }

    ctx.run(format!("cd {source} && git fetch"))?;
    ctx.run(format!("cd {source} && git reset --hard {}", ctx.commit))?;
    Ok(())
}
