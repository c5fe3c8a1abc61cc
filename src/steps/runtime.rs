use crate::error::DeployResult;
use crate::steps::StepContext;

pub const PYENV_REPO: &str = "https://github.com/pyenv/pyenv.git";

/// Extract the version from `python3 --version` output
/// (`Python 3.6.1`).
#[must_use]
pub fn parse_python_version(output: &str) -> Option<&str> {
    output
        .lines()
        .rev()
        .find_map(|l| l.trim().strip_prefix("Python "))
        .map(str::trim)
}

fn venv_exists(ctx: &StepContext) -> DeployResult<bool> {
    ctx.exists(&ctx.layout.venv_bin("pip"))
}

fn create_venv_with_pyenv(ctx: &StepContext) -> DeployResult<()> {
    let python = ctx.layout.pyenv_python(&ctx.config.python_version);
    ctx.run(format!("mkvirtualenv -p {python} {}", ctx.config.venv_name))?;
    Ok(())
}

/// Make sure an interpreter of the configured version exists and
/// build the virtualenv on it. The system python is used when it
/// already has the right version; otherwise pyenv builds one.
pub fn setup(ctx: &StepContext) -> DeployResult<()> {
    let wanted = &ctx.config.python_version;
    let reported = ctx.run("python3 --version")?;
    let system = parse_python_version(&reported);

    if system == Some(wanted.as_str()) {
        tracing::info!("system python is {wanted}");
        if !venv_exists(ctx)? {
            ctx.run(format!("mkvirtualenv {}", ctx.config.venv_name))?;
        }
        return Ok(());
    }

    tracing::info!(
        "system python is {}, building {wanted} with pyenv",
        system.unwrap_or("unknown")
    );

    let pyenv = &ctx.layout.pyenv;
    if !ctx.exists(pyenv)? {
        ctx.run(format!("git clone {PYENV_REPO} {pyenv}"))?;
    }
    if !ctx.exists(&format!("{pyenv}/versions/{wanted}"))? {
        ctx.run(format!("{pyenv}/bin/pyenv install {wanted}"))?;
    }
    if !venv_exists(ctx)? {
        create_venv_with_pyenv(ctx)?;
    }
    Ok(())
}

/// Reinstall the application's dependencies. Runs on every
/// deployment since requirements change between commits.
pub fn update_dependencies(ctx: &StepContext) -> DeployResult<()> {
    if !venv_exists(ctx)? {
        create_venv_with_pyenv(ctx)?;
    }

    let pip = ctx.layout.venv_bin("pip");
    ctx.run(format!("{pip} install gunicorn"))?;
    ctx.run(format!(
        "{pip} install -r {}/requirements.txt",
        ctx.layout.source
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_version() {
        assert_eq!(parse_python_version("Python 3.6.1"), Some("3.6.1"));
        assert_eq!(parse_python_version("Python 3.12.3\n"), Some("3.12.3"));
    }

    #[test]
    fn parses_version_after_shell_noise() {
        let out = "bash: no job control in this shell\nPython 3.8.10";

        assert_eq!(parse_python_version(out), Some("3.8.10"));
    }

    #[test]
    fn rejects_other_output() {
        assert_eq!(parse_python_version("command not found"), None);
    }
}
