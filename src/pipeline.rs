use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::cmd;
use crate::config::{DeployConfig, Target};
use crate::error::{DeployError, DeployResult};
use crate::remote::DryRun;
use crate::ssh::SshSession;
use crate::steps::source;
use crate::workflow::Workflow;

/// Runs the workflows for one configured site.
pub struct Pipeline {
    config: DeployConfig,
    repo_dir: PathBuf,
    ssh_key: Option<String>,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: DeployConfig) -> Self {
        Self {
            config,
            repo_dir: PathBuf::from("."),
            ssh_key: None,
        }
    }

    /// Local repository whose checked-out commit is deployed.
    #[must_use]
    pub fn repo_dir(mut self, dir: &Path) -> Self {
        self.repo_dir = dir.to_path_buf();
        self
    }

    #[must_use]
    pub fn ssh_key(mut self, key_path: Option<&str>) -> Self {
        self.ssh_key = key_path.map(str::to_string);
        self
    }

    /// Run `workflow` against `target`, or print what it would do
    /// when `dry_run` is set.
    pub fn run_workflow(
        &self,
        workflow: Workflow,
        target: &Target,
        dry_run: bool,
    ) -> DeployResult<()> {
        check_prerequisites()?;
        let commit = source::local_commit(&self.repo_dir)?;

        if dry_run {
            return self.dry_run(workflow, target, &commit);
        }

        tracing::info!("{workflow} {target} at commit {commit}");

        let session = self
            .session(target)
            .with_prompts(workflow.prompts(&self.config))
            .with_sudo_password(&self.config.password);
        session.check_connection()?;

        workflow.run(&session, &self.config, &target.user, &commit)?;

        eprintln!();
        eprintln!("{workflow} complete!");
        eprintln!("Site available at: https://{}", self.config.site_name);
        Ok(())
    }

    fn dry_run(&self, workflow: Workflow, target: &Target, commit: &str) -> DeployResult<()> {
        eprintln!("=== Dry run: no changes will be made ===");
        eprintln!();

        let dry = DryRun::new();
        workflow.run(&dry, &self.config, &target.user, commit)?;

        eprintln!("--- Actions that would be performed on {target} ---");
        for (i, action) in dry.actions().iter().enumerate() {
            println!("{:>3}. {action}", i + 1);
        }
        Ok(())
    }

    /// Show the state of the application services.
    pub fn status(&self, target: &Target) -> DeployResult<()> {
        self.session(target)
            .exec_interactive("systemctl status gunicorn nginx --no-pager")
    }

    fn session(&self, target: &Target) -> SshSession {
        let session = SshSession::for_target(target);
        match &self.ssh_key {
            Some(key) => session.with_key(key),
            None => session,
        }
    }
}

fn check_prerequisites() -> DeployResult<()> {
    for program in ["ssh", "git"] {
        if !cmd::command_exists(program) {
            return Err(DeployError::PrerequisiteMissing(format!(
                "{program} is not installed"
            )));
        }
    }
    Ok(())
}

/// Print the ordered steps of a workflow.
pub fn print_plan(workflow: Workflow, json: bool) -> DeployResult<()> {
    let steps = workflow.steps();
    if json {
        println!("{}", serde_json::to_string_pretty(steps)?);
        return Ok(());
    }

    for (i, step) in steps.iter().enumerate() {
        println!("{:>2}. {:<18} {}", i + 1, step.name, step.description);
    }
    Ok(())
}

/// Dispatch a parsed command line. The config file is only read
/// by commands that talk to a host.
pub fn dispatch(cli: &Cli) -> DeployResult<()> {
    let pipeline = || -> DeployResult<Pipeline> {
        let config = DeployConfig::load(&cli.config)?;
        Ok(Pipeline::new(config)
            .repo_dir(&cli.repo)
            .ssh_key(cli.identity.as_deref()))
    };

    match &cli.command {
        Command::Setup { target, dry_run } => {
            pipeline()?.run_workflow(Workflow::Setup, target, *dry_run)
        }
        Command::Deploy { target, dry_run } => {
            pipeline()?.run_workflow(Workflow::Deploy, target, *dry_run)
        }
        Command::Status { target } => pipeline()?.status(target),
        Command::Plan { workflow, json } => print_plan(*workflow, *json),
    }
}

#[derive(Parser)]
#[command(name = "trebuchet")]
#[command(about = "Provision and redeploy a Django site over SSH")]
pub struct Cli {
    /// Deployment configuration file
    #[arg(long, short, global = true, default_value = "deploy.yml")]
    pub config: PathBuf,

    /// Local repository whose checked-out commit is deployed
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// SSH private key
    #[arg(long, short, global = true)]
    pub identity: Option<String>,

    /// Log each remote command
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision a fresh server
    Setup {
        /// Login as user@host
        target: Target,

        /// Print the commands without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Redeploy the locally checked-out commit
    Deploy {
        /// Login as user@host
        target: Target,

        /// Print the commands without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show service status on a remote server
    Status {
        /// Login as user@host
        target: Target,
    },

    /// List the steps of a workflow
    Plan {
        #[arg(value_enum)]
        workflow: Workflow,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}
