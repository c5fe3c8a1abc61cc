use std::borrow::Cow;
use std::time::Duration;

use crate::cmd;
use crate::config::Target;
use crate::error::{DeployError, DeployResult};
use crate::prompt::Prompts;
use crate::remote::{Remote, RemoteCommand};

/// Shell used for every workflow command. A login, interactive
/// bash sources `~/.bashrc`, which is where virtualenvwrapper
/// defines `mkvirtualenv`.
const LOGIN_SHELL: &str = "bash -l -i -c";

/// SSH session wrapper for executing commands and transferring
/// files to a remote host.
pub struct SshSession {
    host: String,
    user: String,
    key: Option<String>,
    prompts: Prompts,
    sudo_password: Option<String>,
    prompt_idle: Duration,
}

impl SshSession {
    #[must_use]
    pub fn new(host: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            key: None,
            prompts: Prompts::new(),
            sudo_password: None,
            prompt_idle: cmd::PROMPT_IDLE,
        }
    }

    #[must_use]
    pub fn for_target(target: &Target) -> Self {
        Self::new(&target.host, &target.user)
    }

    #[must_use]
    pub fn with_key(mut self, key_path: &str) -> Self {
        self.key = Some(key_path.to_string());
        self
    }

    /// Prompts answered for every command run through
    /// [`Remote::exec`].
    #[must_use]
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Password typed at the sudo prompt of privileged commands.
    #[must_use]
    pub fn with_sudo_password(mut self, password: &str) -> Self {
        self.sudo_password = Some(password.to_string());
        self
    }

    /// How long a command may sit silent on an unanswered prompt
    /// before it is aborted. Defaults to [`cmd::PROMPT_IDLE`].
    #[must_use]
    pub const fn with_prompt_idle(mut self, idle: Duration) -> Self {
        self.prompt_idle = idle;
        self
    }

    /// Execute a command on the remote host interactively.
    pub fn exec_interactive(&self, command: &str) -> DeployResult<()> {
        let mut args = self.ssh_base_args();
        args.push("-t".to_string());
        args.push(self.destination());
        args.push(command.to_string());
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_interactive("ssh", &refs)
    }

    /// Check that the host accepts a non-interactive login.
    pub fn check_connection(&self) -> DeployResult<()> {
        self.capture("echo ok").map(|_| ()).map_err(|e| {
            DeployError::SshFailed(format!("{}: {e}", self.destination()))
        })
    }

    fn prompts_for(&self, command: &RemoteCommand) -> Prompts {
        match (&self.sudo_password, command.is_privileged()) {
            (Some(password), true) => self
                .prompts
                .clone()
                .merge(&Prompts::sudo(&self.user, password)),
            _ => self.prompts.clone(),
        }
    }

    /// Run without a TTY and capture stdout.
    fn capture(&self, command: &str) -> DeployResult<String> {
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run("ssh", &refs)
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.ssh_base_args();
        args.push(self.destination());
        args.push(command.to_string());
        args
    }

    fn ssh_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
        ];
        if let Some(key) = &self.key {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args
    }
}

impl Remote for SshSession {
    fn exec(&self, command: &RemoteCommand) -> DeployResult<String> {
        let label = command.display();
        tracing::debug!(host = %self.host, "$ {label}");

        let wrapped = format!("{LOGIN_SHELL} {}", quote(&command.render())?);
        let mut args = self.ssh_base_args();
        // Force a TTY so sudo and interactive tools print their
        // prompts where they can be answered.
        args.push("-tt".to_string());
        args.push(self.destination());
        args.push(wrapped);

        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_answering(
            "ssh",
            &refs,
            &self.prompts_for(command),
            &label,
            self.prompt_idle,
        )
    }

    fn exists(&self, path: &str) -> DeployResult<bool> {
        let out = self.capture(&format!(
            "test -e {} && echo yes || echo no",
            quote(path)?
        ))?;
        Ok(out == "yes")
    }

    fn read_file(&self, path: &str) -> DeployResult<String> {
        let args = self.build_ssh_args(&format!("cat {}", quote(path)?));
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_raw("ssh", &refs)
    }

    /// Write content to a remote file via stdin pipe.
    fn write_file(&self, content: &str, path: &str) -> DeployResult<()> {
        let command = format!("cat > {}", quote(path)?);
        let args = self.build_ssh_args(&command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_with_stdin("ssh", &refs, content.as_bytes())?;
        Ok(())
    }
}

/// Quote a word for the remote POSIX shell.
pub fn quote(word: &str) -> DeployResult<Cow<'_, str>> {
    shlex::try_quote(word)
        .map_err(|e| DeployError::Other(format!("cannot quote {word:?}: {e}")))
}
