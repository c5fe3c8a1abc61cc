use std::cell::RefCell;

use crate::error::DeployResult;

/// Privilege escalation for a remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privilege {
    /// Run as the login user.
    User,
    /// `sudo <command>`
    Root,
    /// `sudo -u <user> <command>`
    As(String),
}

/// A single command line to run on the remote host.
///
/// # Example
///
/// ```
/// use trebuchet::remote::RemoteCommand;
///
/// let cmd = RemoteCommand::new("psql -c 'SELECT 1;'").sudo_as("postgres");
/// assert_eq!(cmd.render(), "sudo -u postgres psql -c 'SELECT 1;'");
///
/// let cmd = RemoteCommand::new("echo hunter2").redact("hunter2");
/// assert_eq!(cmd.display(), "echo ****");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    line: String,
    privilege: Privilege,
    redact: Vec<String>,
}

impl RemoteCommand {
    #[must_use]
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            privilege: Privilege::User,
            redact: Vec::new(),
        }
    }

    #[must_use]
    pub fn sudo(mut self) -> Self {
        self.privilege = Privilege::Root;
        self
    }

    #[must_use]
    pub fn sudo_as(mut self, user: &str) -> Self {
        self.privilege = Privilege::As(user.to_string());
        self
    }

    /// Hide `secret` wherever the command is logged or reported.
    #[must_use]
    pub fn redact(mut self, secret: &str) -> Self {
        if !secret.is_empty() {
            self.redact.push(secret.to_string());
        }
        self
    }

    /// The command line without privilege escalation.
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }

    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        !matches!(self.privilege, Privilege::User)
    }

    /// The full command line as sent to the shell.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.privilege {
            Privilege::User => self.line.clone(),
            Privilege::Root => format!("sudo {}", self.line),
            Privilege::As(user) => format!("sudo -u {user} {}", self.line),
        }
    }

    /// The rendered command with secrets masked.
    #[must_use]
    pub fn display(&self) -> String {
        self.redact
            .iter()
            .fold(self.render(), |acc, secret| acc.replace(secret.as_str(), "****"))
    }
}

/// Operations the workflows need from a target host.
///
/// Every method blocks until the remote side finishes. A failing
/// command is an error; callers propagate it and stop.
pub trait Remote {
    /// Run a command and return its captured output, trimmed.
    fn exec(&self, command: &RemoteCommand) -> DeployResult<String>;

    /// Whether a file or directory exists.
    fn exists(&self, path: &str) -> DeployResult<bool>;

    /// Read a text file.
    fn read_file(&self, path: &str) -> DeployResult<String>;

    /// Create or overwrite a file owned by the login user.
    fn write_file(&self, content: &str, path: &str) -> DeployResult<()>;
}

/// A [`Remote`] that changes nothing: it logs every action and
/// reports every path as absent, so the printed plan is the one a
/// fresh host would receive.
#[derive(Debug, Default)]
pub struct DryRun {
    actions: RefCell<Vec<String>>,
}

impl DryRun {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything that would have been done, in order.
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.actions.borrow().clone()
    }

    fn record(&self, action: String) {
        tracing::info!("(dry run) {action}");
        self.actions.borrow_mut().push(action);
    }
}

impl Remote for DryRun {
    fn exec(&self, command: &RemoteCommand) -> DeployResult<String> {
        self.record(format!("run: {}", command.display()));
        Ok(String::new())
    }

    fn exists(&self, _path: &str) -> DeployResult<bool> {
        Ok(false)
    }

    fn read_file(&self, _path: &str) -> DeployResult<String> {
        Ok(String::new())
    }

    fn write_file(&self, content: &str, path: &str) -> DeployResult<()> {
        self.record(format!("write: {path} ({} bytes)", content.len()));
        Ok(())
    }
}
