//! In-memory stand-in for a remote host.
//!
//! `FakeHost` interprets the handful of commands the workflows
//! issue (mkdir, git, cp, ln, systemctl, ufw, crontab, psql, ...)
//! against a simulated filesystem and service registry, and
//! records every command line so tests can assert on the sequence.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use trebuchet::error::{DeployError, DeployResult};
use trebuchet::remote::{Remote, RemoteCommand};
use trebuchet::DeployConfig;

pub const USER: &str = "deploy";
pub const SITE: &str = "blog.example.com";
pub const SOURCE: &str = "/home/deploy/sites/blog.example.com/source";
pub const SETTINGS: &str = "/home/deploy/sites/blog.example.com/source/blog/settings.py";
pub const SECRET_KEY: &str = "/home/deploy/sites/blog.example.com/source/blog/secret_key.py";
pub const VENV_PIP: &str = "/home/deploy/.virtualenvs/blog/bin/pip";

pub const CHECKED_OUT_SETTINGS: &str = "\
import os

DEBUG = True

ALLOWED_HOSTS = []

INSTALLED_APPS = []
";

pub fn config() -> DeployConfig {
    DeployConfig::new("blog", SITE)
        .repo_url("https://github.com/me/blog.git")
        .python_version("3.6.1")
        .venv_name("blog")
        .user_name(USER)
        .password("s3cret")
        .letsencrypt_email("ops@example.com")
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
    heads: BTreeMap<String, String>,
    commands: Vec<String>,
    databases: BTreeSet<String>,
    roles: BTreeSet<String>,
    sql: Vec<String>,
    enabled: BTreeSet<String>,
    restarts: BTreeMap<String, u32>,
    ufw_rules: Vec<String>,
    ufw_active: bool,
    crontab: Vec<String>,
    certificates: Vec<String>,
    superusers: BTreeSet<String>,
    fail_on: Option<String>,
}

pub struct FakeHost {
    python: String,
    state: RefCell<State>,
}

impl FakeHost {
    /// A fresh host whose system python is 3.6.1.
    pub fn new() -> Self {
        Self::with_python("3.6.1")
    }

    pub fn with_python(version: &str) -> Self {
        Self {
            python: version.to_string(),
            state: RefCell::new(State::default()),
        }
    }

    /// Make the first command containing `needle` fail.
    pub fn fail_on(&self, needle: &str) {
        self.state.borrow_mut().fail_on = Some(needle.to_string());
    }

    pub fn put_file(&self, path: &str, content: &str) {
        self.state
            .borrow_mut()
            .files
            .insert(path.to_string(), content.to_string());
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.state.borrow().files.get(path).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state.borrow().dirs.contains(path)
    }

    pub fn head(&self, repo: &str) -> Option<String> {
        self.state.borrow().heads.get(repo).cloned()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }

    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    pub fn databases(&self) -> BTreeSet<String> {
        self.state.borrow().databases.clone()
    }

    pub fn roles(&self) -> BTreeSet<String> {
        self.state.borrow().roles.clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.state.borrow().sql.clone()
    }

    pub fn is_enabled(&self, service: &str) -> bool {
        self.state.borrow().enabled.contains(service)
    }

    pub fn restarts(&self, service: &str) -> u32 {
        self.state
            .borrow()
            .restarts
            .get(service)
            .copied()
            .unwrap_or(0)
    }

    pub fn ufw_rules(&self) -> Vec<String> {
        self.state.borrow().ufw_rules.clone()
    }

    pub fn ufw_active(&self) -> bool {
        self.state.borrow().ufw_active
    }

    pub fn crontab(&self) -> Vec<String> {
        self.state.borrow().crontab.clone()
    }

    pub fn superusers(&self) -> BTreeSet<String> {
        self.state.borrow().superusers.clone()
    }

    pub fn certificates(&self) -> Vec<String> {
        self.state.borrow().certificates.clone()
    }

    /// Commit `sha` of the fake origin: a checkout contains the
    /// checked-out settings module.
    fn checkout(state: &mut State, repo: &str, sha: &str) {
        state.heads.insert(repo.to_string(), sha.to_string());
        state
            .files
            .insert(format!("{repo}/blog/settings.py"), CHECKED_OUT_SETTINGS.to_string());
        state
            .files
            .insert(format!("{repo}/requirements.txt"), "django\n".to_string());
        state.dirs.insert(format!("{repo}/.git"));
    }

    fn interpret(&self, state: &mut State, line: &str) -> DeployResult<String> {
        let words: Vec<&str> = line.split_whitespace().collect();

        if let Some(dir) = line.strip_prefix("mkdir -p ") {
            state.dirs.insert(dir.to_string());
        } else if line == "python3 --version" {
            return Ok(format!("Python {}", self.python));
        } else if let Some(rest) = line.strip_prefix("git clone ") {
            let dest = rest.split_whitespace().last().unwrap_or_default();
            if dest.ends_with(".pyenv") {
                state.dirs.insert(dest.to_string());
            } else {
                Self::checkout(state, dest, "origin-head");
            }
        } else if line.contains("git reset --hard ") {
            let repo = words[1];
            let sha = words.last().copied().unwrap_or_default();
            Self::checkout(state, repo, sha);
        } else if line.contains("/bin/pyenv install ") {
            let pyenv = words[0].trim_end_matches("/bin/pyenv");
            let version = words.last().copied().unwrap_or_default();
            state.dirs.insert(format!("{pyenv}/versions/{version}"));
        } else if line.starts_with("mkvirtualenv") {
            let name = words.last().copied().unwrap_or_default();
            state.files.insert(
                format!("/home/{USER}/.virtualenvs/{name}/bin/pip"),
                String::new(),
            );
        } else if words.first() == Some(&"cp") {
            let content = state
                .files
                .get(words[1])
                .cloned()
                .ok_or_else(|| DeployError::CommandFailed {
                    command: line.to_string(),
                    code: Some(1),
                })?;
            state.files.insert(words[2].to_string(), content);
        } else if words.first() == Some(&"ln") {
            state
                .files
                .insert(words[3].to_string(), format!("-> {}", words[2]));
        } else if let Some(service) = line.strip_prefix("systemctl enable ") {
            state.enabled.insert(service.to_string());
        } else if let Some(service) = line.strip_prefix("systemctl restart ") {
            *state.restarts.entry(service.to_string()).or_default() += 1;
        } else if line == "ufw status" {
            let mut out = format!(
                "Status: {}\n",
                if state.ufw_active { "active" } else { "inactive" }
            );
            for rule in &state.ufw_rules {
                out.push_str(&format!("{rule:<27}ALLOW       Anywhere\n"));
            }
            return Ok(out.trim().to_string());
        } else if let Some(rule) = line.strip_prefix("ufw allow ") {
            state.ufw_rules.push(rule.trim_matches('\'').to_string());
        } else if line == "ufw enable" {
            state.ufw_active = true;
        } else if line.starts_with("crontab -l") {
            return Ok(state.crontab.join("\n"));
        } else if line.ends_with("| crontab -") {
            let start = line.find("echo '").map_or(0, |i| i + 6);
            let end = line.rfind("')").unwrap_or(line.len());
            state.crontab.push(line[start..end].to_string());
        } else if line.starts_with("openssl dhparam") {
            state.files.insert(words[3].to_string(), "DH".to_string());
        } else if line.starts_with("letsencrypt certonly") {
            let domain = words.last().copied().unwrap_or_default();
            state.certificates.push(domain.to_string());
            state.files.insert(
                format!("/etc/letsencrypt/live/{domain}/fullchain.pem"),
                "CERT".to_string(),
            );
        } else if line.starts_with("psql") {
            return Ok(Self::psql(state, line));
        } else if line.contains("manage.py shell -c ") {
            let script = shlex::split(line)
                .and_then(|w| w.last().cloned())
                .unwrap_or_default();
            let exists = state
                .superusers
                .iter()
                .any(|u| script.contains(&format!("username='{u}'")));
            return Ok(if exists { "True" } else { "False" }.to_string());
        } else if let Some(user) = words
            .iter()
            .find_map(|w| w.strip_prefix("--username="))
        {
            if !state.superusers.insert(user.to_string()) {
                return Err(DeployError::CommandFailed {
                    command: line.to_string(),
                    code: Some(1),
                });
            }
        }
        Ok(String::new())
    }

    fn psql(state: &mut State, line: &str) -> String {
        let statement = shlex::split(line)
            .and_then(|w| w.last().cloned())
            .unwrap_or_default();

        if statement.contains("FROM pg_database") {
            let exists = state.databases.iter().any(|d| statement.contains(&format!("'{d}'")));
            return if exists { "1".into() } else { String::new() };
        }
        if statement.contains("FROM pg_roles") {
            let exists = state.roles.iter().any(|r| statement.contains(&format!("'{r}'")));
            return if exists { "1".into() } else { String::new() };
        }

        let words: Vec<&str> = statement.split_whitespace().collect();
        if statement.starts_with("CREATE DATABASE") {
            state
                .databases
                .insert(words[2].trim_end_matches(';').to_string());
        } else if statement.starts_with("CREATE USER") {
            state.roles.insert(words[2].to_string());
        }
        state.sql.push(statement);
        String::new()
    }

    fn path_exists(state: &State, path: &str) -> bool {
        let prefix = format!("{path}/");
        state.files.contains_key(path)
            || state.dirs.contains(path)
            || state.files.keys().any(|f| f.starts_with(&prefix))
            || state.dirs.iter().any(|d| d.starts_with(&prefix))
    }
}

impl Remote for FakeHost {
    fn exec(&self, command: &RemoteCommand) -> DeployResult<String> {
        let mut state = self.state.borrow_mut();
        let rendered = command.render();
        state.commands.push(rendered.clone());

        if let Some(needle) = state.fail_on.clone() {
            if rendered.contains(&needle) {
                return Err(DeployError::CommandFailed {
                    command: command.display(),
                    code: Some(1),
                });
            }
        }

        self.interpret(&mut state, command.line())
    }

    fn exists(&self, path: &str) -> DeployResult<bool> {
        Ok(Self::path_exists(&self.state.borrow(), path))
    }

    fn read_file(&self, path: &str) -> DeployResult<String> {
        self.file(path)
            .ok_or_else(|| DeployError::FileNotFound(path.to_string()))
    }

    fn write_file(&self, content: &str, path: &str) -> DeployResult<()> {
        self.put_file(path, content);
        Ok(())
    }
}
