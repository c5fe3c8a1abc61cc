//! Provision and redeploy a Django site on a VPS over SSH.
//!
//! Trebuchet drives a fresh Ubuntu host to a running site
//! (PostgreSQL, gunicorn under systemd, nginx, Let's Encrypt TLS)
//! and redeploys new code to it afterwards. Everything happens
//! through ordinary shell commands over SSH; existence checks on
//! the host make every provisioning step safe to repeat.
//!
//! # Overview
//!
//! - A [`DeployConfig`] names the application, site, repository,
//!   python version and credentials. It is loaded once and passed
//!   explicitly to every step.
//! - A [`Workflow`] is an ordered table of named
//!   [steps](crate::steps). [`Workflow::Setup`] provisions a new host,
//!   [`Workflow::Deploy`] is the subset that ships new code.
//! - Steps talk to the host through the [`Remote`] trait.
//!   [`SshSession`] implements it with the system `ssh` client and
//!   answers interactive prompts from a [`Prompts`] table;
//!   [`DryRun`] only records what would happen.
//!
//! # Deployed commit
//!
//! The host is always reset to the commit checked out in the
//! local repository when the tool runs, not to a branch tip:
//!
//! ```sh
//! git checkout v1.4.2
//! trebuchet deploy deploy@blog.example.com
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use trebuchet::{DeployConfig, DryRun, Workflow};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = DeployConfig::new("blog", "blog.example.com")
//!         .repo_url("https://github.com/me/blog.git")
//!         .python_version("3.6.1")
//!         .user_name("deploy")
//!         .password("hunter2")
//!         .letsencrypt_email("ops@example.com");
//!     config.validate()?;
//!
//!     let dry = DryRun::new();
//!     Workflow::Setup.run(&dry, &config, "deploy", "0123abcd")?;
//!     for action in dry.actions() {
//!         println!("{action}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! Runs are strictly sequential and hold no lock on the host.
//! Do not run two workflows against the same host at once.

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cmd;
pub mod config;
pub mod error;
pub mod guard;
pub mod layout;
pub mod pipeline;
pub mod prompt;
pub mod remote;
pub mod secret;
pub mod ssh;
pub mod steps;
pub mod template;
pub mod workflow;

pub use config::{DeployConfig, Target};
pub use error::{DeployError, DeployResult};
pub use layout::SiteLayout;
pub use pipeline::Pipeline;
pub use prompt::Prompts;
pub use remote::{DryRun, Remote, RemoteCommand};
pub use ssh::SshSession;
pub use workflow::Workflow;
