//! Integration test: run guards and file operations on a real
//! host over SSH.
//!
//! Requires `ssh` and key-based access to the host named by
//! `TREBUCHET_TEST_TARGET` (`user@host`). Skipped in normal
//! `cargo test` runs unless the `integration` feature is enabled.

#![cfg(feature = "integration")]

use trebuchet::guard;
use trebuchet::remote::{Remote, RemoteCommand};
use trebuchet::{SshSession, Target};

fn session() -> SshSession {
    let target: Target = std::env::var("TREBUCHET_TEST_TARGET")
        .expect("TREBUCHET_TEST_TARGET not set")
        .parse()
        .expect("TREBUCHET_TEST_TARGET is not user@host");
    SshSession::for_target(&target)
}

#[test]
fn write_append_and_edit_remote_file() {
    let ssh = session();
    ssh.check_connection().expect("ssh connection failed");

    let path = "/tmp/trebuchet-integration.txt";
    ssh.write_file("DEBUG = True\n", path).unwrap();
    assert!(guard::exists(&ssh, path).unwrap());

    assert!(guard::append_line(&ssh, path, "X = 1").unwrap());
    assert!(!guard::append_line(&ssh, path, "X = 1").unwrap());
    guard::replace_literal_first(&ssh, path, "DEBUG = True", "DEBUG = False").unwrap();

    assert_eq!(ssh.read_file(path).unwrap(), "DEBUG = False\nX = 1\n");

    ssh.exec(&RemoteCommand::new(format!("rm {path}"))).unwrap();
    assert!(!guard::exists(&ssh, path).unwrap());
}
