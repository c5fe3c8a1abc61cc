use std::io::{Read, Write};
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::error::{DeployError, DeployResult};
use crate::prompt::{PromptWatcher, Prompts};

/// How long output must stay silent on a prompt-looking line
/// before the prompt is treated as unanswerable.
pub const PROMPT_IDLE: Duration = Duration::from_secs(30);

/// Run a command and capture its output. Fails if the command
/// returns a non-zero exit code.
pub fn run(program: &str, args: &[&str]) -> DeployResult<String> {
    Ok(run_raw(program, args)?.trim().to_string())
}

/// [`run`] without trimming, for reading file contents verbatim.
pub fn run_raw(program: &str, args: &[&str]) -> DeployResult<String> {
    let output = spawn(program, args)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            eprintln!("{stderr}");
        }
        Err(DeployError::CommandFailed {
            command: format_command(program, args),
            code: output.status.code(),
        })
    }
}

/// Run a command with stdin/stdout/stderr inherited (interactive).
pub fn run_interactive(program: &str, args: &[&str]) -> DeployResult<()> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| spawn_error(program, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(DeployError::CommandFailed {
            command: format_command(program, args),
            code: status.code(),
        })
    }
}

/// Run a command that pipes its stdin from a byte slice.
pub fn run_with_stdin(program: &str, args: &[&str], stdin_data: &[u8]) -> DeployResult<String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    if let Some(stdin) = &mut child.stdin {
        stdin.write_all(stdin_data)?;
    }
    drop(child.stdin.take());

    let output = child.wait_with_output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            eprintln!("{stderr}");
        }
        Err(DeployError::CommandFailed {
            command: format_command(program, args),
            code: output.status.code(),
        })
    }
}

/// Run a command, echoing its output to stderr as it arrives and
/// typing the matching response whenever the output stops on a
/// prompt from `prompts`.
///
/// If output goes silent for `idle` (normally [`PROMPT_IDLE`]) on
/// a line that looks like a question no entry answers, the process
/// is killed and [`DeployError::UnexpectedPrompt`] is returned.
/// `label` is the command as it should appear in errors.
pub fn run_answering(
    program: &str,
    args: &[&str],
    prompts: &Prompts,
    label: &str,
    idle: Duration,
) -> DeployResult<String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| DeployError::Other("child stdin not captured".into()))?;

    let (tx, rx) = mpsc::channel();
    if let Some(stdout) = child.stdout.take() {
        let tx = tx.clone();
        thread::spawn(move || forward(stdout, &tx));
    }
    if let Some(stderr) = child.stderr.take() {
        let tx = tx.clone();
        thread::spawn(move || forward(stderr, &tx));
    }
    drop(tx);

    let mut watcher = PromptWatcher::new(prompts);
    let mut captured = String::new();

    loop {
        match rx.recv_timeout(idle) {
            Ok(chunk) => {
                let text = String::from_utf8_lossy(&chunk).replace('\r', "");
                eprint!("{text}");
                captured.push_str(&text);
                if let Some(response) = watcher.feed(&text) {
                    stdin.write_all(response.as_bytes())?;
                    stdin.flush()?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if let Some(prompt) = watcher.pending_prompt() {
                    let prompt = prompt.to_string();
                    kill(&mut child);
                    return Err(DeployError::UnexpectedPrompt {
                        command: label.to_string(),
                        prompt,
                    });
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    drop(stdin);
    let status = child.wait()?;

    if status.success() {
        Ok(captured.trim().to_string())
    } else {
        Err(DeployError::CommandFailed {
            command: label.to_string(),
            code: status.code(),
        })
    }
}

/// Check if a command exists on PATH.
#[must_use]
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

fn forward(mut reader: impl Read, tx: &Sender<Vec<u8>>) {
    let mut buf = [0_u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
        }
    }
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!("failed to kill stalled command: {e}");
    }
    if let Err(e) = child.wait() {
        tracing::warn!("failed to reap stalled command: {e}");
    }
}

fn spawn(program: &str, args: &[&str]) -> DeployResult<Output> {
    Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| spawn_error(program, e))
}

fn spawn_error(program: &str, e: std::io::Error) -> DeployError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DeployError::CommandNotFound(program.to_string())
    } else {
        DeployError::Io(e)
    }
}

fn format_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    parts.join(" ")
}
