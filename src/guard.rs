//! Existence checks and in-place text edits on the remote host.
//!
//! These are the only idempotence mechanism: there is no state
//! file or lock. Running two workflows against the same host at
//! once is not supported.

use regex::{NoExpand, Regex};

use crate::error::{DeployError, DeployResult};
use crate::remote::Remote;

/// Whether `path` exists on the remote host.
pub fn exists(remote: &dyn Remote, path: &str) -> DeployResult<bool> {
    remote.exists(path)
}

/// Replace the first match of `pattern` in the remote file with
/// `replacement` (taken literally). Returns whether a replacement
/// happened; a file without a match is left untouched.
///
/// Patterns run in multi-line mode, so `$` anchors at the end of a
/// line.
pub fn sed_first(
    remote: &dyn Remote,
    path: &str,
    pattern: &str,
    replacement: &str,
) -> DeployResult<bool> {
    let re = Regex::new(&format!("(?m){pattern}"))
        .map_err(|e| DeployError::Other(format!("invalid pattern {pattern:?}: {e}")))?;

    let content = remote.read_file(path)?;
    if !re.is_match(&content) {
        tracing::debug!("{path}: no match for {pattern:?}");
        return Ok(false);
    }

    let updated = re.replacen(&content, 1, NoExpand(replacement));
    remote.write_file(&updated, path)?;
    Ok(true)
}

/// [`sed_first`] for a literal search string.
pub fn replace_literal_first(
    remote: &dyn Remote,
    path: &str,
    needle: &str,
    replacement: &str,
) -> DeployResult<bool> {
    sed_first(remote, path, &regex::escape(needle), replacement)
}

/// Append `line` to the remote file unless a line with exactly
/// that text is already present. Creates the file when missing.
/// Returns whether the line was added.
pub fn append_line(remote: &dyn Remote, path: &str, line: &str) -> DeployResult<bool> {
    let mut content = if remote.exists(path)? {
        remote.read_file(path)?
    } else {
        String::new()
    };

    if content.lines().any(|l| l == line) {
        return Ok(false);
    }

    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(line);
    content.push('\n');

    remote.write_file(&content, path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::remote::RemoteCommand;

    #[derive(Default)]
    struct Files(RefCell<HashMap<String, String>>);

    impl Files {
        fn with(path: &str, content: &str) -> Self {
            let files = Self::default();
            files.0.borrow_mut().insert(path.into(), content.into());
            files
        }

        fn get(&self, path: &str) -> Option<String> {
            self.0.borrow().get(path).cloned()
        }
    }

    impl Remote for Files {
        fn exec(&self, _command: &RemoteCommand) -> DeployResult<String> {
            Ok(String::new())
        }

        fn exists(&self, path: &str) -> DeployResult<bool> {
            Ok(self.0.borrow().contains_key(path))
        }

        fn read_file(&self, path: &str) -> DeployResult<String> {
            self.get(path)
                .ok_or_else(|| DeployError::FileNotFound(path.into()))
        }

        fn write_file(&self, content: &str, path: &str) -> DeployResult<()> {
            self.0.borrow_mut().insert(path.into(), content.into());
            Ok(())
        }
    }

    #[test]
    fn sed_first_replaces_only_first() {
        let files = Files::with("/s.py", "DEBUG = True\nX = 1\nDEBUG = True\n");

        let changed = replace_literal_first(&files, "/s.py", "DEBUG = True", "DEBUG = False")
            .unwrap();

        assert!(changed);
        assert_eq!(
            files.get("/s.py").unwrap(),
            "DEBUG = False\nX = 1\nDEBUG = True\n"
        );
    }

    #[test]
    fn sed_first_dollar_is_end_of_line() {
        let files = Files::with("/s.py", "ALLOWED_HOSTS = []\nDEBUG = True\n");

        sed_first(&files, "/s.py", "ALLOWED_HOSTS =.+$", "ALLOWED_HOSTS = [\"a.com\"]")
            .unwrap();

        assert_eq!(
            files.get("/s.py").unwrap(),
            "ALLOWED_HOSTS = [\"a.com\"]\nDEBUG = True\n"
        );
    }

    #[test]
    fn sed_first_replacement_is_literal() {
        let files = Files::with("/f", "KEY = old\n");

        sed_first(&files, "/f", "old", "$1 and ${x}").unwrap();

        assert_eq!(files.get("/f").unwrap(), "KEY = $1 and ${x}\n");
    }

    #[test]
    fn sed_first_without_match_leaves_file() {
        let files = Files::with("/f", "nothing here\n");

        let changed = replace_literal_first(&files, "/f", "DEBUG = True", "DEBUG = False").unwrap();

        assert!(!changed);
        assert_eq!(files.get("/f").unwrap(), "nothing here\n");
    }

    #[test]
    fn sed_first_rejects_bad_pattern() {
        let files = Files::with("/f", "");

        assert!(sed_first(&files, "/f", "(", "x").is_err());
    }

    #[test]
    fn append_line_is_idempotent() {
        let files = Files::with("/rc", "alias ll='ls -l'");

        assert!(append_line(&files, "/rc", "export A=1").unwrap());
        assert!(!append_line(&files, "/rc", "export A=1").unwrap());

        assert_eq!(files.get("/rc").unwrap(), "alias ll='ls -l'\nexport A=1\n");
    }

    #[test]
    fn append_line_creates_file() {
        let files = Files::default();

        append_line(&files, "/new", "line").unwrap();

        assert_eq!(files.get("/new").unwrap(), "line\n");
        assert!(exists(&files, "/new").unwrap());
    }
}
