use crate::config::DeployConfig;

/// Table of interactive prompts and the text typed back when a
/// remote command prints one of them.
///
/// Matching is on the tail of the current output line, so a
/// prompt is answered as soon as it is printed even though no
/// newline follows it.
///
/// # Example
///
/// ```
/// use trebuchet::prompt::Prompts;
///
/// let prompts = Prompts::new()
///     .answer("Do you want to continue? [Y/n] ", "y");
///
/// assert_eq!(
///     prompts.response_for("Need 3 MB. Do you want to continue? [Y/n] "),
///     Some("y\n"),
/// );
/// assert_eq!(prompts.response_for("Reading package lists..."), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompts {
    entries: Vec<(String, String)>,
}

impl Prompts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response. A trailing newline is added when the
    /// response does not already end with one. Registering the
    /// same prompt twice replaces the earlier response.
    #[must_use]
    pub fn answer(mut self, prompt: &str, response: &str) -> Self {
        let mut response = response.to_string();
        if !response.ends_with('\n') {
            response.push('\n');
        }
        self.entries.retain(|(p, _)| p != prompt);
        self.entries.push((prompt.to_string(), response));
        self
    }

    /// Merge another table into this one; entries from `other`
    /// win on conflict.
    #[must_use]
    pub fn merge(self, other: &Self) -> Self {
        other
            .entries
            .iter()
            .fold(self, |acc, (p, r)| acc.answer(p, r))
    }

    /// Response for the longest registered prompt that `line`
    /// ends with.
    #[must_use]
    pub fn response_for(&self, line: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(prompt, _)| line.ends_with(prompt.as_str()))
            .max_by_key(|(prompt, _)| prompt.len())
            .map(|(_, response)| response.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The sudo password prompt for `user`.
    #[must_use]
    pub fn sudo(user: &str, password: &str) -> Self {
        Self::new().answer(&format!("[sudo] password for {user}: "), password)
    }

    /// Prompts raised while provisioning a fresh host: package
    /// manager and firewall confirmations, first-contact host key
    /// confirmation, and the superuser password pair.
    #[must_use]
    pub fn for_setup(config: &DeployConfig) -> Self {
        Self::new()
            .answer(
                "Command may disrupt existing ssh connections. \
                 Proceed with operation (y|n)? ",
                "y",
            )
            .answer("Do you want to continue? [Y/n] ", "y")
            .answer(
                "Are you sure you want to continue connecting (yes/no)? ",
                "yes",
            )
            .answer("Password: ", &config.password)
            .answer("Password (again): ", &config.password)
    }

    /// Prompts raised while redeploying: git credentials for an
    /// HTTPS remote.
    #[must_use]
    pub fn for_deploy(config: &DeployConfig) -> Self {
        Self::new()
            .answer("Username for 'https://github.com': ", &config.user_name)
            .answer(
                &format!(
                    "Password for 'https://{}@github.com': ",
                    config.user_name
                ),
                &config.password,
            )
    }
}

/// Tracks the partial output line of a running command and
/// decides when to answer a prompt.
#[derive(Debug)]
pub struct PromptWatcher<'a> {
    prompts: &'a Prompts,
    line: String,
}

impl<'a> PromptWatcher<'a> {
    #[must_use]
    pub const fn new(prompts: &'a Prompts) -> Self {
        Self {
            prompts,
            line: String::new(),
        }
    }

    /// Feed a chunk of output. Returns the response to send when
    /// the current line now ends with a known prompt.
    pub fn feed(&mut self, chunk: &str) -> Option<String> {
        match chunk.rfind('\n') {
            Some(idx) => {
                self.line.clear();
                self.line.push_str(&chunk[idx + 1..]);
            }
            None => self.line.push_str(chunk),
        }

        let response = self.prompts.response_for(&self.line)?.to_string();
        self.line.clear();
        Some(response)
    }

    /// The current partial line, if it looks like a question
    /// waiting for input. Only meaningful once output has gone
    /// idle.
    #[must_use]
    pub fn pending_prompt(&self) -> Option<&str> {
        let trimmed = self.line.trim_end();
        if trimmed.is_empty() {
            return None;
        }
        trimmed
            .ends_with([':', '?', ']', ')'])
            .then_some(trimmed)
    }
}
