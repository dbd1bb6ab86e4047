//! Session and sandbox seed configuration.

use std::collections::BTreeMap;

use serde::Serialize;

/// Path-to-contents map handed to the sandbox mount primitive.
pub type FileTree = BTreeMap<String, String>;

/// Configuration for a [`crate::TerminalSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Shell interpreter inside the sandbox. Commands run as `<shell> -c <cmd>`.
    pub shell: String,
    /// Terminal name shown in the welcome banner.
    pub tty_name: String,
    /// Second welcome line.
    pub prompt_hint: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shell: "jsh".to_string(),
            tty_name: "ttys001".to_string(),
            prompt_hint: "Type a command to start reconnaissance...".to_string(),
        }
    }
}

impl SessionConfig {
    /// Use a different sandbox shell.
    #[must_use]
    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    #[must_use]
    pub fn tty_name(mut self, name: impl Into<String>) -> Self {
        self.tty_name = name.into();
        self
    }

    #[must_use]
    pub fn prompt_hint(mut self, hint: impl Into<String>) -> Self {
        self.prompt_hint = hint.into();
        self
    }

    /// Welcome lines for an empty scrollback. `login_time` is host-formatted.
    #[must_use]
    pub fn welcome_lines(&self, login_time: &str) -> [String; 2] {
        [
            format!("Last login: {login_time} on {}", self.tty_name),
            self.prompt_hint.clone(),
        ]
    }
}

#[derive(Serialize)]
struct PackageDescriptor<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    module_kind: &'a str,
    dependencies: BTreeMap<String, String>,
}

/// Files mounted into a freshly booted sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFiles {
    /// `name` field of the seeded `package.json`.
    pub project_name: String,
    /// Contents of the seeded `README.md`.
    pub readme: String,
}

impl Default for SeedFiles {
    fn default() -> Self {
        Self {
            project_name: "recon-env".to_string(),
            readme: "# Recon Environment\n\nWelcome to your sandboxed terminal.".to_string(),
        }
    }
}

impl SeedFiles {
    #[must_use]
    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    #[must_use]
    pub fn readme(mut self, readme: impl Into<String>) -> Self {
        self.readme = readme.into();
        self
    }

    /// Package descriptor as pretty-printed JSON (two-space indent).
    pub fn package_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&PackageDescriptor {
            name: &self.project_name,
            module_kind: "module",
            dependencies: BTreeMap::new(),
        })
    }

    /// Build the mount tree.
    pub fn to_file_tree(&self) -> Result<FileTree, serde_json::Error> {
        let mut tree = FileTree::new();
        tree.insert("package.json".to_string(), self.package_json()?);
        tree.insert("README.md".to_string(), self.readme.clone());
        Ok(tree)
    }
}
