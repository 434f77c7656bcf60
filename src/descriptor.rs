//! Descriptor data model
//!
//! A descriptor is the unit the launcher loads by name: some metadata, an
//! optional menu and an optional run list. Run lists are ordered sequences of
//! tagged commands, each carrying an explicit failure policy.
//!
//! The host wire form mirrors what the application-management host expects:
//!
//! ```text
//! { "method": "shell.run", "params": { "message": "uv sync" } }
//! { "method": "shell.run", "params": { "message": "..." },
//!   "on": [ { "event": null, "return": true } ] }
//! ```

use crate::error::{LauncherError, Result};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Scheme prefix of the file browser pseudo-action
pub const EXPLORER_SCHEME: &str = "explorer:";

/// What to do when a step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run; remaining steps are not executed
    #[default]
    Abort,
    /// Treat any failure as success and proceed
    Continue,
}

/// One host primitive invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCommand {
    /// `shell.run` with a shell command line
    ShellRun { message: String },
    /// `notify` with HTML text to display
    Notify { html: String },
}

impl StepCommand {
    /// Host method name
    pub fn method(&self) -> &'static str {
        match self {
            Self::ShellRun { .. } => "shell.run",
            Self::Notify { .. } => "notify",
        }
    }

    /// Host params object
    pub fn params(&self) -> Value {
        match self {
            Self::ShellRun { message } => json!({ "message": message }),
            Self::Notify { html } => json!({ "html": html }),
        }
    }
}

/// A single entry of a run list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub command: StepCommand,
    pub on_failure: FailurePolicy,
}

impl Step {
    pub fn shell(message: impl Into<String>) -> Self {
        Self {
            command: StepCommand::ShellRun {
                message: message.into(),
            },
            on_failure: FailurePolicy::Abort,
        }
    }

    pub fn notify(html: impl Into<String>) -> Self {
        Self {
            command: StepCommand::Notify { html: html.into() },
            on_failure: FailurePolicy::Abort,
        }
    }

    /// Mark this step as allowed to fail
    pub fn tolerate_failure(mut self) -> Self {
        self.on_failure = FailurePolicy::Continue;
        self
    }

    pub fn is_tolerant(&self) -> bool {
        self.on_failure == FailurePolicy::Continue
    }

    /// Host wire form of this step
    pub fn to_wire(&self) -> Value {
        let mut step = json!({
            "method": self.command.method(),
            "params": self.command.params(),
        });
        if self.is_tolerant() {
            step["on"] = json!([{ "event": null, "return": true }]);
        }
        step
    }
}

/// Navigation target of a menu item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Href {
    /// Relative descriptor path, e.g. `install.js`
    Descriptor(String),
    /// Open the native file browser at an absolute path
    Explorer(PathBuf),
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descriptor(path) => write!(f, "{}", path),
            Self::Explorer(path) => write!(f, "{}{}", EXPLORER_SCHEME, path.display()),
        }
    }
}

impl FromStr for Href {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix(EXPLORER_SCHEME) {
            if path.is_empty() {
                return Err(LauncherError::href("explorer target path is empty"));
            }
            return Ok(Self::Explorer(PathBuf::from(path)));
        }
        if s.is_empty() {
            return Err(LauncherError::href("href is empty"));
        }
        Ok(Self::Descriptor(s.to_string()))
    }
}

impl Serialize for Href {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A label paired with a navigation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub html: String,
    pub href: Href,
}

impl MenuItem {
    pub fn new(html: impl Into<String>, href: Href) -> Self {
        Self {
            html: html.into(),
            href,
        }
    }

    /// Label with markup removed, for terminal display
    pub fn label(&self) -> String {
        strip_html(&self.html)
    }
}

/// Declarative unit loaded by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// Whether this descriptor's menu is produced by the menu resolver
    pub menu: bool,
    pub run: Option<Vec<Step>>,
}

impl Descriptor {
    /// Descriptor with a run list and no metadata
    pub fn script(name: impl Into<String>, run: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            icon: None,
            menu: false,
            run: Some(run),
        }
    }

    /// Steps to execute, empty when the descriptor has no run list
    pub fn steps(&self) -> &[Step] {
        self.run.as_deref().unwrap_or(&[])
    }

    /// Check the shape invariants of a descriptor
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LauncherError::validation("descriptor name is empty"));
        }
        match &self.run {
            Some(run) if run.is_empty() => Err(LauncherError::validation(format!(
                "{}: run list is present but empty",
                self.name
            ))),
            None if !self.menu => Err(LauncherError::validation(format!(
                "{}: descriptor has neither a menu nor a run list",
                self.name
            ))),
            _ => Ok(()),
        }
    }

    /// Host wire form; the menu is represented by its resolved items when given
    pub fn to_wire(&self, menu_items: Option<&[MenuItem]>) -> Result<Value> {
        let mut out = serde_json::Map::new();
        if let Some(title) = &self.title {
            out.insert("title".into(), json!(title));
        }
        if let Some(description) = &self.description {
            out.insert("description".into(), json!(description));
        }
        if let Some(icon) = &self.icon {
            out.insert("icon".into(), json!(icon));
        }
        if let Some(items) = menu_items {
            out.insert("menu".into(), serde_json::to_value(items)?);
        }
        if let Some(run) = &self.run {
            out.insert(
                "run".into(),
                Value::Array(run.iter().map(Step::to_wire).collect()),
            );
        }
        Ok(Value::Object(out))
    }
}

/// Remove markup tags and collapse whitespace
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
