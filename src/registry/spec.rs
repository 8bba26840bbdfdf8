#![forbid(unsafe_code)]

//! Command and argument descriptors
//!
//! These are the values that replace decorator metadata: each command is
//! described once, at startup, by an explicit [`CommandSpec`] carrying its
//! arguments and handler.

use crate::types::{ArgBag, Value, ValueKind};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Shared handler reference
///
/// `S` is the state the handler operates on. Methods of `S` with the
/// signature `fn(&mut self, &ArgBag) -> anyhow::Result<()>` can be registered
/// directly.
pub type Handler<S> = Arc<dyn Fn(&mut S, &ArgBag) -> anyhow::Result<()> + Send + Sync>;

/// One positional or optional argument
///
/// Built with the consuming builder methods before registration; read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentSpec {
    flags: Vec<String>,
    dest: String,
    kind: ValueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    metavar: Option<String>,
}

impl ArgumentSpec {
    /// A required positional string argument
    pub fn positional(dest: impl Into<String>) -> Self {
        ArgumentSpec {
            flags: Vec::new(),
            dest: dest.into(),
            kind: ValueKind::Str,
            help: None,
            default: None,
            required: true,
            metavar: None,
        }
    }

    /// An optional flagged argument taking a value of `kind`
    pub fn option<I, F>(flags: I, dest: impl Into<String>, kind: ValueKind) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        ArgumentSpec {
            flags: flags.into_iter().map(Into::into).collect(),
            dest: dest.into(),
            kind,
            help: None,
            default: None,
            required: false,
            metavar: None,
        }
    }

    /// A value-less flag, `false` unless given
    pub fn switch<I, F>(flags: I, dest: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        ArgumentSpec {
            default: Some(Value::Bool(false)),
            ..Self::option(flags, dest, ValueKind::Switch)
        }
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    /// Marks the argument as mandatory; switches cannot be required
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the default value; an argument with a default is never required
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.required = false;
        self
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn dest(&self) -> &str {
        &self.dest
    }

    pub fn value_kind(&self) -> ValueKind {
        self.kind
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn metavar_name(&self) -> Option<&str> {
        self.metavar.as_deref()
    }

    pub fn is_positional(&self) -> bool {
        self.flags.is_empty()
    }

    /// Display form used in usage lines: `<DeviceID>`, `[--all]`, `--count <N>`
    pub fn usage_token(&self) -> String {
        let value = self
            .metavar
            .clone()
            .unwrap_or_else(|| format!("<{}>", self.dest));
        let token = match (self.flags.first(), self.kind) {
            (None, _) => value,
            (Some(flag), ValueKind::Switch) => flag.clone(),
            (Some(flag), _) => format!("{flag} {value}"),
        };
        if self.required {
            token
        } else {
            format!("[{token}]")
        }
    }
}

/// One sub-command and its handler
pub struct CommandSpec<S> {
    name: String,
    help: Option<String>,
    arguments: Vec<ArgumentSpec>,
    handler: Handler<S>,
}

impl<S> CommandSpec<S> {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut S, &ArgBag) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        CommandSpec {
            name: name.into(),
            help: None,
            arguments: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Appends an argument; declaration order is preserved
    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    pub fn handler(&self) -> &Handler<S> {
        &self.handler
    }
}

impl<S> Clone for CommandSpec<S> {
    fn clone(&self) -> Self {
        CommandSpec {
            name: self.name.clone(),
            help: self.help.clone(),
            arguments: self.arguments.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<S> fmt::Debug for CommandSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("help", &self.help)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Fallback handler run when no sub-command is given
pub struct DefaultSpec<S> {
    handler: Handler<S>,
}

impl<S> DefaultSpec<S> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut S, &ArgBag) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        DefaultSpec {
            handler: Arc::new(handler),
        }
    }

    pub fn handler(&self) -> &Handler<S> {
        &self.handler
    }
}

impl<S> Clone for DefaultSpec<S> {
    fn clone(&self) -> Self {
        DefaultSpec {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<S> fmt::Debug for DefaultSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultSpec").finish_non_exhaustive()
    }
}
