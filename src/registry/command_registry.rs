#![forbid(unsafe_code)]

//! Registry of commands, global arguments and the default handler
//!
//! The registry is filled once during startup and only read afterwards.
//! Duplicate command names are rejected rather than overwritten, so a
//! registration either fully succeeds or leaves the registry unchanged.

use super::spec::{ArgumentSpec, CommandSpec, DefaultSpec};
use crate::types::{Flag, ValueKind};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Errors raised while registering or looking up commands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A command with this name is already registered
    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),

    /// A default handler is already registered
    #[error("a default handler is already registered")]
    DuplicateDefault,

    /// No command with this name exists
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Command names must be non-empty and must not look like flags
    #[error("invalid command name '{0}'")]
    InvalidCommandName(String),

    /// The same destination key appears twice in one scope
    #[error("destination '{dest}' is declared more than once in {scope}")]
    DuplicateArgument { scope: String, dest: String },

    /// The same flag appears twice in one scope
    #[error("flag '{flag}' is declared more than once in {scope}")]
    DuplicateFlag { scope: String, flag: String },

    /// A flag that is neither `-x` nor `--name`
    #[error("invalid flag '{flag}' for '{dest}' in {scope}")]
    InvalidFlag {
        scope: String,
        dest: String,
        flag: String,
    },

    /// Switches need a flag to be toggled by
    #[error("switch '{dest}' in {scope} has no flags")]
    PositionalSwitch { scope: String, dest: String },

    /// A required positional cannot follow an optional one
    #[error("required positional '{dest}' follows an optional positional in {scope}")]
    PositionalOrder { scope: String, dest: String },

    /// A default value of the wrong kind; clap would reject it on every parse
    #[error("default '{value}' for '{dest}' in {scope} is not a valid {kind}")]
    InvalidDefault {
        scope: String,
        dest: String,
        kind: ValueKind,
        value: String,
    },

    /// Switches always have a value, so requiring one is meaningless
    #[error("switch '{dest}' in {scope} cannot be required")]
    RequiredSwitch { scope: String, dest: String },

    /// Clashes with the generated `-h/--help` flag
    #[error("'{name}' in {scope} is reserved for the help flag")]
    ReservedFlag { scope: String, name: String },

    /// Lock poisoned (internal error)
    #[error("Internal registry lock error")]
    LockPoisoned,
}

const GLOBAL_SCOPE: &str = "global arguments";

/// Mapping from command name to [`CommandSpec`]
///
/// Iteration follows declaration order so that parser construction and help
/// output are reproducible.
pub struct Registry<S> {
    commands: Vec<CommandSpec<S>>,
    index: HashMap<String, usize>,
    default: Option<DefaultSpec<S>>,
    globals: Vec<ArgumentSpec>,
}

impl<S> Registry<S> {
    /// Creates an empty registry
    pub fn new() -> Self {
        Registry {
            commands: Vec::new(),
            index: HashMap::new(),
            default: None,
            globals: Vec::new(),
        }
    }

    /// Adds a command
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is already registered
    /// - The name is empty or starts with `-`
    /// - Any of the command's arguments fail validation
    pub fn register(&mut self, command: CommandSpec<S>) -> Result<(), RegistryError> {
        let name = command.name();
        if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidCommandName(name.to_string()));
        }
        if self.index.contains_key(name) {
            return Err(RegistryError::DuplicateCommand(name.to_string()));
        }

        let scope = format!("command '{name}'");
        validate_arguments(&scope, command.arguments())?;
        for arg in command.arguments() {
            if self.globals.iter().any(|g| g.dest() == arg.dest()) {
                return Err(RegistryError::DuplicateArgument {
                    scope,
                    dest: arg.dest().to_string(),
                });
            }
        }

        debug!(
            command = %name,
            arguments = command.arguments().len(),
            "registered command"
        );
        self.index.insert(name.to_string(), self.commands.len());
        self.commands.push(command);
        Ok(())
    }

    /// Sets the handler used when no sub-command is given
    pub fn register_default(&mut self, default: DefaultSpec<S>) -> Result<(), RegistryError> {
        if self.default.is_some() {
            return Err(RegistryError::DuplicateDefault);
        }
        debug!("registered default handler");
        self.default = Some(default);
        Ok(())
    }

    /// Adds an argument to the root parser, shared by every invocation
    pub fn register_global(&mut self, argument: ArgumentSpec) -> Result<(), RegistryError> {
        let mut candidate = self.globals.clone();
        candidate.push(argument);
        validate_arguments(GLOBAL_SCOPE, &candidate)?;

        let Some(argument) = candidate.pop() else {
            return Ok(());
        };
        if let Some(command) = self
            .commands
            .iter()
            .find(|c| c.arguments().iter().any(|a| a.dest() == argument.dest()))
        {
            return Err(RegistryError::DuplicateArgument {
                scope: format!("command '{}'", command.name()),
                dest: argument.dest().to_string(),
            });
        }

        debug!(dest = %argument.dest(), "registered global argument");
        self.globals.push(argument);
        Ok(())
    }

    /// Finds a command by name
    pub fn lookup(&self, name: &str) -> Result<&CommandSpec<S>, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.commands[i])
            .ok_or_else(|| RegistryError::UnknownCommand(name.to_string()))
    }

    /// All commands in declaration order
    pub fn all(&self) -> &[CommandSpec<S>] {
        &self.commands
    }

    pub fn default_handler(&self) -> Option<&DefaultSpec<S>> {
        self.default.as_ref()
    }

    pub fn globals(&self) -> &[ArgumentSpec] {
        &self.globals
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks one scope's argument list for clashes clap would reject at runtime
fn validate_arguments(scope: &str, arguments: &[ArgumentSpec]) -> Result<(), RegistryError> {
    let mut dests = HashSet::new();
    let mut flags = HashSet::new();
    let mut seen_optional_positional = false;

    for arg in arguments {
        if !dests.insert(arg.dest()) {
            return Err(RegistryError::DuplicateArgument {
                scope: scope.to_string(),
                dest: arg.dest().to_string(),
            });
        }

        for flag in arg.flags() {
            if Flag::parse(flag).is_none() {
                return Err(RegistryError::InvalidFlag {
                    scope: scope.to_string(),
                    dest: arg.dest().to_string(),
                    flag: flag.clone(),
                });
            }
            if !flags.insert(flag.as_str()) {
                return Err(RegistryError::DuplicateFlag {
                    scope: scope.to_string(),
                    flag: flag.clone(),
                });
            }
        }

        if let Some(default) = arg.default().filter(|d| !arg.value_kind().accepts(d)) {
            return Err(RegistryError::InvalidDefault {
                scope: scope.to_string(),
                dest: arg.dest().to_string(),
                kind: arg.value_kind(),
                value: default.to_string(),
            });
        }

        if arg.value_kind() == ValueKind::Switch && arg.is_required() {
            return Err(RegistryError::RequiredSwitch {
                scope: scope.to_string(),
                dest: arg.dest().to_string(),
            });
        }

        if arg.is_positional() {
            if arg.value_kind() == ValueKind::Switch {
                return Err(RegistryError::PositionalSwitch {
                    scope: scope.to_string(),
                    dest: arg.dest().to_string(),
                });
            }
            if arg.is_required() && seen_optional_positional {
                return Err(RegistryError::PositionalOrder {
                    scope: scope.to_string(),
                    dest: arg.dest().to_string(),
                });
            }
            seen_optional_positional |= !arg.is_required();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArgBag, Value};

    fn noop(_: &mut (), _: &ArgBag) -> anyhow::Result<()> {
        Ok(())
    }

    fn list_command() -> CommandSpec<()> {
        CommandSpec::new("list", noop)
            .help("my new command")
            .argument(
                ArgumentSpec::switch(["--all"], "all")
                    .help("show all devices, otherwise only available"),
            )
    }

    #[test]
    fn test_lookup_round_trip() {
        let mut registry = Registry::new();
        registry.register(list_command()).unwrap();

        let found = registry.lookup("list").unwrap();
        let expected = list_command();
        assert_eq!(found.name(), expected.name());
        assert_eq!(found.help_text(), expected.help_text());
        assert_eq!(found.arguments(), expected.arguments());
    }

    #[test]
    fn test_duplicate_command_fails_and_keeps_first() {
        let mut registry = Registry::new();
        registry.register(list_command()).unwrap();

        let second = CommandSpec::new("list", noop).help("replacement");
        assert_eq!(
            registry.register(second),
            Err(RegistryError::DuplicateCommand("list".to_string()))
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.lookup("list").unwrap().help_text(),
            Some("my new command")
        );
    }

    #[test]
    fn test_duplicate_default_fails() {
        let mut registry: Registry<()> = Registry::new();
        registry.register_default(DefaultSpec::new(noop)).unwrap();
        assert!(matches!(
            registry.register_default(DefaultSpec::new(noop)),
            Err(RegistryError::DuplicateDefault)
        ));
        assert!(registry.default_handler().is_some());
    }

    #[test]
    fn test_unknown_command() {
        let registry: Registry<()> = Registry::new();
        assert!(matches!(
            registry.lookup("flash"),
            Err(RegistryError::UnknownCommand(name)) if name == "flash"
        ));
    }

    #[test]
    fn test_all_preserves_declaration_order() {
        let mut registry = Registry::new();
        for name in ["help", "prog", "list", "erase"] {
            registry.register(CommandSpec::new(name, noop)).unwrap();
        }
        let names: Vec<&str> = registry.all().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["help", "prog", "list", "erase"]);
    }

    #[test]
    fn test_invalid_command_names() {
        let mut registry = Registry::new();
        for name in ["", "--list", "two words"] {
            assert_eq!(
                registry.register(CommandSpec::new(name, noop)),
                Err(RegistryError::InvalidCommandName(name.to_string()))
            );
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_destination_in_command() {
        let mut registry = Registry::new();
        let cmd = CommandSpec::new("prog", noop)
            .argument(ArgumentSpec::positional("DeviceID"))
            .argument(ArgumentSpec::option(["--device"], "DeviceID", ValueKind::Str));

        assert!(matches!(
            registry.register(cmd),
            Err(RegistryError::DuplicateArgument { dest, .. }) if dest == "DeviceID"
        ));
    }

    #[test]
    fn test_duplicate_flag_in_command() {
        let mut registry = Registry::new();
        let cmd = CommandSpec::new("list", noop)
            .argument(ArgumentSpec::switch(["-a", "--all"], "all"))
            .argument(ArgumentSpec::switch(["-a", "--available"], "available"));

        assert!(matches!(
            registry.register(cmd),
            Err(RegistryError::DuplicateFlag { flag, .. }) if flag == "-a"
        ));
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let mut registry = Registry::new();
        let cmd = CommandSpec::new("list", noop).argument(ArgumentSpec::switch(["all"], "all"));

        assert!(matches!(
            registry.register(cmd),
            Err(RegistryError::InvalidFlag { flag, .. }) if flag == "all"
        ));
    }

    #[test]
    fn test_positional_switch_rejected() {
        let mut registry = Registry::new();
        let empty: [&str; 0] = [];
        let cmd = CommandSpec::new("list", noop).argument(ArgumentSpec::switch(empty, "all"));

        assert!(matches!(
            registry.register(cmd),
            Err(RegistryError::PositionalSwitch { .. })
        ));
    }

    #[test]
    fn test_required_positional_after_optional_rejected() {
        let mut registry = Registry::new();
        let cmd = CommandSpec::new("prog", noop)
            .argument(ArgumentSpec::positional("DeviceID").required(false))
            .argument(ArgumentSpec::positional("Filename"));

        assert!(matches!(
            registry.register(cmd),
            Err(RegistryError::PositionalOrder { dest, .. }) if dest == "Filename"
        ));
    }

    #[test]
    fn test_default_of_wrong_kind_rejected() {
        let mut registry = Registry::new();
        let cases = [
            ArgumentSpec::option(["--count"], "count", ValueKind::Int).default_value("many"),
            ArgumentSpec::option(["--count"], "count", ValueKind::Int).default_value(true),
            ArgumentSpec::switch(["--count"], "count").kind(ValueKind::Int),
        ];
        for arg in cases {
            let cmd = CommandSpec::new("erase", noop).argument(arg);
            assert!(matches!(
                registry.register(cmd),
                Err(RegistryError::InvalidDefault { dest, kind: ValueKind::Int, .. })
                    if dest == "count"
            ));
        }
        assert!(registry.is_empty());

        let ratio =
            ArgumentSpec::option(["--ratio"], "ratio", ValueKind::Float).default_value("half");
        let err = registry.register_global(ratio).unwrap_err();
        assert_eq!(
            err.to_string(),
            "default 'half' for 'ratio' in global arguments is not a valid float"
        );
    }

    #[test]
    fn test_matching_defaults_accepted() {
        let mut registry = Registry::new();
        let cmd = CommandSpec::new("erase", noop)
            .argument(ArgumentSpec::option(["-n"], "sectors", ValueKind::Int).default_value(1i64))
            .argument(
                ArgumentSpec::option(["--voltage"], "voltage", ValueKind::Float)
                    .default_value(3i64),
            )
            .argument(ArgumentSpec::switch(["--keep"], "keep").default_value(true));
        registry.register(cmd).unwrap();
    }

    #[test]
    fn test_required_switch_rejected() {
        let mut registry = Registry::new();
        let cmd = CommandSpec::new("list", noop)
            .argument(ArgumentSpec::switch(["--all"], "all").required(true));

        assert!(matches!(
            registry.register(cmd),
            Err(RegistryError::RequiredSwitch { dest, .. }) if dest == "all"
        ));
    }

    #[test]
    fn test_global_arguments() {
        let mut registry: Registry<()> = Registry::new();
        registry
            .register_global(ArgumentSpec::switch(["-v", "--verbose"], "verbose"))
            .unwrap();
        registry
            .register_global(ArgumentSpec::switch(["-d", "--debug"], "debug"))
            .unwrap();

        let dests: Vec<&str> = registry.globals().iter().map(|a| a.dest()).collect();
        assert_eq!(dests, vec!["verbose", "debug"]);
        assert_eq!(
            registry.globals()[0].default(),
            Some(&Value::Bool(false))
        );

        let clash = registry.register_global(ArgumentSpec::switch(["-V"], "verbose"));
        assert!(matches!(clash, Err(RegistryError::DuplicateArgument { .. })));
        assert_eq!(registry.globals().len(), 2);
    }

    #[test]
    fn test_command_argument_clashing_with_global() {
        let mut registry = Registry::new();
        registry
            .register_global(ArgumentSpec::switch(["-v", "--verbose"], "verbose"))
            .unwrap();

        let cmd = CommandSpec::new("list", noop)
            .argument(ArgumentSpec::switch(["--verbose"], "verbose"));
        assert!(matches!(
            registry.register(cmd),
            Err(RegistryError::DuplicateArgument { dest, .. }) if dest == "verbose"
        ));

        let mut later = Registry::new();
        later.register(list_command()).unwrap();
        assert!(matches!(
            later.register_global(ArgumentSpec::switch(["--all"], "all")),
            Err(RegistryError::DuplicateArgument { scope, .. }) if scope == "command 'list'"
        ));
    }
}
