#![forbid(unsafe_code)]

//! Library-independent parser description and its conversion to clap
//!
//! [`build_parser`] walks the registry in declaration order and produces a
//! [`ParserSpec`]. It is plain data (and serializable) so it can be
//! inspected and compared in tests; [`ParserSpec::to_command`] performs the
//! actual argument-registration calls against clap.

use crate::config::ParserConfig;
use crate::registry::{ArgumentSpec, Registry, RegistryError};
use crate::types::{Flag, Value, ValueKind};
use clap::{Arg, ArgAction, Command, value_parser};
use serde::Serialize;
use tracing::debug;

/// Root parser description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParserSpec {
    pub program: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epilog: Option<String>,
    pub add_help: bool,
    pub global_args: Vec<ArgumentSpec>,
    pub subcommands: Vec<SubParserSpec>,
    /// Whether a default handler runs when no sub-command is given
    pub has_fallback: bool,
}

/// One sub-parser entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubParserSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub args: Vec<ArgumentSpec>,
}

/// Builds the parser description for `registry`
///
/// # Errors
///
/// Returns [`RegistryError::ReservedFlag`] if `config.add_help` is set and an
/// argument uses `-h`, `--help` or the destination `help`, which clap claims
/// for its generated help flag.
pub fn build_parser<S>(
    registry: &Registry<S>,
    config: &ParserConfig,
) -> Result<ParserSpec, RegistryError> {
    check_reserved(config, "global arguments", registry.globals())?;
    for command in registry.all() {
        check_reserved(
            config,
            &format!("command '{}'", command.name()),
            command.arguments(),
        )?;
    }

    let subcommands: Vec<SubParserSpec> = registry
        .all()
        .iter()
        .map(|command| SubParserSpec {
            name: command.name().to_string(),
            help: command.help_text().map(str::to_string),
            args: command.arguments().to_vec(),
        })
        .collect();

    debug!(
        program = %config.program,
        subcommands = subcommands.len(),
        globals = registry.globals().len(),
        "built parser spec"
    );

    Ok(ParserSpec {
        program: config.program.clone(),
        description: config.description.clone(),
        epilog: config.epilog.clone(),
        add_help: config.add_help,
        global_args: registry.globals().to_vec(),
        subcommands,
        has_fallback: registry.default_handler().is_some(),
    })
}

/// Rejects arguments that collide with clap's generated help flag
pub(crate) fn check_reserved(
    config: &ParserConfig,
    scope: &str,
    arguments: &[ArgumentSpec],
) -> Result<(), RegistryError> {
    if !config.add_help {
        return Ok(());
    }
    for arg in arguments {
        let reserved = if arg.dest() == "help" {
            Some(arg.dest())
        } else {
            arg.flags()
                .iter()
                .map(String::as_str)
                .find(|flag| matches!(*flag, "-h" | "--help"))
        };
        if let Some(name) = reserved {
            return Err(RegistryError::ReservedFlag {
                scope: scope.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

impl ParserSpec {
    pub fn subcommand(&self, name: &str) -> Option<&SubParserSpec> {
        self.subcommands.iter().find(|s| s.name == name)
    }

    /// Usage synopsis for one sub-command, e.g. `prog <DeviceID> <BitFile>`
    pub fn synopsis(&self, name: &str) -> Option<String> {
        let sub = self.subcommand(name)?;
        let mut line = sub.name.clone();
        for arg in &sub.args {
            line.push(' ');
            line.push_str(&arg.usage_token());
        }
        Some(line)
    }

    /// Creates the clap command tree
    ///
    /// clap's generated `help` sub-command is disabled so a registered `help`
    /// command can own that name.
    pub fn to_command(&self) -> Command {
        let mut root = Command::new(self.program.clone())
            .disable_help_subcommand(true)
            .disable_help_flag(!self.add_help)
            .subcommand_required(false);

        if let Some(description) = &self.description {
            root = root.about(description.clone());
        }
        if let Some(epilog) = &self.epilog {
            root = root.after_help(epilog.clone());
        }

        for arg in &self.global_args {
            root = root.arg(to_arg(arg));
        }

        for sub in &self.subcommands {
            let mut command = Command::new(sub.name.clone()).disable_help_flag(!self.add_help);
            if let Some(help) = &sub.help {
                command = command.about(help.clone());
            }
            for arg in &sub.args {
                command = command.arg(to_arg(arg));
            }
            root = root.subcommand(command);
        }

        root
    }
}

/// Registers one argument with clap, keyed by its destination
fn to_arg(spec: &ArgumentSpec) -> Arg {
    let mut arg = Arg::new(spec.dest().to_string());

    let mut shorts = Vec::new();
    let mut longs = Vec::new();
    for flag in spec.flags() {
        match Flag::parse(flag) {
            Some(Flag::Short(c)) => shorts.push(c),
            Some(Flag::Long(name)) => longs.push(name.to_string()),
            None => {}
        }
    }
    if let Some((first, rest)) = shorts.split_first() {
        arg = arg.short(*first).visible_short_aliases(rest.to_vec());
    }
    if let Some((first, rest)) = longs.split_first() {
        arg = arg.long(first.clone()).visible_aliases(rest.to_vec());
    }

    if let Some(help) = spec.help_text() {
        arg = arg.help(help.to_string());
    }
    // clap adds its own angle brackets
    if let Some(metavar) = spec.metavar_name() {
        let bare = metavar.trim_start_matches('<').trim_end_matches('>');
        arg = arg.value_name(bare.to_string());
    }

    match spec.value_kind() {
        ValueKind::Switch => {
            let action = if spec.default() == Some(&Value::Bool(true)) {
                ArgAction::SetFalse
            } else {
                ArgAction::SetTrue
            };
            return arg.action(action);
        }
        ValueKind::Str => arg = arg.action(ArgAction::Set).value_parser(value_parser!(String)),
        ValueKind::Int => arg = arg.action(ArgAction::Set).value_parser(value_parser!(i64)),
        ValueKind::Float => arg = arg.action(ArgAction::Set).value_parser(value_parser!(f64)),
        ValueKind::Bool => arg = arg.action(ArgAction::Set).value_parser(value_parser!(bool)),
    }

    if let Some(default) = spec.default() {
        arg = arg.default_value(default.to_string());
    }
    arg.required(spec.is_required())
}
