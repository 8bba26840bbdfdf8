#![forbid(unsafe_code)]

//! Parsed input, independent of clap's match types

use super::dispatcher::DispatchError;
use super::parser_spec::ParserSpec;
use crate::registry::{ArgumentSpec, RegistryError};
use crate::types::{ArgBag, Value, ValueKind};
use clap::ArgMatches;
use clap::parser::MatchesError;

/// The resolved command name (if any) and every parsed destination value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    pub command: Option<String>,
    pub values: ArgBag,
}

impl Invocation {
    pub fn new(command: Option<String>, values: ArgBag) -> Self {
        Invocation { command, values }
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Reads the values declared in `spec` back out of clap's matches
    ///
    /// Global values come from the root matches; the chosen sub-command's
    /// values are merged on top. Arguments that were neither given nor
    /// defaulted are absent from the bag.
    pub fn from_matches(spec: &ParserSpec, matches: &ArgMatches) -> Result<Self, DispatchError> {
        let mut values = ArgBag::new();
        collect(&spec.global_args, matches, &mut values)?;

        let Some((name, sub_matches)) = matches.subcommand() else {
            return Ok(Invocation::new(None, values));
        };

        let sub = spec
            .subcommand(name)
            .ok_or_else(|| RegistryError::UnknownCommand(name.to_string()))?;
        collect(&sub.args, sub_matches, &mut values)?;

        Ok(Invocation::new(Some(name.to_string()), values))
    }
}

fn collect(
    args: &[ArgumentSpec],
    matches: &ArgMatches,
    values: &mut ArgBag,
) -> Result<(), DispatchError> {
    for arg in args {
        if let Some(value) = extract(arg, matches)? {
            values.insert(arg.dest(), value);
        }
    }
    Ok(())
}

fn extract(arg: &ArgumentSpec, matches: &ArgMatches) -> Result<Option<Value>, DispatchError> {
    let id = arg.dest();
    let wrap = |source: MatchesError| DispatchError::Extract {
        dest: id.to_string(),
        source,
    };

    let value = match arg.value_kind() {
        ValueKind::Str => matches
            .try_get_one::<String>(id)
            .map_err(wrap)?
            .cloned()
            .map(Value::Str),
        ValueKind::Int => matches
            .try_get_one::<i64>(id)
            .map_err(wrap)?
            .copied()
            .map(Value::Int),
        ValueKind::Float => matches
            .try_get_one::<f64>(id)
            .map_err(wrap)?
            .copied()
            .map(Value::Float),
        ValueKind::Switch | ValueKind::Bool => matches
            .try_get_one::<bool>(id)
            .map_err(wrap)?
            .copied()
            .map(Value::Bool),
    };
    Ok(value)
}
