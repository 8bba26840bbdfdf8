#![forbid(unsafe_code)]

//! Routes parsed input to exactly one handler
//!
//! The [`Dispatcher`] owns a registry that is no longer mutated, together
//! with the parser description built from it. Parsing is delegated to clap;
//! dispatch looks the parsed command up and calls its handler with the
//! caller's state and the argument bag.

use super::invocation::Invocation;
use super::parser_spec::{ParserSpec, build_parser};
use crate::config::ParserConfig;
use crate::registry::{Handler, Registry, RegistryError};
use crate::types::ArgBag;
use clap::Command;
use clap::parser::MatchesError;
use std::ffi::OsString;
use thiserror::Error;
use tracing::debug;

/// Errors raised while parsing or dispatching
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Registry lookup failed; the parser and registry are out of sync
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// No sub-command was given and no default handler is registered
    #[error("no command given and no default handler is registered")]
    NoCommand,

    /// Rejected by clap; carries clap's own message and exit code
    #[error(transparent)]
    Parse(#[from] clap::Error),

    /// A declared argument could not be read back from clap's matches
    #[error("could not read argument '{dest}' from parsed input")]
    Extract {
        dest: String,
        #[source]
        source: MatchesError,
    },

    /// The handler itself returned an error
    #[error("{target} failed: {source:#}")]
    Handler {
        target: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Registry plus the parser built from it
pub struct Dispatcher<S> {
    registry: Registry<S>,
    parser: ParserSpec,
}

impl<S> Dispatcher<S> {
    /// Freezes `registry` and builds its parser
    ///
    /// # Errors
    ///
    /// Fails if an argument clashes with the help flag enabled by `config`.
    pub fn new(registry: Registry<S>, config: &ParserConfig) -> Result<Self, RegistryError> {
        let parser = build_parser(&registry, config)?;
        Ok(Dispatcher { registry, parser })
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    pub fn parser(&self) -> &ParserSpec {
        &self.parser
    }

    /// A fresh clap command for this parser
    pub fn command(&self) -> Command {
        self.parser.to_command()
    }

    /// Parses `args`, which must not include the program name
    pub fn parse<I, T>(&self, args: I) -> Result<Invocation, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        parse_with(&self.parser, args)
    }

    /// Invokes the handler selected by `invocation`
    pub fn dispatch(&self, state: &mut S, invocation: &Invocation) -> Result<(), DispatchError> {
        dispatch(&self.registry, state, invocation)
    }

    /// Parses `args` and dispatches the result
    pub fn run<I, T>(&self, state: &mut S, args: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let invocation = self.parse(args)?;
        self.dispatch(state, &invocation)
    }

    /// One-line usage as rendered by clap
    pub fn usage(&self) -> String {
        self.command().render_usage().to_string()
    }

    /// Full help as rendered by clap
    pub fn help(&self) -> String {
        self.command().render_help().to_string()
    }
}

/// Resolves `invocation` against `registry` and calls the handler
pub fn dispatch<S>(
    registry: &Registry<S>,
    state: &mut S,
    invocation: &Invocation,
) -> Result<(), DispatchError> {
    let (target, handler) = resolve(registry, invocation.command())?;
    invoke(target, &handler, state, &invocation.values)
}

pub(crate) fn parse_with<I, T>(parser: &ParserSpec, args: I) -> Result<Invocation, DispatchError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv = std::iter::once(OsString::from(&parser.program))
        .chain(args.into_iter().map(Into::into));
    let matches = parser.to_command().try_get_matches_from(argv)?;
    Invocation::from_matches(parser, &matches)
}

/// Picks the handler for `command`, falling back to the default handler
pub(crate) fn resolve<S>(
    registry: &Registry<S>,
    command: Option<&str>,
) -> Result<(String, Handler<S>), DispatchError> {
    match command {
        Some(name) => {
            let spec = registry.lookup(name)?;
            Ok((format!("command '{name}'"), spec.handler().clone()))
        }
        None => registry
            .default_handler()
            .map(|default| ("default handler".to_string(), default.handler().clone()))
            .ok_or(DispatchError::NoCommand),
    }
}

pub(crate) fn invoke<S>(
    target: String,
    handler: &Handler<S>,
    state: &mut S,
    values: &ArgBag,
) -> Result<(), DispatchError> {
    debug!(handler = %target, arguments = values.len(), "dispatching");
    handler(state, values).map_err(|source| DispatchError::Handler { target, source })
}
