#![forbid(unsafe_code)]

//! Dispatcher over a registry that stays open for late registration
//!
//! Used when one process handles many invocations (an embedded command
//! shell, for instance) and commands may still be added after the first
//! dispatch. The registry sits behind a `RwLock`: registration takes the
//! write lock, parsing and dispatch take the read lock.
//!
//! # Handler Execution
//!
//! The handler `Arc` is cloned out of the registry and the read guard is
//! dropped before the handler runs, so a handler may itself register new
//! commands without deadlocking. Concurrent dispatch is safe as long as each
//! caller passes its own state.

use super::dispatcher::{DispatchError, invoke, parse_with, resolve};
use super::invocation::Invocation;
use super::parser_spec::{ParserSpec, build_parser, check_reserved};
use crate::config::ParserConfig;
use crate::registry::{ArgumentSpec, CommandSpec, DefaultSpec, Registry, RegistryError};
use std::ffi::OsString;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to a lock-protected registry
pub struct SharedDispatcher<S> {
    registry: Arc<RwLock<Registry<S>>>,
    config: ParserConfig,
}

impl<S> SharedDispatcher<S> {
    pub fn new(registry: Registry<S>, config: ParserConfig) -> Self {
        SharedDispatcher {
            registry: Arc::new(RwLock::new(registry)),
            config,
        }
    }

    /// Adds a command, rejecting arguments that clash with the help flag
    pub fn register(&self, command: CommandSpec<S>) -> Result<(), RegistryError> {
        let scope = format!("command '{}'", command.name());
        check_reserved(&self.config, &scope, command.arguments())?;
        self.write()?.register(command)
    }

    pub fn register_default(&self, default: DefaultSpec<S>) -> Result<(), RegistryError> {
        self.write()?.register_default(default)
    }

    pub fn register_global(&self, argument: ArgumentSpec) -> Result<(), RegistryError> {
        check_reserved(&self.config, "global arguments", std::slice::from_ref(&argument))?;
        self.write()?.register_global(argument)
    }

    /// Returns a copy of the command; the handler is shared
    pub fn lookup(&self, name: &str) -> Result<CommandSpec<S>, RegistryError> {
        self.read()?.lookup(name).cloned()
    }

    /// Command names in declaration order
    pub fn command_names(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self
            .read()?
            .all()
            .iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    /// Builds the parser for the registry as it is right now
    pub fn parser(&self) -> Result<ParserSpec, RegistryError> {
        build_parser(&*self.read()?, &self.config)
    }

    pub fn parse<I, T>(&self, args: I) -> Result<Invocation, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let parser = self.parser()?;
        parse_with(&parser, args)
    }

    pub fn dispatch(&self, state: &mut S, invocation: &Invocation) -> Result<(), DispatchError> {
        let (target, handler) = {
            let registry = self.read()?;
            resolve(&registry, invocation.command())?
        };
        invoke(target, &handler, state, &invocation.values)
    }

    pub fn run<I, T>(&self, state: &mut S, args: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let invocation = self.parse(args)?;
        self.dispatch(state, &invocation)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Registry<S>>, RegistryError> {
        self.registry.read().map_err(|_| RegistryError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Registry<S>>, RegistryError> {
        self.registry
            .write()
            .map_err(|_| RegistryError::LockPoisoned)
    }
}

impl<S> Clone for SharedDispatcher<S> {
    fn clone(&self) -> Self {
        SharedDispatcher {
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
        }
    }
}
