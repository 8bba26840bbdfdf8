//! Declarative command registry

pub mod command_registry;
pub mod spec;

pub use command_registry::{Registry, RegistryError};
pub use spec::{ArgumentSpec, CommandSpec, DefaultSpec, Handler};
