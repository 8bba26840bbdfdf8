//! Parser configuration and TOML overlays

pub mod parser_toml;

pub use parser_toml::{CONFIG_ENV_VAR, ConfigError, ParserConfig};
