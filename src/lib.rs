#![forbid(unsafe_code)]

//! argdispatch: declarative command registration and dispatch
//!
//! Handlers are registered together with their command name, help text and
//! argument specifications. The registry is turned into a `clap` parser at
//! startup and parsed input is routed to exactly one handler.

pub mod admin;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod output;
pub mod registry;
pub mod types;
