//! Parser construction and handler dispatch

pub mod dispatcher;
pub mod invocation;
pub mod parser_spec;
pub mod shared;

pub use dispatcher::{DispatchError, Dispatcher, dispatch};
pub use invocation::Invocation;
pub use parser_spec::{ParserSpec, SubParserSpec, build_parser};
pub use shared::SharedDispatcher;
