#![forbid(unsafe_code)]

use argdispatch::admin::{self, AdminService};
use argdispatch::dispatch::{DispatchError, Dispatcher};
use argdispatch::logging;
use argdispatch::output::HumanFormatter;
use std::io::{self, Stdout};
use std::process::ExitCode;
use termcolor::ColorChoice;

/// Exit codes
const EXIT_ERROR: u8 = 1;
const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    let formatter = HumanFormatter::new(ColorChoice::Auto);
    // With RUST_LOG set, registration and parser construction are logged too
    let logging_ready = logging::init_from_env().unwrap_or_else(|e| {
        eprintln!("{e}");
        false
    });

    let config = match admin::parser_config().overlay_env() {
        Ok(config) => config,
        Err(e) => return fail(&formatter, &e.to_string()),
    };

    let registry = match admin::build_registry::<Stdout>() {
        Ok(registry) => registry,
        Err(e) => return fail(&formatter, &format!("invalid command registry: {e}")),
    };
    let dispatcher = match Dispatcher::new(registry, &config) {
        Ok(dispatcher) => dispatcher,
        Err(e) => return fail(&formatter, &format!("invalid command registry: {e}")),
    };

    let invocation = match dispatcher.parse(std::env::args_os().skip(1)) {
        Ok(invocation) => invocation,
        Err(DispatchError::Parse(e)) => e.exit(),
        Err(e) => return fail(&formatter, &e.to_string()),
    };

    let verbose = invocation.values.get_bool("verbose").unwrap_or(false);
    let debug = invocation.values.get_bool("debug").unwrap_or(false);
    if !logging_ready {
        if let Err(e) = logging::init_logging(logging::default_directive(verbose, debug)) {
            eprintln!("{e}");
        }
    }
    tracing::info!(command = ?invocation.command(), "parsed command line");

    let table = formatter.format_commands(dispatcher.parser());
    let mut service = AdminService::new(io::stdout()).with_command_table(table);

    match dispatcher.dispatch(&mut service, &invocation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(DispatchError::NoCommand) => {
            eprint!("{}", dispatcher.usage());
            eprintln!();
            eprint!("{}", formatter.format_commands(dispatcher.parser()));
            ExitCode::from(EXIT_USAGE)
        }
        Err(e) => fail(&formatter, &e.to_string()),
    }
}

fn fail(formatter: &HumanFormatter, message: &str) -> ExitCode {
    tracing::error!("{message}");
    if formatter.report_error(message).is_err() {
        eprintln!("error: {message}");
    }
    ExitCode::from(EXIT_ERROR)
}
