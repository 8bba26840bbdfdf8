#![forbid(unsafe_code)]

//! The admin service tool: a small command set registered explicitly
//!
//! ```text
//! argdispatch [-v] [-d]                    default handler
//! argdispatch help
//! argdispatch prog <DeviceID> <BitFile>
//! argdispatch list [--all]
//! ```

use crate::config::ParserConfig;
use crate::registry::{ArgumentSpec, CommandSpec, DefaultSpec, Registry, RegistryError};
use crate::types::ArgBag;
use std::io::Write;

/// State shared by all admin handlers
pub struct AdminService<W> {
    out: W,
    command_table: String,
}

impl<W: Write + 'static> AdminService<W> {
    pub fn new(out: W) -> Self {
        AdminService {
            out,
            command_table: String::new(),
        }
    }

    /// Text printed by the `help` command after its header
    pub fn with_command_table(mut self, table: String) -> Self {
        self.command_table = table;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn handle_default(&mut self, args: &ArgBag) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "DefaultHandler: verbose={}  debug={}",
            args.get_bool("verbose")?,
            args.get_bool("debug")?
        )?;
        Ok(())
    }

    pub fn handle_help(&mut self, _args: &ArgBag) -> anyhow::Result<()> {
        writeln!(self.out, "HandleHelp:")?;
        if !self.command_table.is_empty() {
            write!(self.out, "{}", self.command_table)?;
        }
        Ok(())
    }

    pub fn handle_prog(&mut self, args: &ArgBag) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "HandleProg: DeviceID={}  BitFile={}",
            args.get_str("DeviceID")?,
            args.get_str("Filename")?
        )?;
        Ok(())
    }

    pub fn handle_list(&mut self, args: &ArgBag) -> anyhow::Result<()> {
        writeln!(self.out, "HandleList: all={}", args.get_bool("all")?)?;
        Ok(())
    }
}

/// Root parser metadata of the admin tool
pub fn parser_config() -> ParserConfig {
    ParserConfig {
        program: env!("CARGO_PKG_NAME").to_string(),
        description: Some("This is the Admin Service Tool.".to_string()),
        epilog: Some("Epidingsbums".to_string()),
        add_help: false,
    }
}

/// Registers the global flags, the default handler and every command
pub fn build_registry<W: Write + 'static>() -> Result<Registry<AdminService<W>>, RegistryError> {
    let mut registry = Registry::new();

    registry.register_global(
        ArgumentSpec::switch(["-v", "--verbose"], "verbose").help("print out detailed messages"),
    )?;
    registry.register_global(
        ArgumentSpec::switch(["-d", "--debug"], "debug").help("enable debug mode"),
    )?;

    registry.register_default(DefaultSpec::new(AdminService::<W>::handle_default))?;

    registry.register(
        CommandSpec::new("help", AdminService::<W>::handle_help).help("help help"),
    )?;

    registry.register(
        CommandSpec::new("prog", AdminService::<W>::handle_prog)
            .help("my new command")
            .argument(
                ArgumentSpec::positional("DeviceID")
                    .metavar("<DeviceID>")
                    .help("todo help"),
            )
            .argument(
                ArgumentSpec::positional("Filename")
                    .metavar("<BitFile>")
                    .help("todo help"),
            ),
    )?;

    registry.register(
        CommandSpec::new("list", AdminService::<W>::handle_list)
            .help("my new command")
            .argument(
                ArgumentSpec::switch(["--all"], "all")
                    .help("show all devices, otherwise only available"),
            ),
    )?;

    Ok(registry)
}
