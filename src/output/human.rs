#![forbid(unsafe_code)]

//! Human-readable command table and error output with colorization support

use crate::dispatch::ParserSpec;
use crate::registry::ArgumentSpec;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Human-readable output formatter
///
/// Renders the registered commands for `help` output and reports errors at
/// the process boundary.
pub struct HumanFormatter {
    color_choice: ColorChoice,
}

impl HumanFormatter {
    /// Creates a new HumanFormatter with the specified color choice
    pub fn new(color_choice: ColorChoice) -> Self {
        HumanFormatter { color_choice }
    }

    /// Plain-text command table
    ///
    /// ```text
    /// Commands:
    ///   help                       help help
    ///   prog <DeviceID> <BitFile>  my new command
    /// ```
    pub fn format_commands(&self, spec: &ParserSpec) -> String {
        let mut buffer = termcolor::NoColor::new(Vec::new());
        // Writing into a Vec cannot fail
        let _ = self.write_commands(spec, &mut buffer);
        String::from_utf8_lossy(&buffer.into_inner()).into_owned()
    }

    /// Writes the command table with bold headings and highlighted names
    pub fn write_commands<W: WriteColor>(&self, spec: &ParserSpec, out: &mut W) -> io::Result<()> {
        let options: Vec<(String, Option<&str>)> = spec
            .global_args
            .iter()
            .map(|arg| (option_label(arg), arg.help_text()))
            .collect();
        let commands: Vec<(String, Option<&str>)> = spec
            .subcommands
            .iter()
            .map(|sub| {
                let synopsis = spec.synopsis(&sub.name).unwrap_or_else(|| sub.name.clone());
                (synopsis, sub.help.as_deref())
            })
            .collect();

        let width = options
            .iter()
            .chain(commands.iter())
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);

        if !options.is_empty() {
            write_section(out, "Options:", &options, width)?;
        }
        if !commands.is_empty() {
            if !options.is_empty() {
                writeln!(out)?;
            }
            write_section(out, "Commands:", &commands, width)?;
        }
        if options.is_empty() && commands.is_empty() {
            writeln!(out, "No commands registered")?;
        }
        Ok(())
    }

    /// Writes `error: <message>` to stderr
    pub fn report_error(&self, message: &str) -> io::Result<()> {
        let mut stderr = StandardStream::stderr(self.color_choice);
        self.write_error(&mut stderr, message)
    }

    pub fn write_error<W: WriteColor>(&self, out: &mut W, message: &str) -> io::Result<()> {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(out, "error:")?;
        out.reset()?;
        writeln!(out, " {}", message)
    }
}

fn option_label(arg: &ArgumentSpec) -> String {
    if arg.is_positional() {
        arg.usage_token()
    } else {
        arg.flags().join(", ")
    }
}

fn write_section<W: WriteColor>(
    out: &mut W,
    heading: &str,
    rows: &[(String, Option<&str>)],
    width: usize,
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "{}", heading)?;
    out.reset()?;

    for (label, help) in rows {
        write!(out, "  ")?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(out, "{}", label)?;
        out.reset()?;
        match help {
            Some(help) => {
                let pad = width - label.chars().count() + 2;
                writeln!(out, "{:pad$}{}", "", help, pad = pad)?;
            }
            None => writeln!(out)?,
        }
    }
    Ok(())
}
