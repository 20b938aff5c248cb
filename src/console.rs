//! Text console for a declarative-services component runtime.
//!
//! `scr list`, `scr info 3`, `scr enable 3` and friends are parsed here and
//! forwarded to a [`ComponentRuntime`] handle. The runtime itself lives
//! elsewhere; this module only dispatches and prints usage.

use std::io::{self, Write};

use thiserror::Error;

/// Name the console command is registered under.
pub const NAME: &str = "scr";

/// One-line usage.
pub const USAGE: &str = "scr help";

/// One-line description.
pub const DESCRIPTION: &str = "Declarative Services Runtime";

const HELP: &str = "help";
const LIST: &str = "list";
const INFO: &str = "info";
const ENABLE: &str = "enable";
const DISABLE: &str = "disable";
const CONFIG: &str = "config";

/// Error raised by a runtime operation.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The argument did not name a known bundle or component.
    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Operations the console forwards to the component runtime.
pub trait ComponentRuntime {
    /// List components, optionally only those of one bundle.
    fn list(&mut self, bundle: Option<&str>, out: &mut dyn Write) -> Result<(), ConsoleError>;

    /// Dump one component.
    fn info(&mut self, component: Option<&str>, out: &mut dyn Write) -> Result<(), ConsoleError>;

    /// Enable or disable one component.
    fn change(
        &mut self,
        component: Option<&str>,
        out: &mut dyn Write,
        enable: bool,
    ) -> Result<(), ConsoleError>;

    /// Print the runtime configuration.
    fn config(&mut self, out: &mut dyn Write) -> Result<(), ConsoleError>;
}

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand<'a> {
    Help(Option<&'a str>),
    List(Option<&'a str>),
    Info(Option<&'a str>),
    Enable(Option<&'a str>),
    Disable(Option<&'a str>),
    Config,
    Unknown(&'a str),
}

impl<'a> ConsoleCommand<'a> {
    /// Parse `line` (without the leading `scr`). An empty line is `help`.
    pub fn parse(line: &'a str) -> Self {
        let mut tokens = line.split_whitespace();
        let command = tokens.next().unwrap_or(HELP);
        let arg = tokens.next();

        match command {
            HELP => ConsoleCommand::Help(arg),
            LIST => ConsoleCommand::List(arg),
            INFO => ConsoleCommand::Info(arg),
            ENABLE => ConsoleCommand::Enable(arg),
            DISABLE => ConsoleCommand::Disable(arg),
            CONFIG => ConsoleCommand::Config,
            other => ConsoleCommand::Unknown(other),
        }
    }
}

fn detailed_help(out: &mut dyn Write, synopsis: &str, text: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{} {}", NAME, synopsis)?;
    writeln!(out)?;
    writeln!(out, "{}", text)?;
    writeln!(out)
}

/// Print usage for `command`, or the summary when it is absent or unknown.
pub fn help(command: Option<&str>, out: &mut dyn Write) -> io::Result<()> {
    match command.unwrap_or(HELP) {
        LIST => detailed_help(
            out,
            "list [ <bundleId> ]",
            "This command lists registered components. If a bundle ID is\n\
             added, only the components of the selected bundles are listed.",
        ),
        INFO => detailed_help(
            out,
            "info <componentId>",
            "This command dumps information of the component whose\n\
             component ID is given as command argument.",
        ),
        ENABLE => detailed_help(
            out,
            "enable <componentId>",
            "This command enables the component whose component ID\n\
             is given as command argument.",
        ),
        DISABLE => detailed_help(
            out,
            "disable <componentId>",
            "This command disables the component whose component ID\n\
             is given as command argument.",
        ),
        CONFIG => detailed_help(out, "config", "This command lists the current SCR configuration."),
        _ => {
            writeln!(out, "{} {} [{}]", NAME, HELP, LIST)?;
            writeln!(out, "{} {} [ <bundleId> ]", NAME, LIST)?;
            writeln!(out, "{} {} <componentId>", NAME, INFO)?;
            writeln!(out, "{} {} <componentId>", NAME, ENABLE)?;
            writeln!(out, "{} {} <componentId>", NAME, DISABLE)?;
            writeln!(out, "{} {}", NAME, CONFIG)
        }
    }
}

/// Run one console line against `runtime`.
///
/// Invalid arguments and unknown commands are reported on `err`; only
/// failures to write output are returned.
pub fn execute(
    line: &str,
    runtime: &mut dyn ComponentRuntime,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<()> {
    let result = match ConsoleCommand::parse(line) {
        ConsoleCommand::Help(command) => return help(command, out),
        ConsoleCommand::List(bundle) => runtime.list(bundle, out),
        ConsoleCommand::Info(component) => runtime.info(component, out),
        ConsoleCommand::Enable(component) => runtime.change(component, out, true),
        ConsoleCommand::Disable(component) => runtime.change(component, out, false),
        ConsoleCommand::Config => runtime.config(out),
        ConsoleCommand::Unknown(command) => {
            return writeln!(err, "Unknown command: {}", command);
        }
    };

    match result {
        Ok(()) => out.flush(),
        Err(ConsoleError::InvalidArgument(message)) => writeln!(err, "{}", message),
        Err(ConsoleError::Io(e)) => Err(e),
    }
}
