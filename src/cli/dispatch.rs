//! Schema-driven CLI construction and dispatch
//!
//! Lowers every registered command's [`CommandSpec`] onto the argument
//! parser — one option per schema entry, declaration order preserved — and
//! routes parsed input back to the owning command.

use clap::{Arg, ArgAction, ArgMatches};

use crate::app::commands::{ArgKind, ArgSpec, Command, CommandSpec};
use crate::errors::{AppError, Result};

/// Build the complete CLI surface from the registered commands.
pub fn build_cli(commands: &[Box<dyn Command>]) -> clap::Command {
    let mut root = clap::Command::new("azblob_fetcher")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Azure blob storage operations authenticated with a managed identity")
        .subcommand_required(true)
        .arg_required_else_help(true);
    for command in commands {
        root = root.subcommand(lower_command(&command.spec()));
    }
    root
}

fn lower_command(spec: &CommandSpec) -> clap::Command {
    let mut lowered = clap::Command::new(spec.name).about(spec.description);
    for arg in &spec.args {
        lowered = lowered.arg(lower_arg(arg));
    }
    lowered
}

fn lower_arg(spec: &ArgSpec) -> Arg {
    let mut lowered = Arg::new(spec.name)
        .long(spec.name)
        .help(spec.cli_description());
    if let Some(alias) = spec.alias {
        lowered = lowered.short(alias);
    }
    match spec.kind {
        ArgKind::Flag => lowered.action(ArgAction::SetTrue),
        ArgKind::Str => lowered
            .action(ArgAction::Set)
            .value_name("STRING")
            .required(spec.required),
        ArgKind::Url => lowered
            .action(ArgAction::Set)
            .value_name("URL")
            .required(spec.required),
    }
}

/// Route parsed input to the matching command and return its output lines.
pub async fn dispatch(
    commands: &[Box<dyn Command>],
    matches: &ArgMatches,
) -> Result<Vec<String>> {
    let (name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| AppError::generic("no command supplied"))?;
    let command = commands
        .iter()
        .find(|command| command.spec().name == name)
        .ok_or_else(|| AppError::generic(format!("unknown command '{name}'")))?;
    command.run(sub_matches).await
}
