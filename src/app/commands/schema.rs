//! Declarative argument schema for sub-commands
//!
//! Each command describes its arguments as data; the CLI layer lowers the
//! description onto the argument parser generically. Schema invariants are
//! programmer errors and fail fast at registration time.

use clap::ArgMatches;

use crate::errors::{AppError, Result};

/// Shared argument names
pub const IDENTITY: &str = "identity";
pub const VERBOSE: &str = "verbose";

/// Value shape of an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Free-form string value
    Str,
    /// Boolean switch; absent means false
    Flag,
    /// String value expected to be a URL
    Url,
}

/// One argument of a sub-command
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name: &'static str,
    pub alias: Option<char>,
    pub description: &'static str,
    pub kind: ArgKind,
    pub required: bool,
}

impl ArgSpec {
    /// A mandatory argument. Flags cannot be required: a flag's absence
    /// already means false, so "required" would be meaningless.
    pub fn required(
        name: &'static str,
        alias: Option<char>,
        description: &'static str,
        kind: ArgKind,
    ) -> Self {
        if kind == ArgKind::Flag {
            panic!("argument '{name}' cannot be a required flag");
        }
        Self {
            name,
            alias,
            description,
            kind,
            required: true,
        }
    }

    pub fn optional(
        name: &'static str,
        alias: Option<char>,
        description: &'static str,
        kind: ArgKind,
    ) -> Self {
        Self {
            name,
            alias,
            description,
            kind,
            required: false,
        }
    }

    pub fn flag(name: &'static str, alias: Option<char>, description: &'static str) -> Self {
        Self {
            name,
            alias,
            description,
            kind: ArgKind::Flag,
            required: false,
        }
    }

    /// Help text with the requiredness prefix.
    pub fn cli_description(&self) -> String {
        let prefix = if self.required {
            "Required. "
        } else {
            "Optional. "
        };
        format!("{prefix}{}", self.description)
    }
}

/// Full description of one sub-command
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub args: Vec<ArgSpec>,
}

impl CommandSpec {
    /// Validates name and alias uniqueness; argument order is preserved as
    /// declared.
    pub fn new(name: &'static str, description: &'static str, args: Vec<ArgSpec>) -> Self {
        for (index, arg) in args.iter().enumerate() {
            for earlier in &args[..index] {
                if earlier.name == arg.name {
                    panic!("duplicate argument name '{}' in command '{name}'", arg.name);
                }
                if let (Some(a), Some(b)) = (earlier.alias, arg.alias) {
                    if a == b {
                        panic!("duplicate argument alias '-{a}' in command '{name}'");
                    }
                }
            }
        }
        Self {
            name,
            description,
            args,
        }
    }
}

/// Managed identity argument shared by every command
pub fn identity_arg() -> ArgSpec {
    ArgSpec::optional(
        IDENTITY,
        Some('i'),
        "Client ID of the managed identity used for authentication.",
        ArgKind::Str,
    )
}

/// Verbose flag shared by every command
pub fn verbose_arg() -> ArgSpec {
    ArgSpec::flag(VERBOSE, Some('v'), "Enable verbose logging.")
}

/// Optional string value from parsed input.
pub fn string_value(matches: &ArgMatches, name: &str) -> Option<String> {
    matches.get_one::<String>(name).cloned()
}

/// Mandatory string value from parsed input. The parser enforces presence;
/// this guards the binding itself with a typed error instead of a panic.
pub fn required_value(matches: &ArgMatches, name: &str) -> Result<String> {
    string_value(matches, name)
        .ok_or_else(|| AppError::generic(format!("missing required argument --{name}")))
}

/// Flag state from parsed input.
pub fn flag_value(matches: &ArgMatches, name: &str) -> bool {
    matches.get_flag(name)
}
