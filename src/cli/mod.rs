//! Command-line surface
//!
//! CLI-specific code: lowering command schemas onto the argument parser and
//! dispatching parsed input.

pub mod dispatch;

pub use dispatch::{build_cli, dispatch};
