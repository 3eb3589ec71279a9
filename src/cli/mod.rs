//! CLI module for tourney - command-line interface and subcommands.
//!
//! Provides an interactive voting session plus queue maintenance commands.

pub mod commands;

pub use commands::Cli;
