//! Command line of the server binary
//!
//! This module is only available when the "server" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;

pub use main_impl::{main, Cli, CliLogFormat};
