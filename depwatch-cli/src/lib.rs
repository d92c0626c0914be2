//! depwatch CLI
//!
//! Command-line front end: argument parsing, logging setup, output rendering
//! and exit-code mapping around the scan engine.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
