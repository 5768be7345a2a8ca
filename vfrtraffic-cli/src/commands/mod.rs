//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handler.
//!
//! # Command Modules
//!
//! - [`init`] - Configuration initialization
//! - [`run`] - Traffic simulation
//! - [`route`] - Taxi route lookup
//! - [`check`] - Ground network validation

pub mod check;
pub mod init;
pub mod route;
pub mod run;
