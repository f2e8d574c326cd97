//! Configuration sources.
//!
//! * [`cli_args`] - command-line flags and subcommands (`clap`)
//! * [`environment`] - environment variables, after `.env` is loaded
//!
//! Both layers are merged once into [`crate::app_config::AppConfig`].

pub mod cli_args;
pub use cli_args::*;

pub mod environment;
pub use environment::*;
