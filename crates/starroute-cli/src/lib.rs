//! starroute CLI library.
//!
//! Output selection and rendering shared by the `starroute-cli` subcommands.

pub mod output;
