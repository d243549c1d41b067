//! Command handlers, one module per subcommand.

pub mod build;
pub mod info;
pub mod run;
pub mod version;
