pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Args, Caller, Command};
#[cfg(feature = "privileged")]
pub use commands::RoleArg;
pub use commands::{dispatch_once, open_context, Persona};
pub use config::{AppConfig, ModelConfig};
