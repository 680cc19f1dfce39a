//! Command line surface of the `stride` binary.

use crate::commands::Persona;
#[cfg(feature = "privileged")]
use crate::commands::RoleArg;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stride - role-gated training assistant
#[derive(Parser, Debug)]
#[command(name = "stride")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// YAML application config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Who a command acts for.
#[derive(clap::Args, Debug, Clone)]
pub struct Caller {
    #[arg(long)]
    pub user: String,

    /// Skip role resolution and use this role
    #[cfg(feature = "privileged")]
    #[arg(long, value_enum)]
    pub as_role: Option<RoleArg>,
}

impl Caller {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            #[cfg(feature = "privileged")]
            as_role: None,
        }
    }

    #[cfg(feature = "privileged")]
    pub fn with_role(mut self, role: RoleArg) -> Self {
        self.as_role = Some(role);
        self
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive chat, one turn per input line
    Chat {
        #[command(flatten)]
        caller: Caller,
        #[arg(long, value_enum, default_value_t = Persona::Athlete)]
        persona: Persona,
    },
    /// Run a single gated tool call and print the envelope
    Dispatch {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        tool: String,
        /// Tool arguments as JSON
        #[arg(long, default_value = "{}")]
        args: String,
        #[arg(long, value_enum, default_value_t = Persona::Athlete)]
        persona: Persona,
    },
    /// Print the tool manifest for a persona
    Manifest {
        #[arg(long, value_enum, default_value_t = Persona::Athlete)]
        persona: Persona,
    },
}
