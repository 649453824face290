//! CLI command implementations
//!
//! Each subcommand is a [`Command`] created by [`ChipkitCommandFactory`].

pub mod chip_command;
pub mod command_traits;
pub mod info_command;
pub mod stats_command;

pub use chip_command::ChipCommand;
pub use command_traits::{Command, CommandFactory};
pub use info_command::InfoCommand;
pub use stats_command::StatsCommand;

use clap::ArgMatches;

use crate::errors::{RasterError, RasterResult};

/// Maps the selected subcommand to its [`Command`]
#[derive(Debug, Default)]
pub struct ChipkitCommandFactory;

impl ChipkitCommandFactory {
    pub fn new() -> Self {
        ChipkitCommandFactory
    }
}

impl CommandFactory for ChipkitCommandFactory {
    fn create_command(&self, args: &ArgMatches) -> RasterResult<Box<dyn Command>> {
        match args.subcommand() {
            Some(("info", sub)) => Ok(Box::new(InfoCommand::new(sub)?)),
            Some(("stats", sub)) => Ok(Box::new(StatsCommand::new(sub)?)),
            Some(("chip", sub)) => Ok(Box::new(ChipCommand::new(sub)?)),
            Some((other, _)) => Err(RasterError::InvalidConfig(format!("unknown command {}", other))),
            None => Err(RasterError::InvalidConfig("no command given".to_string())),
        }
    }
}
