//! Command pattern interfaces for the CLI

use crate::errors::RasterResult;

/// An executable CLI operation
pub trait Command {
    fn execute(&self) -> RasterResult<()>;
}

/// Creates the [`Command`] selected by parsed CLI arguments
pub trait CommandFactory {
    fn create_command(&self, args: &clap::ArgMatches) -> RasterResult<Box<dyn Command>>;
}
