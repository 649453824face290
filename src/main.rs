use clap::{value_parser, Arg, ArgAction, Command as ClapCommand};
use log::error;
use std::path::PathBuf;
use std::process;

use chipkit::commands::{ChipkitCommandFactory, CommandFactory};
use chipkit::utils::logger::Logger;

fn pipeline_arg() -> Arg {
    Arg::new("pipeline")
        .help("Pipeline configuration (TOML)")
        .required(true)
        .index(1)
}

fn cli() -> ClapCommand {
    ClapCommand::new("chipkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Read chips from geospatial rasters and compute normalization statistics")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Also write log records to this file")
                .value_name("FILE")
                .global(true),
        )
        .subcommand(
            ClapCommand::new("info")
                .about("Describe every source of a pipeline")
                .arg(pipeline_arg()),
        )
        .subcommand(
            ClapCommand::new("stats")
                .about("Compute per-channel statistics over all sources")
                .arg(pipeline_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Statistics file, overrides the pipeline's output_uri")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::new("sample-prob")
                        .long("sample-prob")
                        .help("Sample random chips covering this fraction of each source")
                        .value_name("P")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .help("Hide the progress bar")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            ClapCommand::new("chip")
                .about("Export one chip as .npy or GeoTIFF")
                .arg(pipeline_arg())
                .arg(
                    Arg::new("window")
                        .short('w')
                        .long("window")
                        .help("Window as row_min,col_min,row_max,col_max")
                        .value_name("WINDOW")
                        .allow_hyphen_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new("source")
                        .short('s')
                        .long("source")
                        .help("Index of the source in the pipeline")
                        .value_name("N")
                        .value_parser(value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    Arg::new("raw")
                        .long("raw")
                        .help("Export all raw channels without transformers")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output file (.npy or .tif)")
                        .value_name("FILE")
                        .required(true),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();

    let log_file = matches.get_one::<String>("log-file").map(PathBuf::from);
    if let Err(e) = Logger::init(log_file.as_deref(), matches.get_flag("verbose")) {
        eprintln!("Error initializing logger: {}", e);
        process::exit(1);
    }

    let factory = ChipkitCommandFactory::new();
    let result = factory
        .create_command(&matches)
        .and_then(|command| command.execute());
    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
