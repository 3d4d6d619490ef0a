mod args;
mod deval;

use clap::Parser;
use log::{debug, warn};
use serde_json::Value as JSValue;
use snafu::ErrorCompat;
use std::path::Path;

use crate::args::Args;
use crate::deval::config_reader::DeConfig;
use crate::deval::{resolve_settings, run_validation, DevResult};

// Command line values, as a configuration layered over the file.
fn cli_overrides(args: &Args) -> DeConfig {
    DeConfig {
        input_file: args.input.clone(),
        encoding: args.encoding.clone(),
        header_row_count: args.header_rows,
        participant_id_column: args.id_column.clone().map(JSValue::String),
        first_relevant_column: args.first_column.clone().map(JSValue::String),
        double_entry_id_prefix: args.prefix.clone(),
        output_file: args.out.clone(),
        export_mode: args.mode.clone(),
    }
}

fn run(args: &Args) -> DevResult<()> {
    let settings = resolve_settings(args.config.as_deref(), cli_overrides(args))?;
    debug!("settings: {:?}", settings);
    run_validation(&settings, args.reference.as_deref().map(Path::new))?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if let Err(e) = run(&args) {
        warn!("Error occurred {:?}", e);
        eprintln!("An error occurred: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
