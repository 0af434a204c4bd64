//! monover CLI entry point.

// CLI binary needs to output to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use monover::cli::{Cli, EXIT_FAILURE, EXIT_OK, exit_code_for};
use monover::commands;
use monover::tracing::{TracingConfig, init_tracing};

fn main() {
    let cli = Cli::parse();

    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
        filter: cli.log_filter.clone(),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("Failed to initialize tracing: {e:?}");
        std::process::exit(EXIT_FAILURE);
    }

    match commands::execute(&cli.command, &cli.path) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            std::process::exit(EXIT_OK);
        }
        Err(err) => {
            let code = exit_code_for(&err);
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}
