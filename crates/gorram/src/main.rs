use std::process::ExitCode;

use clap::Parser;

mod cli;
mod paths;

fn main() -> ExitCode {
    // Parse errors and help both go to stderr; cli::report_parse_error
    // keeps the 0-for-help, 2-for-argument-error exit contract.
    let parsed = match cli::Cli::try_parse() {
        Ok(parsed) => parsed,
        Err(err) => return cli::report_parse_error(err),
    };
    cli::run(parsed)
}
