mod cli;
mod commands;

use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    plancost::init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        // print_help only fails when stdout is gone
        let _ = Cli::command().print_help();
        println!();
        return;
    };

    if let Err(err) = commands::run_command(command) {
        eprintln!("{} {err:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}
