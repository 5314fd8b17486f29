mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{batch, generate, overlay};

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logger(cli.verbose);

    match &cli.command {
        Commands::Generate(args) => generate::run(&cli, args),
        Commands::Batch(args) => batch::run(&cli, args),
        Commands::Overlay(args) => overlay::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
