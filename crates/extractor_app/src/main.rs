mod cli;
mod platform;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

fn main() -> anyhow::Result<ExitCode> {
    let cli = cli::Cli::parse();
    platform::logging::initialize(cli.log.into(), cli.level());

    let settings = platform::settings::load_settings(cli.config.as_deref())
        .context("could not load settings")?;

    let succeeded = platform::run_app(cli.command, settings)?;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
