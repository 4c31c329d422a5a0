//! gatsby-publish - build a Gatsby site and publish it to a branch.

mod cli;
mod config;
mod context;
mod deploy;
mod logger;
mod package;
mod pipeline;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::{FileConfig, PublishConfig};
use context::RunContext;
use pipeline::Pipeline;
use utils::{exec::SystemRunner, fs::LocalFs};

fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    if let Err(err) = run(&cli) {
        logger::report_failure(&format!("{err:#}"));
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let file = cli.config.as_deref().map(FileConfig::load).transpose()?;
    let config = PublishConfig::resolve(&cli.inputs, file.as_ref())?;

    // Fail on a missing token before anything reads the host environment
    logger::add_mask(config.require_access_token()?);

    let ctx = RunContext::from_args(&cli.context)?;
    debug!("context"; "{} @ {} by {}", ctx.git_ref, ctx.sha, ctx.actor);

    let outcome = Pipeline::new(&config, &ctx, &SystemRunner, &LocalFs).run()?;
    debug!("done"; "{outcome:?}");
    Ok(())
}
