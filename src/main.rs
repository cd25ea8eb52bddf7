use anyhow::Result;
use clap::Parser;
use log::debug;

use rawimg::cli::SubCommandExtend;
use rawimg::config::{Opts, SubCommand};

fn main() -> Result<()> {
    env_logger::init();

    let opts = Opts::parse();
    debug!("{:?}", opts);

    match &opts.subcmd {
        Some(SubCommand::Convert(cmd)) => cmd.run(&opts),
        Some(SubCommand::Inspect(cmd)) => cmd.run(&opts),
        None => opts.convert.run(&opts),
    }
}
