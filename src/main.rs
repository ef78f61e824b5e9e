use clap::Parser;
use coffee_meme::{logging::init_logging, run, Cli};
use log::error;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _handle = init_logging(cli.log_level.into())?;
    if let Err(e) = run(cli) {
        error!("{e:?}");
        return Err(e);
    }
    Ok(())
}
