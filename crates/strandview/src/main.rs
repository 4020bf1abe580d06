mod cli;
mod run;
mod snapshot;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::List) => run::list(&cli.run),
        Some(Command::Snapshot(args)) => snapshot::run(&args),
        None => run::run(cli.run),
    }
}
