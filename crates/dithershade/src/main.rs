mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Still(still)) => run::export_still(&cli.run, &still),
        Some(Command::Presets) => run::list_presets(&cli.run),
        Some(Command::Where) => run::print_where(&cli.run),
        None => run::run(&cli.run),
    }
}
