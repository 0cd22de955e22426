mod commands;
mod terminal;

use commands::{CommandLine, Commands, check, clean, parse, report};
use terminal::{logging, print};

fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; flags and the environment still apply.
    dotenv::dotenv().ok();

    let commands = CommandLine::parse_args();
    logging::init_logging(commands.verbose, commands.quiet);

    let quiet = commands.quiet;
    let cfg = commands.config.into_config();

    match commands.command {
        Commands::Report { institution, logs } => {
            print::header("usage report");
            report::report(&institution, &logs, &cfg, quiet)
        }
        Commands::Clean { folder, out_dir } => {
            print::header("cleaning logs");
            clean::clean(&folder, &out_dir, &cfg, quiet)
        }
        Commands::Check { institution } => check::check(&institution, &cfg),
        Commands::Parse { specs } => {
            print::header("parsing specifications");
            parse::parse(&specs)
        }
    }
}
