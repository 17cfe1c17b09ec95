mod cli;
mod extract_cmd;
mod logging;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose);

    if let Err(code) = extract_cmd::run(&cli) {
        std::process::exit(code);
    }
}
