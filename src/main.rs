mod cmd;

use clap::Parser;
use cmd::Cli;

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = cli.command.run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
