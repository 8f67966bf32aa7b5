use anyhow::Result;
use mediastation_engine::cli::{self, Command};
use mediastation_engine::runtime;

fn main() -> Result<()> {
    let command = cli::parse()?;

    let default_filter = if command.verbose() { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match command {
        Command::Run(args) => runtime::execute(args),
        Command::Disassemble(args) => runtime::disassemble_title(args),
    }
}
