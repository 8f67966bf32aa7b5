use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::context::DEFAULT_MAX_CALL_DEPTH;

#[derive(Parser, Debug)]
#[command(
    about = "Runs a MediaScript title headlessly on a fixed-step clock",
    version
)]
pub struct Args {
    /// Path to the title manifest (JSON)
    #[arg(long)]
    pub title: PathBuf,

    /// Number of scheduler ticks to run
    #[arg(long, default_value_t = 100)]
    pub ticks: u64,

    /// Milliseconds the clock advances per tick
    #[arg(long, default_value_t = 50)]
    pub tick_ms: u64,

    /// Seed for the script random number generator
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Maximum nesting of script function and handler calls
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    pub max_call_depth: usize,

    /// Path to write the runtime event log as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Path to write the final globals and actor states as JSON
    #[arg(long)]
    pub state_json: Option<PathBuf>,

    /// Path to write the sound play/stop requests as JSON
    #[arg(long)]
    pub audio_log_json: Option<PathBuf>,

    /// Print a listing of every bytecode body in the title instead of running it
    #[arg(long)]
    pub disassemble: bool,

    /// Print the event log and enable debug logging
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug)]
pub enum Command {
    Run(RunArgs),
    Disassemble(DisassembleArgs),
}

impl Command {
    pub fn verbose(&self) -> bool {
        match self {
            Command::Run(args) => args.verbose,
            Command::Disassemble(args) => args.verbose,
        }
    }
}

#[derive(Debug)]
pub struct RunArgs {
    pub title: PathBuf,
    pub ticks: u64,
    pub tick_ms: u64,
    pub seed: u64,
    pub max_call_depth: usize,
    pub event_log_json: Option<PathBuf>,
    pub state_json: Option<PathBuf>,
    pub audio_log_json: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug)]
pub struct DisassembleArgs {
    pub title: PathBuf,
    pub verbose: bool,
}

pub fn parse() -> Result<Command> {
    let args = Args::parse();
    args.into_command()
}

impl Args {
    fn into_command(self) -> Result<Command> {
        if self.disassemble {
            for (flag, set) in [
                ("--event-log-json", self.event_log_json.is_some()),
                ("--state-json", self.state_json.is_some()),
                ("--audio-log-json", self.audio_log_json.is_some()),
            ] {
                if set {
                    bail!("{flag} cannot be combined with --disassemble");
                }
            }
            return Ok(Command::Disassemble(DisassembleArgs {
                title: self.title,
                verbose: self.verbose,
            }));
        }

        if self.tick_ms == 0 {
            bail!("--tick-ms must be at least 1");
        }
        if self.max_call_depth == 0 {
            bail!("--max-call-depth must be at least 1");
        }

        Ok(Command::Run(RunArgs {
            title: self.title,
            ticks: self.ticks,
            tick_ms: self.tick_ms,
            seed: self.seed,
            max_call_depth: self.max_call_depth,
            event_log_json: self.event_log_json,
            state_json: self.state_json,
            audio_log_json: self.audio_log_json,
            verbose: self.verbose,
        }))
    }
}
