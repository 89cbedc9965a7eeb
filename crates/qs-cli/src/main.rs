//! qslot: quantum slot machine in the terminal
//!
//! Usage:
//!   qslot                                  - local simulator, 20 credits
//!   qslot --source remote-device           - reels from a remote device batch
//!   qslot --config machine.yaml --seed 7   - config file plus overrides
//!
//! Set RUST_LOG=debug to see provider traffic.

mod command;
mod terminal;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use qs_entropy::{FallbackPolicy, SourceKind, TripleSource};
use qs_machine::{MachineConfig, SlotMachine};

use crate::command::{Command, HELP};
use crate::terminal::TerminalDisplay;

#[derive(Parser)]
#[command(name = "qslot", about = "Three-reel slot machine driven by quantum randomness")]
struct Cli {
    /// Machine config (.yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reel provider: local-simulator, remote-device or external-rng
    #[arg(short, long)]
    source: Option<SourceKind>,

    /// Starting credits
    #[arg(long)]
    credits: Option<i64>,

    /// Seed the local sampler and emulated devices
    #[arg(long)]
    seed: Option<u64>,

    /// Serve failed remote pulls from the local simulator
    #[arg(long)]
    fallback_local: bool,
}

impl Cli {
    /// File config (or defaults) with flags applied on top
    fn machine_config(&self) -> Result<MachineConfig> {
        let mut config = match &self.config {
            Some(path) => MachineConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => MachineConfig::default(),
        };
        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(credits) = self.credits {
            config.slot.starting_credits = credits;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.fallback_local {
            config.fallback = FallbackPolicy::LocalSimulator;
        }
        config.validate().context("Invalid machine configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.machine_config()?;
    log::info!(
        "Starting qslot: source {}, {} credits",
        config.source,
        config.slot.starting_credits
    );

    let display = TerminalDisplay::new(io::stdout());
    let mut machine = config
        .build_machine(Box::new(display))
        .context("Failed to build machine")?;

    println!("{}", HELP);
    run(&mut machine).await
}

async fn run(machine: &mut SlotMachine<TripleSource>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(msg) => {
                println!("{}", msg);
                continue;
            }
        };

        match command {
            Command::Pull => {
                if let Err(e) = machine.spin().await {
                    if e.is_session_over() {
                        println!("{}", e);
                    }
                    log::debug!("pull failed: {}", e);
                }
            }
            Command::Source(selector) => match machine.select_source_by_name(&selector) {
                Ok(source) => println!("source: {}", source),
                Err(e) => println!("{}", e),
            },
            Command::Sources => {
                machine.available_sources().await;
            }
            Command::NewSession => machine.new_session()?,
            Command::Stats => {
                let stats = machine.session().stats();
                println!(
                    "pulls {}, staked {}, paid {}, biggest win {}, rtp {:.1}%, hit rate {:.1}%",
                    stats.total_pulls,
                    stats.total_staked,
                    stats.total_paid,
                    stats.biggest_payout,
                    stats.rtp(),
                    stats.hit_rate()
                );
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    let stats = machine.session().stats();
    log::info!(
        "Session ended with {} credits after {} pulls",
        machine.credits(),
        stats.total_pulls
    );
    Ok(())
}
