//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod demo;
mod display;
mod mine;

#[derive(Subcommand)]
pub enum Commands {
    /// Walk through mining, tampering and repairing a small chain
    Demo(demo::DemoArgs),
    /// Mine blocks from the given payloads, optionally tampering afterwards
    Mine(mine::MineArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Demo(args) => demo::run(args),
        Commands::Mine(args) => mine::run(args),
    }
}
