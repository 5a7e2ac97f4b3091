//! Ad-hoc chain construction and tampering.

use super::display::{print_chain, print_validity};
use anyhow::{Context, Result};
use clap::builder::TypedValueParser;
use clap::Args;
use hashchain_chain::{Blockchain, DEFAULT_DIFFICULTY};

#[derive(Args)]
pub struct MineArgs {
    /// Payloads to mine, one block each, in order
    #[arg(required = true)]
    payloads: Vec<String>,

    /// Leading zero characters required when mining
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_DIFFICULTY,
        value_parser = clap::value_parser!(u8).range(0..=8).map(usize::from)
    )]
    difficulty: usize,

    /// Replace a block's payload after mining, as INDEX=DATA (repeatable)
    #[arg(long, value_name = "INDEX=DATA", value_parser = parse_edit)]
    edit: Vec<(usize, String)>,

    /// Remine a block after the edits are applied (repeatable, applied in order)
    #[arg(long, value_name = "INDEX")]
    remine: Vec<usize>,

    /// Print the chain as JSON wire records instead of a table
    #[arg(long)]
    json: bool,
}

pub fn run(args: MineArgs) -> Result<()> {
    let mut chain = Blockchain::with_difficulty(args.difficulty);

    for payload in args.payloads {
        let block = chain.create_block(payload);
        chain.add_block(block);
    }

    for (index, data) in args.edit {
        chain
            .edit_block(index, data)
            .with_context(|| format!("Failed to edit block {}", index))?;
    }

    for index in args.remine {
        chain
            .remine_block(index)
            .with_context(|| format!("Failed to remine block {}", index))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(chain.blocks())?);
    } else {
        print_chain(&chain);
        print_validity(&chain);
        println!();
    }

    Ok(())
}

fn parse_edit(s: &str) -> std::result::Result<(usize, String), String> {
    let (index, data) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=DATA, got '{}'", s))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid index '{}': {}", index, e))?;
    Ok((index, data.to_string()))
}
