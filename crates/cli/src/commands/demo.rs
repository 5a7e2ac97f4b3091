//! Guided tamper walkthrough.

use super::display::{print_chain, print_validity};
use anyhow::Result;
use clap::builder::TypedValueParser;
use clap::Args;
use colored::Colorize;
use hashchain_chain::Blockchain;

#[derive(Args)]
pub struct DemoArgs {
    /// Leading zero characters required when mining
    #[arg(
        short,
        long,
        default_value_t = 3,
        value_parser = clap::value_parser!(u8).range(0..=8).map(usize::from)
    )]
    difficulty: usize,
}

pub fn run(args: DemoArgs) -> Result<()> {
    let mut chain = Blockchain::with_difficulty(args.difficulty);

    step("Mining three blocks on top of genesis");
    for payload in ["Block 1", "Block 2", "Block 3"] {
        let block = chain.create_block(payload);
        chain.add_block(block);
    }
    print_chain(&chain);
    print_validity(&chain);

    step("Tampering with block 1");
    chain.edit_block(1, "X")?;
    print_chain(&chain);
    print_validity(&chain);

    step("Remining block 1 (repairs one link only)");
    chain.remine_block(1)?;
    print_chain(&chain);
    print_validity(&chain);

    step("Remining the remaining blocks in order");
    for index in 2..chain.len() {
        chain.remine_block(index)?;
    }
    print_chain(&chain);
    print_validity(&chain);

    step("Resetting");
    chain.reset();
    print_chain(&chain);
    print_validity(&chain);

    println!();
    Ok(())
}

fn step(title: &str) {
    println!();
    println!("{}", title.bold().cyan());
}
