//! Terminal rendering shared by the commands.

use colored::Colorize;
use hashchain_chain::Blockchain;
use hashchain_core::Block;

/// Print every block, highlighting tainted ones and stale links.
pub fn print_chain(chain: &Blockchain) {
    println!();
    for (position, block) in chain.blocks().iter().enumerate() {
        let linked = position == 0
            || chain
                .block(position - 1)
                .is_some_and(|prev| prev.digest() == block.previous_digest());
        print_block(block, linked, chain.difficulty());
    }
    println!();
}

fn print_block(block: &Block, linked: bool, difficulty: usize) {
    let status = if block.is_corrupted() {
        "CORRUPTED".red().bold()
    } else {
        "sealed".green()
    };

    println!(
        "  {} {} {}",
        format!("#{}", block.index()).bright_black(),
        block.digest().short().bright_yellow(),
        status
    );
    println!("      Data:     {:?}", block.payload());

    let previous = block.previous_digest().short();
    if linked {
        println!("      Previous: {}", previous.bright_black());
    } else {
        println!("      Previous: {} {}", previous.red(), "(stale link)".red());
    }

    let nonce = block.nonce().to_string();
    if block.meets_difficulty(difficulty) {
        println!("      Nonce:    {}", nonce.bright_cyan());
    } else {
        println!(
            "      Nonce:    {} {}",
            nonce.bright_cyan(),
            "(below difficulty)".yellow()
        );
    }
}

/// Print the outcome of the validation scan.
pub fn print_validity(chain: &Blockchain) {
    match chain.verify() {
        Ok(()) => println!("  Chain is {}", "VALID".green().bold()),
        Err(fault) => println!("  Chain is {}: {}", "INVALID".red().bold(), fault),
    }
}
