use anyhow::{Context, Result};
use clap::Parser;
use hashchain_core::{constants::DEFAULT_DIFFICULTY, Blockchain, MinerConfig, Transfer};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "hashchain")]
#[command(about = "Build a small proof-of-work ledger and check its integrity")]
struct Cli {
    /// Required leading zero hex digits per block hash
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,
    /// Give up mining a block after this many hashes
    #[arg(long)]
    max_attempts: Option<u64>,
    /// Search nonces on all cores
    #[arg(long)]
    parallel: bool,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct BlockRow<'a> {
    index: usize,
    nonce: u64,
    timestamp: u64,
    hash: &'a str,
    previous_hash: &'a str,
    data: &'a Transfer,
}

#[derive(Serialize)]
struct Report<'a> {
    difficulty: u32,
    block_1: Transfer,
    valid: bool,
    blocks: Vec<BlockRow<'a>>,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = MinerConfig {
        difficulty: cli.difficulty,
        max_attempts: cli.max_attempts,
        parallel: cli.parallel,
    };
    info!(?config, "starting");

    let mut chain = Blockchain::with_config(config);
    for (from, to, amount) in [("Alice", "Bob", 5.0), ("John", "Bob", 2.0)] {
        chain
            .append_configured(from, to, amount)
            .with_context(|| format!("mining block for {from} -> {to}"))?;
    }

    let block_1 = chain.get_block_data(1)?;
    let valid = chain.is_valid();

    if cli.json {
        let report = Report {
            difficulty: chain.difficulty(),
            block_1,
            valid,
            blocks: chain
                .blocks()
                .iter()
                .enumerate()
                .map(|(index, b)| BlockRow {
                    index,
                    nonce: b.nonce(),
                    timestamp: b.timestamp(),
                    hash: b.hash(),
                    previous_hash: b.previous_hash(),
                    data: b.data(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (index, b) in chain.blocks().iter().enumerate() {
            println!("#{index} nonce={} hash={} prev={}", b.nonce(), b.hash(), b.previous_hash());
        }
        println!("block 1: {block_1}");
        println!("valid: {valid}");
    }
    Ok(())
}
