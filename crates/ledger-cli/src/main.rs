use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ledger_core::{Block, Chain, ChainConfig, MiningStrategy, Transaction};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Drive an in-memory proof-of-work ledger")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Two rounds of transfers, two mined blocks, then validate and print the chain
    Demo {
        #[command(flatten)]
        chain: ChainArgs,
    },
    /// Queue the given transactions and mine one or more blocks
    Mine {
        #[command(flatten)]
        chain: ChainArgs,
        /// Transaction as SENDER:RECIPIENT:AMOUNT (repeatable)
        #[arg(long = "tx", value_parser = parse_tx)]
        txs: Vec<Transaction>,
        /// Address credited with the mining reward
        #[arg(long, default_value = "Miner1")]
        miner: String,
        /// Number of blocks to mine; transactions go into the first one
        #[arg(long, default_value_t = 1)]
        blocks: usize,
        /// Reject empty identifiers and negative amounts
        #[arg(long)]
        strict: bool,
        /// Print the whole chain as JSON instead of the block listing
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct ChainArgs {
    /// JSON chain config; flags below override its values
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Leading zero hex characters required in a block hash
    #[arg(long)]
    difficulty: Option<usize>,
    /// Reward paid to the miner of each block
    #[arg(long)]
    reward: Option<f64>,
    /// Search nonces on all cores
    #[arg(long)]
    parallel: bool,
}

impl ChainArgs {
    fn build(&self) -> Result<Chain> {
        let mut config = match &self.config {
            Some(path) => ChainConfig::from_json_file(path)?,
            None => ChainConfig::default(),
        };
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(reward) = self.reward {
            config.mining_reward = reward;
        }
        if self.parallel {
            config.strategy = MiningStrategy::Parallel;
        }
        Chain::with_config(config).context("invalid chain settings")
    }
}

fn parse_tx(raw: &str) -> Result<Transaction, String> {
    let mut parts = raw.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(sender), Some(recipient), Some(amount)) => {
            let amount: f64 = amount
                .parse()
                .map_err(|e| format!("bad amount {amount:?}: {e}"))?;
            Ok(Transaction::new(sender, recipient, amount))
        }
        _ => Err(format!("expected SENDER:RECIPIENT:AMOUNT, got {raw:?}")),
    }
}

fn print_block(block: &Block) {
    let txs: Vec<String> = block
        .transactions()
        .iter()
        .map(|tx| format!("{} -> {}: {}", tx.sender, tx.recipient, tx.amount))
        .collect();
    println!("Block #{}:", block.index());
    println!("  Timestamp: {}", block.timestamp());
    println!("  Transactions: [{}]", txs.join(", "));
    println!("  Previous Hash: {}", block.previous_hash());
    println!("  Hash: {}", block.hash());
    println!("  Nonce: {}\n", block.nonce());
}

fn report(chain: &Chain) {
    match chain.validate() {
        Ok(()) => println!("Is blockchain valid? true"),
        Err(err) => println!("Is blockchain valid? false ({err})"),
    }
    for block in chain.blocks() {
        print_block(block);
    }
}

fn mine_and_announce(chain: &mut Chain, miner: &str) {
    println!("Mining block {}...", chain.len());
    let block = chain.mine_block(miner);
    println!("Block mined! Nonce: {}, Hash: {}", block.nonce(), block.hash());
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Demo { chain } => {
            let mut chain = chain.build()?;
            info!(difficulty = chain.difficulty(), "running demo");

            chain.add_transaction("Alice", "Bob", 50.0);
            chain.add_transaction("Bob", "Charlie", 30.0);
            mine_and_announce(&mut chain, "Miner1");

            chain.add_transaction("Charlie", "Alice", 20.0);
            chain.add_transaction("Bob", "Dave", 10.0);
            mine_and_announce(&mut chain, "Miner2");

            report(&chain);
        }
        Command::Mine {
            chain,
            txs,
            miner,
            blocks,
            strict,
            json,
        } => {
            let mut chain = chain.build()?;
            for tx in txs {
                if strict {
                    chain.submit_transaction(tx)?;
                } else {
                    chain.add_transaction(tx.sender, tx.recipient, tx.amount);
                }
            }
            for _ in 0..blocks {
                mine_and_announce(&mut chain, &miner);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&chain)?);
            } else {
                report(&chain);
            }
        }
    }
    Ok(())
}
