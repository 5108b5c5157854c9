use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use agroledger_core::{Core, LedgerConfig};

#[derive(Parser)]
#[command(name = "agroledger-cli")]
#[command(about = "AgroLedger CLI - trade ledger, escrow, and integrity sealing")]
#[command(version = "1.0.0")]
struct Cli {
    /// Directory holding the ledger and contract snapshot files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Buffer a trade record for the next sealed block
    AddTx {
        #[arg(long)]
        farmer_id: String,
        #[arg(long)]
        buyer_id: String,
        #[arg(long)]
        crop: String,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        order_id: Option<String>,
    },

    /// Solve proof-of-work and seal the pending pool into a new block
    Seal,

    /// Run the full chain validation scan
    Validate,

    /// Print the committed block sequence
    ShowChain,

    /// Create an escrow contract in LOCKED state
    Initiate {
        #[arg(long)]
        farmer_id: String,
        #[arg(long)]
        buyer_id: String,
        #[arg(long)]
        crop: String,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        price: f64,
    },

    /// Mark an escrow contract as dispatched (LOCKED -> DISPATCHED)
    Dispatch {
        #[arg(long)]
        contract_id: String,
    },

    /// Confirm delivery and release payment (DISPATCHED -> RELEASED)
    Confirm {
        #[arg(long)]
        contract_id: String,
    },

    /// Look up an escrow contract
    GetContract {
        #[arg(long)]
        contract_id: String,
    },

    /// Compute and durably anchor an integrity seal for a trade
    SealIntegrity {
        #[arg(long)]
        farmer_id: String,
        #[arg(long)]
        buyer_id: String,
        #[arg(long)]
        crop: String,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        order_id: String,
    },

    /// Recompute an integrity digest and report tampering
    VerifyIntegrity {
        #[arg(long)]
        farmer_id: String,
        #[arg(long)]
        buyer_id: String,
        #[arg(long)]
        crop: String,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        order_id: String,
        #[arg(long)]
        stored_digest: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let core = Core::open(&LedgerConfig {
        data_dir: cli.data_dir,
    })
    .context("failed to open ledger")?;

    match cli.command {
        Commands::AddTx {
            farmer_id,
            buyer_id,
            crop,
            quantity,
            price,
            order_id,
        } => {
            let index = core.add_transaction(&farmer_id, &buyer_id, &crop, quantity, price, order_id);
            println!("Transaction buffered for block {}", index);
        }

        Commands::Seal => {
            let block = core.seal_block()?;
            println!("{}", serde_json::to_string_pretty(&block)?);
            println!("Block hash: {}", core.hash_block(&block)?);
        }

        Commands::Validate => {
            if core.validate_chain() {
                println!("Chain valid ({} blocks)", core.chain().len());
            } else {
                println!("Chain INVALID");
                process::exit(2);
            }
        }

        Commands::ShowChain => {
            println!("{}", serde_json::to_string_pretty(&core.chain().blocks())?);
        }

        Commands::Initiate {
            farmer_id,
            buyer_id,
            crop,
            quantity,
            price,
        } => {
            let contract = core.initiate_contract(&farmer_id, &buyer_id, &crop, quantity, price)?;
            println!("{}", serde_json::to_string_pretty(&contract)?);
        }

        Commands::Dispatch { contract_id } => {
            let contract = core.dispatch(&contract_id)?;
            println!("{}", serde_json::to_string_pretty(&contract)?);
        }

        Commands::Confirm { contract_id } => {
            let contract = core.confirm(&contract_id)?;
            println!("{}", serde_json::to_string_pretty(&contract)?);
        }

        Commands::GetContract { contract_id } => {
            let contract = core.get_contract(&contract_id)?;
            println!("{}", serde_json::to_string_pretty(&contract)?);
        }

        Commands::SealIntegrity {
            farmer_id,
            buyer_id,
            crop,
            quantity,
            price,
            order_id,
        } => {
            let digest =
                core.seal_integrity(&farmer_id, &buyer_id, &crop, quantity, price, &order_id)?;
            println!("Integrity digest: {}", digest);
        }

        Commands::VerifyIntegrity {
            farmer_id,
            buyer_id,
            crop,
            quantity,
            price,
            order_id,
            stored_digest,
        } => {
            let report = core.verify_integrity(
                &farmer_id,
                &buyer_id,
                &crop,
                quantity,
                price,
                &order_id,
                &stored_digest,
            )?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
