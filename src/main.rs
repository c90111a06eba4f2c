// ledger - operator CLI over a sled-backed plasma ledger

use clap::{Parser, Subcommand};
use plasma_ledger::history::parse_window;
use plasma_ledger::identity::{Address, Hash256, SpendSigner};
use plasma_ledger::ledger::Unit;
use plasma_ledger::storage::{LedgerStore, SledStore};
use plasma_ledger::{DepositRequest, LedgerConfig, StoreConfig, TransitionEngine};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ledger", version, about = "Plasma child-chain ledger operator tool")]
struct Cli {
    /// Database directory
    #[arg(long, env = "PLASMA_LEDGER_DB", default_value = "./ledger-db")]
    db: PathBuf,

    /// Flush to disk after every committed transition
    #[arg(long)]
    flush: bool,

    /// Largest checkpoint window served
    #[arg(long, default_value_t = plasma_ledger::config::DEFAULT_CHECKPOINT_WINDOW)]
    max_window: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a root-chain deposit
    Deposit {
        #[arg(long)]
        owner: Address,
        #[arg(long)]
        value: u64,
        #[arg(long)]
        tx: Hash256,
        #[arg(long, default_value = "")]
        token: String,
        #[arg(long, default_value_t = 0)]
        chain: u64,
    },
    /// Sign a spend with a local key and apply it
    Spend {
        #[arg(long)]
        unit: Hash256,
        #[arg(long)]
        to: Address,
        #[arg(long)]
        value: u64,
        /// Hex secret key of the unit owner
        #[arg(long, env = "PLASMA_LEDGER_KEY")]
        key: String,
    },
    /// Sign a merge with a local key and apply it
    Merge {
        #[arg(long)]
        unit1: Hash256,
        #[arg(long)]
        unit2: Hash256,
        #[arg(long, env = "PLASMA_LEDGER_KEY")]
        key: String,
    },
    /// Record a withdrawal started on the root chain
    Withdraw {
        #[arg(long)]
        unit: Hash256,
        #[arg(long)]
        tx: Hash256,
        #[arg(long, default_value = "")]
        token: String,
        #[arg(long, default_value_t = 0)]
        chain: u64,
    },
    /// Show one unit
    Unit { id: Hash256 },
    /// List spendable units of an address
    Balance { owner: Address },
    /// Show the spends that produced a unit
    Provenance { id: Hash256 },
    /// List spends in an inclusive sequence window
    Spends { start: String, end: String },
    /// Show the last spend sequence number
    LastSpend,
    /// Generate a signing key
    Keygen,
    /// Show record counts
    Stats,
}

fn print_unit(unit: &Unit) {
    println!(
        "{} owner={} value={} token={:?} chain={} deleted={} withdrawn={}",
        unit.id(),
        unit.owner(),
        unit.value(),
        unit.token_id(),
        unit.chain_id(),
        unit.is_deleted(),
        unit.is_withdrawn()
    );
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Command::Keygen = cli.command {
        let signer = SpendSigner::generate();
        println!("address: {}", signer.address());
        println!("secret:  0x{}", hex::encode(signer.secret_bytes()));
        return Ok(());
    }

    let store_config = StoreConfig::new(&cli.db).with_flush_on_commit(cli.flush);
    let store: Arc<dyn LedgerStore> = Arc::new(SledStore::open_with(&store_config)?);
    let config = LedgerConfig::new().with_max_checkpoint_window(cli.max_window);
    let engine = TransitionEngine::new(store, config)?;

    match cli.command {
        Command::Deposit { owner, value, tx, token, chain } => {
            let request = DepositRequest::new(owner, value, tx)
                .with_token_id(token)
                .with_chain_id(chain);
            print_unit(&engine.record_deposit(request)?);
        }
        Command::Spend { unit, to, value, key } => {
            let signer = SpendSigner::from_hex(&key)?;
            let signature = signer.sign_spend(&unit, &to, value);
            let outcome = engine.spend(&unit, &to, value, &signature)?;
            println!("seq {}: {}", outcome.seq, outcome.new_id1);
            if let Some(change) = outcome.new_id2 {
                println!("change: {}", change);
            }
        }
        Command::Merge { unit1, unit2, key } => {
            let signer = SpendSigner::from_hex(&key)?;
            let signature = signer.sign_merge(&unit1, &unit2);
            let outcome = engine.merge(&unit1, &unit2, &signature)?;
            println!("{} value={}", outcome.new_id, outcome.value);
        }
        Command::Withdraw { unit, tx, token, chain } => {
            let record = engine.record_withdrawal_started(&unit, &tx, token, chain)?;
            println!("withdrawal of {} started by {}", record.unit_id, record.started_tx);
        }
        Command::Unit { id } => print_unit(&engine.units().get(&id)?),
        Command::Balance { owner } => {
            let units = engine.list_by_owner(&owner)?;
            for unit in &units {
                print_unit(unit);
            }
            println!("total: {}", units.iter().map(Unit::value).sum::<u64>());
        }
        Command::Provenance { id } => {
            for spend in engine.trace_provenance(&id)? {
                println!("#{} {} -> {} ({})", spend.seq, spend.old_tx, spend.new_tx1, spend.value);
            }
        }
        Command::Spends { start, end } => {
            let (start, end) = parse_window(&start, &end)?;
            for spend in engine.checkpoints().spends_in_range(start, end)? {
                println!("#{} {} -> {} ({})", spend.seq, spend.old_tx, spend.to_addr, spend.value);
            }
        }
        Command::LastSpend => println!("{}", engine.checkpoints().last_spend_seq()?),
        Command::Stats => println!("{:?}", engine.store().stats()?),
        Command::Keygen => {}
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
