//! accrual-engine CLI
//!
//! Run the daily accrual batch and inspect ticker projections from the
//! command line.
//!
//! # Usage
//!
//! ```bash
//! # Settle every account in a snapshot through yesterday
//! accrual-engine run --input book.json --output book.json
//!
//! # Settle as if today were a given date, JSON summary
//! accrual-engine run --input book.json --today 2024-03-01 --format json
//!
//! # Show what a live display would render 90 seconds after a sync
//! accrual-engine project --input book.json --account ACC-00001 --elapsed-secs 90
//!
//! # Generate a synthetic snapshot
//! accrual-engine generate --accounts 500 --entities 20 --output book.json
//! ```

use accrual_engine::config::EngineConfig;
use accrual_engine::core::account::AccountId;
use accrual_engine::runner::engine::{AccrualRunner, RunStatus};
use accrual_engine::runner::memory::{MemoryStore, Snapshot};
use accrual_engine::runner::ports::AccrualLedger;
use accrual_engine::simulation::portfolio::{generate_portfolio, PortfolioConfig};
use accrual_engine::ticker::session::TickerSession;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "accrual-engine",
    version,
    about = "Tiered interest accrual and live balance ticker"
)]
struct Cli {
    /// JSON engine config; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Settle every account through the day before `--today`
    Run {
        #[arg(long)]
        input: PathBuf,
        /// Defaults to the current UTC date
        #[arg(long)]
        today: Option<NaiveDate>,
        /// Write the updated snapshot here
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Extrapolate one account's balance as a live display would
    Project {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        account: String,
        #[arg(long, default_value_t = 60)]
        elapsed_secs: u64,
    },
    /// Generate a random snapshot
    Generate {
        #[arg(long, default_value_t = 100)]
        accounts: usize,
        #[arg(long, default_value_t = 10)]
        entities: usize,
        #[arg(long, default_value_t = 3)]
        tiers: usize,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// JSON output schema for a batch run.
#[derive(serde::Serialize)]
struct RunOutput {
    through: NaiveDate,
    total_posted: u64,
    days_committed: u64,
    accounts: Vec<AccountOutput>,
}

#[derive(serde::Serialize)]
struct AccountOutput {
    account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<RunStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    days_committed: u32,
    interest_posted: u64,
    as_of: Option<NaiveDate>,
}

fn load_store(path: &Path) -> Result<MemoryStore> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading snapshot '{}'", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("parsing snapshot '{}'", path.display()))?;
    MemoryStore::from_snapshot(snapshot).context("loading snapshot")
}

fn write_json<T: serde::Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing '{}'", path.display()))
        }
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

fn cmd_run(
    config: EngineConfig,
    input: &Path,
    today: Option<NaiveDate>,
    output: Option<&Path>,
    format: Format,
) -> Result<()> {
    let store = load_store(input)?;
    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    let ids = store.account_ids()?;

    let runner = AccrualRunner::new(&store, &store, config);
    let summary = runner.run_all(&ids, today);

    match format {
        Format::Text => println!("{}", summary),
        Format::Json => {
            let accounts = summary
                .outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok(r) => AccountOutput {
                        account: o.account_id.to_string(),
                        status: Some(r.status.clone()),
                        error: None,
                        days_committed: r.days_committed,
                        interest_posted: r.interest_posted.get(),
                        as_of: Some(r.as_of),
                    },
                    Err(e) => AccountOutput {
                        account: o.account_id.to_string(),
                        status: None,
                        error: Some(e.to_string()),
                        days_committed: 0,
                        interest_posted: 0,
                        as_of: None,
                    },
                })
                .collect();
            let out = RunOutput {
                through: today.pred_opt().unwrap_or(today),
                total_posted: summary.total_posted().get(),
                days_committed: summary.days_committed(),
                accounts,
            };
            write_json(&out, None)?;
        }
    }

    if let Some(path) = output {
        write_json(&store.to_snapshot()?, Some(path))?;
        eprintln!("Updated snapshot → {}", path.display());
    }

    if summary.failures().next().is_some() {
        bail!("{} account(s) halted on integrity errors", summary.failures().count());
    }
    Ok(())
}

fn cmd_project(
    config: &EngineConfig,
    input: &Path,
    account: &str,
    elapsed_secs: u64,
) -> Result<()> {
    let store = load_store(input)?;
    let id = AccountId::new(account);
    let stored = store.account(&id)?;

    let now_ms = Utc::now().timestamp_millis();
    let mut session = TickerSession::from_config(id.clone(), config);
    let current = session
        .tick(&store, now_ms)
        .ok_or_else(|| anyhow!("no authoritative data for {}", id))?;
    let elapsed_ms = i64::try_from(elapsed_secs.saturating_mul(1_000)).unwrap_or(i64::MAX);
    let projected = session
        .tick(&store, now_ms.saturating_add(elapsed_ms))
        .unwrap_or(current);

    println!("Account:        {}", id);
    println!("As of:          {}", stored.as_of);
    println!("Authoritative:  {}", stored.balance);
    println!("Now:            {}", current);
    println!("After {:>6}s:   {}", elapsed_secs, projected);
    Ok(())
}

fn cmd_generate(
    accounts: usize,
    entities: usize,
    tiers: usize,
    as_of: Option<NaiveDate>,
    output: Option<&Path>,
) -> Result<()> {
    let defaults = PortfolioConfig::default();
    let config = PortfolioConfig {
        accounts,
        entities,
        tiers_per_set: tiers,
        as_of: as_of.unwrap_or(defaults.as_of),
        ..defaults
    };
    let snapshot = generate_portfolio(&config);
    write_json(&snapshot, output)?;
    if let Some(path) = output {
        eprintln!(
            "Generated {} accounts across {} entities → {}",
            snapshot.accounts.len(),
            entities,
            path.display()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Run {
            input,
            today,
            output,
            format,
        } => cmd_run(config, &input, today, output.as_deref(), format),
        Command::Project {
            input,
            account,
            elapsed_secs,
        } => cmd_project(&config, &input, &account, elapsed_secs),
        Command::Generate {
            accounts,
            entities,
            tiers,
            as_of,
            output,
        } => cmd_generate(accounts, entities, tiers, as_of, output.as_deref()),
    }
}
