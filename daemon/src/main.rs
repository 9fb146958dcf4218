//! POAP daemon: admin CLI over a POAP ledger node.
//!
//! Each invocation loads the state file, runs one operation and, if the
//! operation changed anything, writes the state back.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use poap_access::Role;
use poap_node::{init_logging, NodeConfig, PoapNode};
use poap_types::{Address, Clock, CredentialId, Fingerprint, FixedClock, SystemClock, Timestamp};

#[derive(Parser)]
#[command(name = "poap-daemon", about = "POAP issuance ledger admin CLI")]
struct Cli {
    /// Directory holding the state file.
    #[arg(long, env = "POAP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// State file name inside the data directory.
    #[arg(long, env = "POAP_STATE_FILE")]
    state_file: Option<String>,

    /// Bootstrap admin granted every role when the ledger is first created.
    #[arg(long, env = "POAP_ADMIN")]
    admin: Option<Address>,

    /// Collect Prometheus metrics and log them at debug level on exit.
    #[arg(long, env = "POAP_ENABLE_METRICS")]
    metrics: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "POAP_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "POAP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address the operation is performed as.
    #[arg(long, global = true, env = "POAP_CALLER")]
    caller: Option<Address>,

    /// Current time in unix seconds (defaults to the system clock).
    #[arg(long, global = true, env = "POAP_NOW")]
    now: Option<u64>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Register a lecture and print its fingerprint.
    Register {
        name: String,
        /// Window start, unix seconds.
        start: u64,
        /// Window end (inclusive), unix seconds.
        deadline: u64,
        metadata_uri: String,
    },
    /// Issue one credential.
    Issue {
        fingerprint: Fingerprint,
        attendee: Address,
    },
    /// Issue credentials to every listed attendee that has none yet.
    IssueBatch {
        fingerprint: Fingerprint,
        attendees: Vec<Address>,
    },
    /// Show one lecture, by fingerprint or by registration index.
    Lecture {
        fingerprint: Option<Fingerprint>,
        #[arg(long, conflicts_with = "fingerprint")]
        index: Option<usize>,
    },
    /// List every lecture in registration order.
    Lectures,
    /// List the credential ids held by an address.
    TokensOf { owner: Address },
    /// Show the credential id an attendee holds for a lecture (0 if none).
    Claimed {
        fingerprint: Fingerprint,
        attendee: Address,
    },
    /// Show the metadata URI for a credential.
    Metadata { id: u64 },
    /// Engage the emergency halt.
    Halt,
    /// Release the emergency halt.
    Resume,
    /// Grant a role ("admin", "issuer", "halt-controller").
    Grant { role: Role, account: Address },
    /// Revoke a role.
    Revoke { role: Role, account: Address },
    /// Print notifications after a sequence number.
    Events {
        #[arg(long, default_value_t = 0)]
        since: u64,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let file_config = match &cli.config {
        Some(path) => {
            let path = path.to_str().context("config path is not valid UTF-8")?;
            NodeConfig::from_toml_file(path)
                .with_context(|| format!("failed to load config file {path}"))?
        }
        None => NodeConfig::default(),
    };

    Ok(NodeConfig {
        data_dir: cli.data_dir.clone().unwrap_or(file_config.data_dir),
        state_file: cli.state_file.clone().unwrap_or(file_config.state_file),
        admin: cli.admin.or(file_config.admin),
        log_format: cli.log_format.clone().unwrap_or(file_config.log_format),
        log_level: cli.log_level.clone().unwrap_or(file_config.log_level),
        enable_metrics: cli.metrics || file_config.enable_metrics,
        ..file_config
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format(), &config.log_level)?;

    let clock: Arc<dyn Clock> = match cli.now {
        Some(secs) => Arc::new(FixedClock(Timestamp::new(secs))),
        None => Arc::new(SystemClock),
    };
    let node = PoapNode::open_with_clock(config, clock)?;
    let caller = || cli.caller.context("--caller is required for this command");

    let mutated = match cli.command {
        Command::Register {
            name,
            start,
            deadline,
            metadata_uri,
        } => {
            let fingerprint = node.register(
                &caller()?,
                &name,
                Timestamp::new(start),
                Timestamp::new(deadline),
                &metadata_uri,
            )?;
            println!("{fingerprint}");
            true
        }
        Command::Issue {
            fingerprint,
            attendee,
        } => {
            let id = node.issue(&caller()?, &fingerprint, attendee)?;
            println!("{id}");
            true
        }
        Command::IssueBatch {
            fingerprint,
            attendees,
        } => {
            let outcome = node.issue_batch(&caller()?, &fingerprint, &attendees)?;
            for (attendee, id) in &outcome.issued {
                println!("{attendee} {id}");
            }
            for attendee in &outcome.skipped {
                println!("{attendee} skipped");
            }
            true
        }
        Command::Lecture { fingerprint, index } => {
            let record = match (fingerprint, index) {
                (Some(fingerprint), _) => node
                    .ledger()
                    .lecture(&fingerprint)
                    .with_context(|| format!("no lecture with fingerprint {fingerprint}"))?,
                (None, Some(index)) => node.ledger().lecture_by_index(index)?,
                (None, None) => anyhow::bail!("pass a fingerprint or --index"),
            };
            print_json(&record)?;
            false
        }
        Command::Lectures => {
            print_json(&node.ledger().lectures())?;
            false
        }
        Command::TokensOf { owner } => {
            for id in node.ledger().tokens_of(&owner) {
                println!("{id}");
            }
            false
        }
        Command::Claimed {
            fingerprint,
            attendee,
        } => {
            println!("{}", node.ledger().claimed_id(&fingerprint, &attendee));
            false
        }
        Command::Metadata { id } => {
            println!("{}", node.ledger().metadata_of(CredentialId::new(id))?);
            false
        }
        Command::Halt => {
            node.halt(&caller()?)?;
            true
        }
        Command::Resume => {
            node.resume(&caller()?)?;
            true
        }
        Command::Grant { role, account } => {
            if !node.grant_role(&caller()?, role, account)? {
                tracing::info!(%role, %account, "role already held");
            }
            true
        }
        Command::Revoke { role, account } => {
            if !node.revoke_role(&caller()?, role, account)? {
                tracing::info!(%role, %account, "role was not held");
            }
            true
        }
        Command::Events { since } => {
            print_json(&node.ledger().events_since(since))?;
            false
        }
    };

    if mutated {
        node.save()?;
    }
    if let Some(metrics) = node.metrics() {
        tracing::debug!(metrics = %metrics.encode()?, "metrics");
    }
    Ok(())
}
