//! Line-oriented front end for one Hilo table.
//!
//! Each stdin line is `<sender> <text>`, e.g. `U1 H/100` or `admin S456`.
//! Each reply is one JSON line on stdout.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hilo_engine::{
    DEFAULT_MAILBOX_CAPACITY, Engine, EngineHandle, JsonFileStore, MemoryStore, Role, StateStore,
    decode_text,
};
use hilo_types::{AccountId, HiloError, TableConfig, constants};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Snapshot file. State is kept in memory only when omitted.
    #[arg(long)]
    state: Option<PathBuf>,

    /// Account allowed to run admin commands (repeatable).
    #[arg(long = "admin")]
    admins: Vec<String>,

    /// JSON table configuration used when no snapshot exists yet.
    #[arg(long)]
    table_config: Option<PathBuf>,

    /// Emit logs as JSON instead of plain text.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Engine mailbox depth.
    #[arg(long, default_value_t = DEFAULT_MAILBOX_CAPACITY)]
    mailbox: usize,
}

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TableConfig> {
    let Some(path) = path else {
        return Ok(TableConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading table config {}", path.display()))?;
    let config: TableConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parsing table config {}", path.display()))?;
    config.validate().context("invalid table config")?;
    Ok(config)
}

fn error_line(err: &HiloError) -> serde_json::Value {
    json!({ "error": err.to_string(), "message": err.user_message() })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let config = load_config(args.table_config.as_ref())?;
    let admins: HashSet<AccountId> = args.admins.iter().map(AccountId::new).collect();

    match &args.state {
        Some(path) => {
            let engine = Engine::open(JsonFileStore::new(path), config)
                .with_context(|| format!("opening snapshot {}", path.display()))?;
            serve(engine, &admins, args.mailbox).await
        }
        None => {
            tracing::warn!("No --state given, nothing will be persisted");
            let engine = Engine::open(MemoryStore::new(), config)?;
            serve(engine, &admins, args.mailbox).await
        }
    }
}

async fn serve<S>(engine: Engine<S>, admins: &HashSet<AccountId>, mailbox: usize) -> anyhow::Result<()>
where
    S: StateStore + Send + 'static,
{
    let (handle, task) = EngineHandle::spawn(engine, mailbox);
    tracing::info!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        admins = admins.len(),
        "Table ready"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let Some((sender, text)) = line.trim().split_once(char::is_whitespace) else {
            continue;
        };
        let sender = AccountId::new(sender);
        let role = if admins.contains(&sender) {
            Role::Admin
        } else {
            Role::Player
        };

        let reply = match decode_text(&sender, text, role) {
            Ok(None) => continue,
            Ok(Some(command)) => match handle.execute(command).await {
                Ok(output) => json!({ "ok": output }),
                Err(err) => error_line(&err),
            },
            Err(err) => error_line(&err),
        };
        let mut out = serde_json::to_string(&reply)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    drop(handle);
    let engine = task.await.context("engine task panicked")?;
    tracing::info!(round = engine.state().round.id().0, "Input closed, shutting down");
    Ok(())
}
