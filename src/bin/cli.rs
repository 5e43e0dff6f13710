use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use clap::{Parser, Subcommand};
use serde_json::Value;
use topicstore::Store;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base directory; falls back to TOPICSTORE_DATA_DIR, then ./data
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Record file extension
    #[arg(short, long)]
    ext: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    Get { topic: String, id: String },
    Put { topic: String, id: String, value: String },
    Ids { topic: String },
    All { topic: String },
    Values { topic: String },
    Move { topic: String, new_topic: String, #[arg(required = true)] ids: Vec<String> },
    Del { topic: String, #[arg(required = true)] ids: Vec<String> },
    Purge { topic: String, ids: Vec<String> },
    Clean { topic: String },
}

fn open_store(cli: &Cli) -> anyhow::Result<Store> {
    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| env::var_os("TOPICSTORE_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"));
    let data_dir = if data_dir.is_absolute() {
        data_dir
    } else {
        env::current_dir()?.join(data_dir)
    };
    log::debug!("Opening store at {:?}", data_dir);

    let store = Store::new(&data_dir)?;
    Ok(match &cli.ext {
        Some(ext) => store.with_extension(ext)?,
        None => store,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();
    let store = open_store(&cli)?;

    match cli.command {
        Commands::Get { topic, id } => {
            let val = store.get(&topic, &id)?;
            print_json(&val)?;
            if val.is_none() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Put { topic, id, value } => {
            let val: Value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            store.put(&topic, &id, val)?;
            println!("OK");
        }
        Commands::Ids { topic } => print_json(&store.ids(&topic)?)?,
        Commands::All { topic } => print_json(&store.all(&topic)?)?,
        Commands::Values { topic } => print_json(&store.values(&topic)?)?,
        Commands::Move { topic, new_topic, ids } => {
            print_json(&store.move_records(&topic, ids, &new_topic)?)?
        }
        Commands::Del { topic, ids } => print_json(&store.delete(&topic, ids)?)?,
        Commands::Purge { topic, ids } => print_json(&store.purge(&topic, ids)?)?,
        Commands::Clean { topic } => print_json(&store.clean(&topic)?)?,
    }

    Ok(ExitCode::SUCCESS)
}
