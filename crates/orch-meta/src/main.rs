//! `orch-meta` command line: inspect and maintain a metadata directory

use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use orch_meta::{validate_frontmatter, validate_markdown_balance, MetadataStore, StoreConfig};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("orch-meta")
        .version(orch_meta::VERSION)
        .about("Inspect and maintain an orchestration metadata directory")
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Metadata root directory (default: _meta, or the config value)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(Command::new("init").about("Create the directory layout"))
        .subcommand(Command::new("stats").about("Print store statistics as JSON"))
        .subcommand(Command::new("state").about("Print the workflow state as JSON"))
        .subcommand(
            Command::new("logs")
                .about("Print log records, oldest first")
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Only print the last N records"),
                )
                .arg(
                    Arg::new("node")
                        .long("node")
                        .help("Read a node's log instead of the orchestrator log"),
                ),
        )
        .subcommand(Command::new("summaries").about("Print cached node summaries as JSON"))
        .subcommand(
            Command::new("cleanup")
                .about("Remove log files older than the retention period")
                .arg(
                    Arg::new("days")
                        .long("days")
                        .value_parser(value_parser!(u64))
                        .help("Maximum age in days (default: config retention)"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a markdown file's frontmatter and code fences")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<StoreConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => StoreConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => StoreConfig::new(),
    };
    if let Some(root) = matches.get_one::<PathBuf>("root") {
        config = config.with_root(root.clone());
    }
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    if let Some(("validate", args)) = matches.subcommand() {
        let Some(file) = args.get_one::<PathBuf>("file") else {
            anyhow::bail!("missing file argument");
        };
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?;
        let frontmatter = validate_frontmatter(&text);
        let fences = validate_markdown_balance(&text);

        println!("frontmatter: {}", if frontmatter { "ok" } else { "invalid" });
        println!("code fences: {}", if fences { "balanced" } else { "unbalanced" });
        std::process::exit(if frontmatter && fences { 0 } else { 1 });
    }

    let config = load_config(&matches)?;
    let retention = config.log_retention_days;
    let store = MetadataStore::with_config(config)
        .context("opening metadata store")?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Metadata store ready at {}", store.root().display());
        }
        Some(("stats", _)) => print_json(&store.stats()?)?,
        Some(("state", _)) => print_json(&store.load_state()?)?,
        Some(("logs", args)) => {
            let limit = args.get_one::<usize>("limit").copied();
            let records = match args.get_one::<String>("node") {
                Some(node_id) => store.read_node_log(node_id, limit)?,
                None => store.read_logs(limit)?,
            };
            for record in records {
                println!("{record}");
            }
        }
        Some(("summaries", _)) => print_json(&store.list_summaries()?)?,
        Some(("cleanup", args)) => {
            let days = args.get_one::<u64>("days").copied().unwrap_or(retention);
            let removed = store.cleanup_old_logs(days)?;
            println!("Removed {removed} log file(s)");
        }
        _ => {
            println!("Metadata store at {}", store.root().display());
            println!("Stats:");
            print_json(&store.stats()?)?;
            println!();
            println!("State:");
            print_json(&store.load_state()?)?;
        }
    }

    Ok(())
}
