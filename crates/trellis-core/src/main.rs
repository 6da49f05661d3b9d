//! `trellis` command line: one batch per invocation

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use trellis_core::{BatchRunner, CanvasMaterializer, TrellisConfig, CONFIG_FILE};
use trellis_record::FsAccessor;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("trellis")
        .version(trellis_core::VERSION)
        .about("Reconcile entity relationships and lay out the project canvas")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Config file (defaults to ./trellis.toml when present)"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Record directory, overrides the config"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print the batch summary as JSON"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(Command::new("restore").about("Add missing sides of bidirectional relationships"))
        .subcommand(Command::new("reduce").about("Remove transitively redundant edges"))
        .subcommand(Command::new("break-cycles").about("Break dependency cycles"))
        .subcommand(Command::new("migrate").about("Move legacy enables/enabled_by fields"))
        .subcommand(Command::new("layout").about("Compute the layout and write the canvas"))
        .subcommand(Command::new("sync").about("Run every reconcile pass, then the layout"))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<TrellisConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => TrellisConfig::load(path)?,
        None => TrellisConfig::load_or_default(CONFIG_FILE.as_ref())?,
    };
    if let Some(root) = matches.get_one::<PathBuf>("root") {
        config.root = root.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let config = load_config(&matches)?;
    let runner = BatchRunner::new(
        Arc::new(FsAccessor::with_extension(&config.root, config.extension.clone())),
        Arc::new(CanvasMaterializer::new(config.canvas_path()).with_root(&config.root)),
        &config,
    );

    let summary = match matches.subcommand_name() {
        Some("restore") => runner.restore_bidirectional().await,
        Some("reduce") => runner.reduce_transitive().await,
        Some("break-cycles") => runner.break_cycles().await,
        Some("migrate") => runner.migrate_legacy().await,
        Some("layout") => runner.compute_layout().await,
        Some("sync") => runner.sync().await,
        other => anyhow::bail!("unknown command: {other:?}"),
    }
    .with_context(|| format!("batch failed under {}", config.root.display()))?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
        for cycle in &summary.cycles {
            println!("  {cycle}");
        }
        for conflict in &summary.conflicts {
            println!("  conflict: {conflict}");
        }
        for warning in &summary.warnings {
            println!("  warning: {warning}");
        }
        for failure in &summary.write_failures {
            println!("  write failed: {} ({})", failure.key, failure.error);
        }
    }

    std::process::exit(if summary.is_clean() { 0 } else { 1 });
}
