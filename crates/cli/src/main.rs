use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use shelf_content::ContentStore;
use shelf_kernel::settings::Settings;

const DEFAULT_ENV: &str = "local";

/// Validate, inspect, and serve shelf content collections
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    /// Directory holding base.toml and the per-environment overlays
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Content root, overriding `content.root`
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log at the configured level instead of warnings only
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load every collection and report all schema violations
    Check,
    /// List the entries of a collection
    List {
        collection: String,
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one entry as JSON
    Show { collection: String, slug: String },
    /// Print the JSON Schema of a collection
    Schema { collection: String },
    /// Run the HTTP server
    Serve,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli)?;

    if matches!(cli.command, Command::Serve) {
        shelf_telemetry::init(&settings.telemetry);
    } else {
        let mut telemetry = settings.telemetry.clone();
        if !cli.verbose {
            telemetry.level = "warn".to_string();
        }
        shelf_telemetry::init_stderr(&telemetry);
    }

    match cli.command {
        Command::Check => {
            settings.content.strict = true;
            check(&settings)
        }
        Command::List { collection, json } => {
            let store = shelf_app::load_content(&settings)?;
            let entries = store.entries(&collection)?;
            if json {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else {
                for entry in entries {
                    println!("{}\t{}", entry.slug, entry.id);
                }
            }
            Ok(())
        }
        Command::Show { collection, slug } => {
            let store = shelf_app::load_content(&settings)?;
            let entry = store.entry(&collection, &slug)?;
            println!("{}", serde_json::to_string_pretty(entry)?);
            Ok(())
        }
        Command::Schema { collection } => {
            let collections = shelf_app::modules::collections()?;
            let schema = collections.get(&collection)?.schema().raw();
            println!("{}", serde_json::to_string_pretty(schema)?);
            Ok(())
        }
        Command::Serve => {
            let runtime =
                tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
            runtime.block_on(shelf_app::serve(settings))
        }
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config_dir {
        Some(dir) => {
            let environment =
                std::env::var("SHELF_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
            Settings::load_from(dir, &environment)
        }
        None => Settings::load(),
    }
    .with_context(|| "failed to load shelf settings")?;

    if let Some(root) = &cli.root {
        settings.content.root = root.clone();
    }
    Ok(settings)
}

fn check(settings: &Settings) -> anyhow::Result<()> {
    let store = match shelf_app::load_content(settings) {
        Ok(store) => store,
        Err(err) => {
            let failures: Vec<String> = match err.downcast_ref::<shelf_content::ContentError>() {
                Some(content_err) => content_err
                    .failures()
                    .iter()
                    .map(|failure| failure.to_string())
                    .collect(),
                None => vec![format!("{err:#}")],
            };
            for failure in &failures {
                eprintln!("error: {failure}");
            }
            bail!("{} content problem(s) found", failures.len());
        }
    };

    print_summary(&store);
    Ok(())
}

fn print_summary(store: &ContentStore) {
    for summary in store.summary() {
        println!("{}: {} entries", summary.name, summary.entries);
    }
    println!(
        "ok: {} entries in {} collections are valid",
        store.len(),
        store.registry().len()
    );
}
