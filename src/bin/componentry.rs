//! Componentry CLI Binary
//!
//! Command-line interface over the compiler: list the entity graph, show a
//! single entity's JSON projection, print a variant's resolved context, or
//! watch the source directory and rebuild on change.

use anyhow::{anyhow, Context as _};
use clap::{Parser, Subcommand};
use componentry::compiler::Found;
use componentry::config::CompilerConfig;
use componentry::entities::Item;
use componentry::fs::DiskReader;
use componentry::logging::{init_logging, LoggingConfig};
use componentry::watch::{SourceWatcher, WatchConfig};
use componentry::{Collection, Compiler};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "componentry", version, about = "Component library compiler")]
struct Cli {
    /// Workspace root containing componentry.toml
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    /// Override the component source directory
    #[arg(long)]
    source: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the compiled entity graph
    Ls,
    /// Print one entity's JSON projection
    Show {
        /// `@handle[:variant]` or a slash path
        handle: String,
    },
    /// Print a variant's fully resolved context
    Context {
        /// `@handle[:variant]` or `@handle` for the default variant
        handle: String,
    },
    /// Watch the source directory and rebuild on change
    Watch,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&LoggingConfig {
        level: cli.log_level.clone(),
        ..LoggingConfig::default()
    })
    .context("failed to initialize logging")?;

    let mut config = CompilerConfig::load(&cli.workspace)
        .context("failed to load compiler configuration")?;
    if let Some(source) = cli.source {
        config.source = source;
    }
    if config.source.is_relative() {
        config.source = cli.workspace.join(&config.source);
    }

    let reader = Arc::new(DiskReader::new(config.matchers()));
    let compiler = Arc::new(Compiler::new(config, reader));

    match cli.command {
        Commands::Ls => {
            let graph = compiler.parse().await?;
            print_collection(&compiler, &graph, 0);
        }
        Commands::Show { handle } => {
            let found = compiler
                .find(&handle)
                .await?
                .ok_or_else(|| anyhow!("no entity matches '{handle}'"))?;
            let json = match found {
                Found::Collection(c) => c.to_json(),
                Found::Component(c) => c.to_json(),
                Found::Variant(v) => v.to_json(),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Context { handle } => {
            let variant = match compiler
                .find(&handle)
                .await?
                .ok_or_else(|| anyhow!("no entity matches '{handle}'"))?
            {
                Found::Variant(v) => v,
                Found::Component(c) => c.default_variant().clone_variant(),
                Found::Collection(_) => {
                    return Err(anyhow!("'{handle}' is a collection, not a variant"))
                }
            };
            let context = compiler.resolve_context(&variant).await?;
            println!("{}", serde_json::to_string_pretty(&context)?);
            for warning in compiler.resolution_warnings() {
                eprintln!("{} {warning}", "warning:".yellow().bold());
            }
        }
        Commands::Watch => {
            let graph = compiler.parse().await?;
            println!(
                "watching {} ({} components)",
                compiler.config().source.display(),
                graph.components().len()
            );
            let _watcher = SourceWatcher::start(Arc::clone(&compiler), WatchConfig::default())?;
            loop {
                tokio::time::sleep(Duration::from_millis(250)).await;
                if compiler.is_dirty() {
                    let graph = compiler.parse().await?;
                    println!(
                        "{} rebuilt: {} components",
                        "change".cyan(),
                        graph.components().len()
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_collection(compiler: &Compiler, collection: &Collection, depth: usize) {
    let indent = "  ".repeat(depth);
    if depth == 0 {
        println!("{}{}", indent, collection.meta.label.bold());
    }
    for item in collection.items() {
        match item {
            Item::Collection(sub) => {
                println!("{}  {}/", indent, sub.meta.label.bold());
                print_collection(compiler, sub, depth + 1);
            }
            Item::Component(component) => {
                let status = compiler.config().statuses.summary(&component.statuses());
                let variants = component
                    .variants()
                    .iter()
                    .map(|v| v.meta.handle.clone())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "{}  @{} [{}] ({})",
                    indent,
                    component.meta.handle.green(),
                    colorize(&status),
                    variants
                );
            }
        }
    }
}

fn colorize(status: &componentry::config::StatusInfo) -> String {
    match status.color.as_str() {
        "red" => status.label.red().to_string(),
        "yellow" => status.label.yellow().to_string(),
        "green" => status.label.green().to_string(),
        "cyan" => status.label.cyan().to_string(),
        _ => status.label.clone(),
    }
}
