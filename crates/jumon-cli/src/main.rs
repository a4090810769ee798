//! jumon: compose image-generation prompts from a bilingual term taxonomy.
//!
//! Usage:
//!   # Interactive session (default)
//!   jumon
//!
//!   # Browse the taxonomy
//!   jumon list
//!   jumon list ヘアスタイル
//!
//!   # Normalize prompt text into canonical order
//!   jumon import "masterpiece, (night, indoors:1.2)"
//!
//! Logs go to stderr; stdout carries only command output.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use jumon_tree::{SelectionTree, format_tree};
use jumon_types::TermField;
use tracing_subscriber::{EnvFilter, fmt};

use jumon_cli::listing::{describe, format_category, format_overview, search};
use jumon_cli::{JumonConfig, Session};

/// Prompt composer over a bilingual term taxonomy.
#[derive(Parser, Debug)]
#[command(name = "jumon")]
#[command(about = "Compose prompts from a bilingual term taxonomy")]
struct Args {
    /// Config file (default: <config dir>/jumon/config.ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Taxonomy JSON to use instead of the configured or embedded one
    #[arg(short, long)]
    taxonomy: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `jumon_tree=debug`
    #[arg(long)]
    log_level: Option<String>,

    /// Match typed terms against `display` or `output` text first
    #[arg(long, value_parser = parse_term_field)]
    lookup: Option<TermField>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List top-level categories, or the contents of one category
    List { category: Option<String> },
    /// Find terms by display or output text
    Lookup { text: String },
    /// Parse prompt text and print it in canonical order
    Import {
        /// Prompt text (joined with spaces when given as several arguments)
        #[arg(required = true)]
        text: Vec<String>,
        /// Also print the selection tree
        #[arg(long)]
        tree: bool,
        /// Print the selection tree as JSON instead of the prompt
        #[arg(long)]
        json: bool,
    },
    /// Interactive composition session (default)
    Session,
}

fn parse_term_field(s: &str) -> Result<TermField, String> {
    TermField::from_str(s).ok_or_else(|| format!("expected `display` or `output`, got `{s}`"))
}

fn init_tracing(explicit: Option<&str>, configured: Option<&str>) -> Result<()> {
    let filter = match explicit {
        Some(directive) => EnvFilter::try_new(directive)?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(configured.unwrap_or("warn")))?,
    };
    fmt().with_env_filter(filter).with_writer(io::stderr).with_ansi(false).init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = JumonConfig::resolve(args.config.as_deref()).context("loading config")?;
    init_tracing(args.log_level.as_deref(), config.log_level.as_deref())?;

    if let Some(path) = args.taxonomy {
        config.taxonomy = Some(path);
    }
    if let Some(lookup) = args.lookup {
        config.lookup = lookup;
    }
    tracing::debug!(?config, "resolved config");

    let taxonomy = Arc::new(config.load_taxonomy().context("loading taxonomy")?);

    match args.command.unwrap_or(Cmd::Session) {
        Cmd::List { category: None } => {
            for line in format_overview(&taxonomy) {
                println!("{line}");
            }
        }
        Cmd::List { category: Some(name) } => {
            let Some(category) = taxonomy.categories().find(&name) else {
                bail!("no category named `{name}`");
            };
            for line in format_category(category) {
                println!("{line}");
            }
        }
        Cmd::Lookup { text } => {
            let matches = search(&taxonomy, &text);
            if matches.is_empty() {
                bail!("no term matches `{text}`");
            }
            for term in matches {
                println!("{}", describe(&taxonomy, &term));
            }
        }
        Cmd::Import { text, tree: show_tree, json } => {
            let mut tree = SelectionTree::new();
            let report = tree.import_text(&taxonomy, &text.join(" "))?;
            for token in &report.unresolved {
                eprintln!("unresolved: {token}");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&tree.snapshot())?);
            } else {
                println!("{}", tree.to_prompt());
                if show_tree {
                    for line in format_tree(&tree) {
                        println!("{line}");
                    }
                }
            }
        }
        Cmd::Session => {
            tracing::info!(terms = taxonomy.len(), "starting session");
            let mut session = Session::new(taxonomy)
                .with_lookup(config.lookup)
                .with_show_tree(config.show_tree);
            session.run(io::stdin().lock(), io::stdout())?;
        }
    }

    Ok(())
}
