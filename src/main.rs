//! # facetdex CLI (`fdx`)
//!
//! Operator front end for a SQLite-backed facetdex index.
//!
//! ## Usage
//!
//! ```bash
//! fdx --config ./config/fdx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fdx init` | Create the SQLite database and schema |
//! | `fdx insert <dataset> <location> <title> <body>` | Create a document |
//! | `fdx update <dataset> <location> <title> <body>` | Replace title and body |
//! | `fdx put <dataset> <location> <title> <body>` | Insert or update |
//! | `fdx get <dataset> <location>` | Print a document as JSON |
//! | `fdx delete <dataset> <location>` | Remove a document |
//! | `fdx count <dataset>` | Number of documents in a dataset |
//! | `fdx search <dataset> [query]` | Ranked and/or faceted search |
//!
//! ## Examples
//!
//! ```bash
//! fdx insert recipe honey-soy-chicken "Honey Soy Chicken" "Lots of chicken, honey, and soy!" \
//!     --term ingredient=chicken --term ingredient=honey --term cuisine=asian
//!
//! fdx search recipe chicken --facet ingredient=honey --facet ingredient=soy
//!
//! FDX_LOG=facetdex=trace fdx search recipe
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use facetdex::config;
use facetdex::db;
use facetdex::migrate;
use facetdex::{Engine, FacetFilter, SearchRequest, SqliteStore, Terms};
use facetdex_core::facet::push_term;

/// facetdex CLI: index documents and run ranked, faceted searches.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/fdx.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "fdx",
    about = "facetdex: ranked full-text search with multi-valued facet filtering",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/fdx.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace). Overridden by `FDX_LOG`.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Create a document. Fails if the location already exists in the dataset.
    Insert {
        dataset: String,
        location: String,
        title: String,
        body: String,
        /// Facet term as `field=value`. Repeat for multiple values.
        #[arg(long = "term", value_parser = parse_key_val)]
        terms: Vec<(String, String)>,
    },

    /// Replace the title and body of an existing document.
    ///
    /// Facet terms are left untouched.
    Update {
        dataset: String,
        location: String,
        title: String,
        body: String,
    },

    /// Insert the document if absent, otherwise update its title and body.
    ///
    /// `--term` values are only attached when the document is created.
    Put {
        dataset: String,
        location: String,
        title: String,
        body: String,
        /// Facet term as `field=value`. Repeat for multiple values.
        #[arg(long = "term", value_parser = parse_key_val)]
        terms: Vec<(String, String)>,
    },

    /// Print a document and its terms as JSON (`null` if absent).
    Get { dataset: String, location: String },

    /// Delete a document, its text index entry, and its terms.
    Delete { dataset: String, location: String },

    /// Print the number of documents in a dataset.
    Count { dataset: String },

    /// Search a dataset and print the hits as JSON.
    ///
    /// Without a query every document in the dataset is returned in
    /// insertion order. `--facet` values for the same field are OR'ed;
    /// different fields are AND'ed.
    Search {
        dataset: String,
        /// Free-text query.
        query: Option<String>,
        /// Facet constraint as `field=value`. Repeat for multiple values.
        #[arg(long = "facet", value_parser = parse_key_val)]
        facets: Vec<(String, String)>,
    },
}

/// Parse a `key=value` pair for `--term` and `--facet` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn collect_pairs(pairs: Vec<(String, String)>) -> Terms {
    let mut terms = Terms::new();
    for (field, value) in pairs {
        push_term(&mut terms, field, value);
    }
    terms
}

fn init_tracing(verbose: u8) {
    let filter = if let Ok(env) = std::env::var("FDX_LOG") {
        EnvFilter::new(env)
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    if let Commands::Init = cli.command {
        migrate::run_migrations(&cfg).await?;
        println!("Database initialized successfully.");
        return Ok(());
    }

    let pool = db::connect(&cfg).await?;
    let engine = Engine::new(SqliteStore::new(pool.clone()), cfg.engine_options()).await?;

    let result = run(&engine, cli.command).await;
    pool.close().await;
    result
}

async fn run(engine: &Engine<SqliteStore>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => {}
        Commands::Insert {
            dataset,
            location,
            title,
            body,
            terms,
        } => {
            let id = engine
                .insert(&dataset, &location, &title, &body, &collect_pairs(terms))
                .await?;
            println!("{}", id);
        }
        Commands::Update {
            dataset,
            location,
            title,
            body,
        } => {
            let changed = engine.update(&dataset, &location, &title, &body).await?;
            if !changed {
                anyhow::bail!("no document at {}/{}", dataset, location);
            }
            println!("updated");
        }
        Commands::Put {
            dataset,
            location,
            title,
            body,
            terms,
        } => {
            let id = engine
                .upsert(&dataset, &location, &title, &body, &collect_pairs(terms))
                .await?;
            println!("{}", id);
        }
        Commands::Get { dataset, location } => {
            let doc = engine.get(&dataset, &location).await?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Commands::Delete { dataset, location } => {
            let deleted = engine.delete(&dataset, &location).await?;
            if !deleted {
                anyhow::bail!("no document at {}/{}", dataset, location);
            }
            println!("deleted");
        }
        Commands::Count { dataset } => {
            println!("{}", engine.count(&dataset).await?);
        }
        Commands::Search {
            dataset,
            query,
            facets,
        } => {
            let filter: FacetFilter = collect_pairs(facets);
            let mut req = SearchRequest::new(&dataset).facets(&filter);
            if let Some(q) = query.as_deref() {
                req = req.query(q);
            }
            let hits = engine.search(&req).await?;
            let json = serde_json::to_string_pretty(&hits).context("Failed to encode hits")?;
            println!("{}", json);
        }
    }
    Ok(())
}
