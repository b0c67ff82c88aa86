use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use bookhub_core::{
    Aggregator, BookRecord, BookhubConfig, BookhubError, CachedSearch, DedupStrategy,
    FileSearchCache, LocalMatchPolicy, ProviderPayloads, SearchCache, SignatureBuilder, Source,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "bookhub",
    about = "Merge, deduplicate and rank book search results from several providers",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting BOOKHUB_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a saved provider payload for a query.
    Search {
        /// JSON file with `localResults`, `googleBookResults`,
        /// `openLibraryResults` and `amazonBookResults`.
        payload: PathBuf,
        query: String,
        /// Also collapse records with near-identical titles.
        #[arg(long)]
        fuzzy: bool,
        /// Title similarity threshold for --fuzzy (0.0 - 1.0).
        #[arg(long)]
        threshold: Option<f64>,
        /// Return a local exact title match alone.
        #[arg(long)]
        short_circuit: bool,
        /// Treat ISBN-10 and ISBN-13 spellings of a book as one key.
        #[arg(long)]
        canonical_isbn: bool,
        /// Remember the result for this session token.
        #[arg(long)]
        session: Option<String>,
    },

    /// Show the last cached search for a session.
    Last {
        #[arg(long)]
        session: String,
    },

    /// Print the dedup signature of a single book.
    Signature {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        canonical_isbn: bool,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Print the config file location.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bookhub_core=info,bookhub_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let start = Instant::now();
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("BOOKHUB_JSON").as_deref() == Ok("1");

    let config = BookhubConfig::load()?;
    debug!(path = %BookhubConfig::config_path().display(), "config loaded");

    match cli.command {
        Commands::Search {
            payload,
            query,
            fuzzy,
            threshold,
            short_circuit,
            canonical_isbn,
            session,
        } => {
            let contents = std::fs::read_to_string(&payload)
                .with_context(|| format!("reading {}", payload.display()))?;
            let payloads: ProviderPayloads = serde_json::from_str(&contents)
                .with_context(|| format!("parsing {}", payload.display()))?;

            let mut options = config.to_options();
            if fuzzy || threshold.is_some() {
                options.strategy = DedupStrategy::Fuzzy {
                    threshold: threshold.unwrap_or(config.dedup.title_threshold),
                };
            }
            if short_circuit {
                options.local_match = LocalMatchPolicy::ShortCircuit;
            }
            options.canonical_isbn |= canonical_isbn;

            let aggregation = match Aggregator::new(options).run(&payloads, &query) {
                Ok(aggregation) => aggregation,
                Err(err @ BookhubError::PayloadShape { .. }) => {
                    let dur = start.elapsed().as_millis();
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "error",
                            "error": "payload_shape",
                            "message": err.to_string(),
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else {
                        eprintln!("{err}");
                    }
                    std::process::exit(3);
                }
                Err(err) => return Err(err.into()),
            };

            if let Some(token) = session {
                if config.cache.enabled {
                    let mut cache = FileSearchCache::new(config.cache_path());
                    cache.store(CachedSearch::new(token, query.as_str(), aggregation.records.clone()))?;
                }
            }
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "items": aggregation.records,
                        "total": aggregation.records.len(),
                        "query": query,
                        "resolution": aggregation.resolution,
                        "report": aggregation.report,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if aggregation.records.is_empty() {
                println!("No results for: {query}");
            } else {
                println!("Found {} results:", aggregation.records.len());
                print_records(&aggregation.records);
                if let Some(report) = &aggregation.report {
                    println!(
                        "({} duplicates and {} incomplete entries removed)",
                        report.excluded() - report.invalid,
                        report.invalid
                    );
                }
            }
        }

        Commands::Last { session } => {
            let mut cache = FileSearchCache::new(config.cache_path());
            let cached = cache.load(&session)?;
            let dur = start.elapsed().as_millis();

            match cached {
                Some(entry) => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":entry,"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!(
                            "Last search: {} ({})",
                            entry.query,
                            entry.stored_at.format("%Y-%m-%d %H:%M")
                        );
                        print_records(&entry.records);
                    }
                }
                None => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"error","error":"not_found","message":"No cached search for this session","meta":{"duration_ms":dur}}))?;
                    } else {
                        eprintln!("No cached search for this session.");
                    }
                    std::process::exit(2);
                }
            }
        }

        Commands::Signature {
            title,
            author,
            isbn,
            canonical_isbn,
        } => {
            let mut record = BookRecord::new(Source::Internal, "0")
                .with_title(title)
                .with_author(author);
            if let Some(isbn) = isbn {
                record = record.with_isbn(isbn);
            }
            let signature = SignatureBuilder::new()
                .with_canonical_isbn(canonical_isbn || config.dedup.canonical_isbn)
                .build(&record);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":signature,"meta":{"duration_ms":dur}}))?;
            } else {
                println!("isbn key:   {}", signature.isbn_key);
                println!("base title: {}", signature.semantic.base_title);
                println!("technology: {}", signature.semantic.technology);
                println!("edition:    {}", signature.semantic.edition);
                println!("author:     {}", signature.semantic.author);
            }
        }

        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::List => {
                    let kv = config_key_values(&config);
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":kv,"meta":{"duration_ms":dur}}))?;
                    } else {
                        for (k, v) in &kv {
                            println!("{k} = {v}");
                        }
                    }
                }
                ConfigAction::Path => {
                    let path = BookhubConfig::config_path();
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path,"exists":path.exists()},"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn print_records(records: &[BookRecord]) {
    for record in records {
        println!(
            "  {source:<12} {title:<40}  {author:<25}  {price:>7.2}",
            source = record.source.as_str(),
            title = record.title_str(),
            author = record.author_str(),
            price = record.price,
        );
    }
}

fn config_key_values(config: &BookhubConfig) -> BTreeMap<&'static str, String> {
    let mut map = BTreeMap::new();
    map.insert("dedup.fuzzy", config.dedup.fuzzy.to_string());
    map.insert("dedup.title_threshold", config.dedup.title_threshold.to_string());
    map.insert("dedup.canonical_isbn", config.dedup.canonical_isbn.to_string());
    map.insert(
        "ranking.local_match",
        match config.ranking.local_match {
            LocalMatchPolicy::Merge => "merge",
            LocalMatchPolicy::ShortCircuit => "short_circuit",
        }
        .to_string(),
    );
    map.insert("pricing.estimate", config.pricing.estimate.to_string());
    map.insert("pricing.fixed_price", config.pricing.fixed_price.to_string());
    map.insert("cache.enabled", config.cache.enabled.to_string());
    map.insert("cache.path", config.cache_path().to_string_lossy().to_string());
    map
}
