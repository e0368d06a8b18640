//! corpus-facts CLI: loads annotated corpora into a fact database.
//!
//! Usage:
//!   corpus-facts ingest <FILES>... [--db path] [--fail-fast]
//!   corpus-facts stats [--db path]
//!   corpus-facts derive-id <CORPUS_GUID> <DOCUMENT_GUID>

use clap::{Parser, Subcommand};
use corpus_facts::{
    derive_document_id, BatchConsumer, ConsumerOptions, Corpus, FactStore, OpenStore, SqliteStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "corpus-facts",
    version,
    about = "Extract sentiment occurrence facts from annotated corpora"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process corpus JSON files and persist their facts
    Ingest {
        /// Corpus files, processed in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Path to SQLite database file
        #[arg(long, env = "CORPUS_FACTS_DB")]
        db: Option<PathBuf>,
        /// Stop at the first failing document
        #[arg(long)]
        fail_fast: bool,
    },
    /// Show row counts of the fact database
    Stats {
        /// Path to SQLite database file
        #[arg(long, env = "CORPUS_FACTS_DB")]
        db: Option<PathBuf>,
    },
    /// Print the derived identity of a document
    DeriveId {
        corpus_guid: String,
        document_guid: String,
    },
}

/// Get the default database path (~/.local/share/corpus-facts/corpus-facts.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("corpus-facts").join("corpus-facts.db")
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(db: Option<PathBuf>) -> Result<SqliteStore, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path)
        .map_err(|e| format!("Failed to open database {}: {}", db_path.display(), e))
}

fn cmd_ingest(files: &[PathBuf], db: Option<PathBuf>, fail_fast: bool) -> i32 {
    let store = match open_store(db) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let consumer = BatchConsumer::new(store).with_options(ConsumerOptions { fail_fast });

    let mut failed = 0;
    for path in files {
        let corpus = match Corpus::load(path) {
            Ok(corpus) => corpus,
            Err(e) => {
                eprintln!("Error: cannot load '{}': {}", path.display(), e);
                failed += 1;
                if fail_fast {
                    break;
                }
                continue;
            }
        };
        let report = consumer.consume(&corpus);
        println!(
            "{}: {} processed, {} failed",
            path.display(),
            report.processed.len(),
            report.failed.len()
        );
        failed += report.failed.len();
        if report.aborted {
            break;
        }
    }
    consumer.close();

    if failed == 0 {
        0
    } else {
        1
    }
}

fn cmd_stats(db: Option<PathBuf>) -> i32 {
    let store = match open_store(db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let stats = match store.stats() {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    println!("{:<28}  {:>10}", "TABLE", "ROWS");
    println!("{}", "-".repeat(40));
    for (table, rows) in [
        ("documents", stats.documents),
        ("occurrences", stats.occurrences),
        ("terms", stats.terms),
        ("sentiment_word_occurrences", stats.sentiment_word_occurrences),
        ("block_sentiments", stats.block_sentiments),
    ] {
        println!("{:<28}  {:>10}", table, rows);
    }
    store.close();
    0
}

fn cmd_derive_id(corpus_guid: &str, document_guid: &str) -> i32 {
    let parse = |raw: &str| Uuid::parse_str(raw.trim()).map_err(|e| format!("invalid guid '{}': {}", raw, e));
    match (parse(corpus_guid), parse(document_guid)) {
        (Ok(corpus), Ok(document)) => {
            println!("{}", derive_document_id(corpus, document));
            0
        }
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let code = match cli.command {
        Commands::Ingest { files, db, fail_fast } => cmd_ingest(&files, db, fail_fast),
        Commands::Stats { db } => cmd_stats(db),
        Commands::DeriveId {
            corpus_guid,
            document_guid,
        } => cmd_derive_id(&corpus_guid, &document_guid),
    };
    std::process::exit(code);
}
