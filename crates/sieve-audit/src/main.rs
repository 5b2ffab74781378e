//! sieve CLI - audit an object store and a search index.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use console::style;
use serde_json::Value;
use sieve_audit::config::{self, AnyStore, StoreSettings};
use sieve_audit::enumerate::{self, DownloadOutcome};
use sieve_audit::metadata::{extract_lines, LineOutcome};
use sieve_audit::partition;
use sieve_audit::scroll::{self, ScrollOptions};
use sieve_audit::timing::{measure, measure_blocking};
use sieve_core::{content_hash, Result, SieveError};
use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: i32 = 1;
const EXIT_CONFIG: i32 = 230;
const EXIT_DIR_EXISTS: i32 = 254;
const EXIT_USAGE: i32 = 255;

/// Audit an object store and a search index.
///
/// Lists every object under a prefix, drains search scrolls into sorted
/// content hashes, and splits workloads into rounds.
#[derive(Parser, Debug)]
#[command(name = "sieve")]
#[command(version, long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every key under a prefix
    List {
        bucket: String,
        prefix: String,
    },
    /// Check whether any key starts with KEY
    Exists {
        bucket: String,
        key: String,
    },
    /// Download one object if it exists
    Download {
        bucket: String,
        key: String,
        dest: PathBuf,
    },
    /// Mirror every object under a prefix into a new directory
    Fetch {
        bucket: String,
        prefix: String,
        dir: PathBuf,
    },
    /// Print the sorted HASH of every hit matching a query
    Hashes {
        index: String,
        /// Query clause as JSON, e.g. '{"match_all":{}}'
        query: String,
        /// Hits per scroll page
        #[arg(long, default_value_t = scroll::DEFAULT_PAGE_SIZE)]
        page_size: usize,
        /// Scroll keep-alive
        #[arg(long, default_value = scroll::DEFAULT_KEEP_ALIVE)]
        keep_alive: String,
    },
    /// Print the normalized content hash of TEXT
    Hash {
        text: String,
    },
    /// Extract fields from a JSON-lines file of records
    Extract {
        file: PathBuf,
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Print the per-round assignment for TOTAL items over WORKERS
    Plan {
        total: usize,
        workers: usize,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("sieve_audit=debug,sieve_core=debug,warn")
        } else {
            EnvFilter::new("sieve_audit=info,sieve_core=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn connect_store() -> Result<AnyStore> {
    AnyStore::connect(StoreSettings::from_env()?)
}

fn print_lines<I, T>(lines: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

async fn run_list(bucket: String, prefix: String) -> Result<()> {
    let store = connect_store()?;
    let keys = measure("list", enumerate::enumerate(&store, &bucket, &prefix)).await?;
    print_lines(keys)
}

async fn run_exists(bucket: String, key: String) -> Result<()> {
    let store = connect_store()?;
    let found = measure("exists", enumerate::exists(&store, &bucket, &key)).await?;
    println!("{}", found);
    Ok(())
}

async fn run_download(bucket: String, key: String, dest: PathBuf) -> Result<()> {
    let store = connect_store()?;
    let outcome = enumerate::download(&store, &bucket, &key, &dest).await?;
    match outcome {
        DownloadOutcome::Downloaded => println!("downloaded {}", dest.display()),
        DownloadOutcome::Missing => println!("missing {}", key),
    }
    Ok(())
}

async fn run_fetch(bucket: String, prefix: String, dir: PathBuf) -> Result<()> {
    let store = connect_store()?;
    let stats = measure(
        "fetch",
        enumerate::fetch_prefix(&store, &bucket, &prefix, &dir),
    )
    .await?;
    println!(
        "downloaded {} missing {} skipped {}",
        stats.downloaded, stats.missing, stats.skipped
    );
    Ok(())
}

async fn run_hashes(
    index: String,
    query: String,
    page_size: usize,
    keep_alive: String,
) -> Result<()> {
    let query: Value = serde_json::from_str(&query)
        .map_err(|e| SieveError::InvalidArgument(format!("query is not JSON: {}", e)))?;
    let client = config::search_index_from_env()?;
    let options = ScrollOptions {
        page_size,
        keep_alive,
    };
    let hashes = measure(
        "hashes",
        scroll::collect_with(&client, &index, &query, &options),
    )
    .await?;
    print_lines(hashes)
}

fn run_extract(file: PathBuf, fields: Vec<String>) -> Result<()> {
    let reader = BufReader::new(File::open(&file)?);
    let fields: Vec<&str> = fields.iter().map(String::as_str).collect();

    let records = measure_blocking("extract", || -> Result<Vec<String>> {
        let mut records = Vec::new();
        for outcome in extract_lines(reader, &fields) {
            match outcome? {
                LineOutcome::Record(record) => records.push(serde_json::to_string(&record)?),
                LineOutcome::Skipped { line } => {
                    warn!(file = %file.display(), line, "Required field missing, skipping record");
                }
            }
        }
        Ok(records)
    })?;
    print_lines(records)
}

fn run_plan(total: usize, workers: usize) -> Result<()> {
    let plan = partition::plan(total, workers)?;
    print_lines(plan.assignments())
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "sieve", &mut io::stdout());
}

fn exit_code(err: &SieveError) -> i32 {
    match err {
        SieveError::Config(_) => EXIT_CONFIG,
        SieveError::AlreadyExists(_) => EXIT_DIR_EXISTS,
        _ => EXIT_FAILURE,
    }
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(EXIT_USAGE);
        }
    };

    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::List { bucket, prefix } => run_list(bucket, prefix).await,
        Commands::Exists { bucket, key } => run_exists(bucket, key).await,
        Commands::Download { bucket, key, dest } => run_download(bucket, key, dest).await,
        Commands::Fetch {
            bucket,
            prefix,
            dir,
        } => run_fetch(bucket, prefix, dir).await,
        Commands::Hashes {
            index,
            query,
            page_size,
            keep_alive,
        } => run_hashes(index, query, page_size, keep_alive).await,
        Commands::Hash { text } => {
            println!("{}", content_hash(&text));
            Ok(())
        }
        Commands::Extract { file, fields } => run_extract(file, fields),
        Commands::Plan { total, workers } => run_plan(total, workers),
        Commands::Completions { shell } => {
            run_completions(shell);
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("{}", style(format!("Error: {}", e)).red().for_stderr());
        std::process::exit(exit_code(&e));
    }
}
