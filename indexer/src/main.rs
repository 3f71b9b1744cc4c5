use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use webidx_core::config::IndexConfig;
use webidx_core::{build_index, IndexStore, Phase, SearchEngine};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a tiered TF-IDF index over an HTML corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a WEBPAGES_RAW-style corpus directory
    Build {
        /// Corpus root holding <shard>/<local> files and bookkeeping.json
        #[arg(long)]
        input: String,
        /// Output index database directory
        #[arg(long, default_value = "./index.db")]
        output: String,
        /// Stopword list, one word per line
        #[arg(long, default_value = "stopwords.txt")]
        stopwords: String,
        /// Bookkeeping map (defaults to <input>/bookkeeping.json)
        #[arg(long)]
        bookkeeping: Option<String>,
        /// Worker threads (defaults to one per core)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Rank documents for a query
    Query {
        /// Index database directory
        #[arg(long, default_value = "./index.db")]
        index: String,
        /// Maximum results to print
        #[arg(long, default_value_t = 20)]
        top: usize,
        /// Query text
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print relation sizes and phase status
    Stats {
        #[arg(long, default_value = "./index.db")]
        index: String,
        /// Emit a single JSON object instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stopwords, bookkeeping, threads } => {
            let mut config = IndexConfig::new(&input, &output).with_stopwords(&stopwords);
            config.bookkeeping_path = bookkeeping.map(Into::into);
            config.threads = threads;
            build(&config)
        }
        Commands::Query { index, top, text } => query(&index, &text.join(" "), top),
        Commands::Stats { index, json } => stats(&index, json),
    }
}

fn build(config: &IndexConfig) -> Result<()> {
    if !config.corpus_root.is_dir() {
        bail!("corpus root {} is not a directory", config.corpus_root.display());
    }
    let report = build_index(config)?;
    for (doc_id, reason) in &report.ingest.failed {
        tracing::warn!(%doc_id, %reason, "document skipped");
    }
    tracing::info!(
        documents = report.documents,
        read = report.ingest.extracted,
        valid = report.ingest.valid_documents,
        unique_terms = report.ingest.vocabulary.len(),
        postings = report.normalize.postings,
        zero_magnitude = report.normalize.zero_magnitude,
        "build finished"
    );
    println!(
        "indexed {} documents ({} valid, {} skipped) into {}",
        report.documents,
        report.ingest.valid_documents,
        report.ingest.failed.len(),
        config.db_path.display()
    );
    Ok(())
}

fn query(index: &str, text: &str, top: usize) -> Result<()> {
    let engine = SearchEngine::new(IndexStore::open(index)?);
    let hits = engine.search(text)?;
    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }
    println!("{} results found.", hits.len());
    for (rank, hit) in hits.iter().take(top).enumerate() {
        let path = engine
            .store()
            .document(&hit.doc_id)?
            .map(|d| d.path)
            .unwrap_or_default();
        println!("{:>3}. {:<10} {:.6}  {}", rank + 1, hit.doc_id.to_string(), hit.score, path);
    }
    Ok(())
}

fn stats(index: &str, json: bool) -> Result<()> {
    let store = IndexStore::open(index)?;
    let counts = store.counts();
    if json {
        let mut phases = serde_json::Map::new();
        for phase in Phase::ALL {
            phases.insert(phase.to_string(), store.is_complete(phase)?.into());
        }
        let report = serde_json::json!({
            "relations": counts,
            "phases": phases,
            "meta": store.load_meta()?,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "documents={} tokens={} postings={} final_postings={}",
        counts.documents, counts.tokens, counts.postings, counts.final_postings
    );
    for phase in Phase::ALL {
        let status = if store.is_complete(phase)? { "committed" } else { "missing" };
        println!("phase {phase} ({}): {status}", phase.relation());
    }
    if let Some(meta) = store.load_meta()? {
        println!(
            "valid_documents={} vocabulary={} created_at={} version={}",
            meta.valid_documents, meta.vocabulary_size, meta.created_at, meta.version
        );
    }
    Ok(())
}
