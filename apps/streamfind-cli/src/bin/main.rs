//! Query front end over the persisted indexes.
//!
//! ```bash
//! streamfind "valorant ranked"
//! streamfind "kai" --strategy lexical_only --json
//! echo "cooking stream" | streamfind      # one query per stdin line
//! ```
use anyhow::Result;
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{error, info};

use streamfind_cli::{format_human, format_json, init_tracing, load_context, load_corpus, IndexPaths};
use streamfind_core::config::Config;
use streamfind_core::RankingStrategy;
use streamfind_hybrid::SearchService;

#[derive(Parser)]
#[command(name = "streamfind", version, about = "Search streamers by keyword and meaning")]
struct Cli {
    /// Query text; when omitted, queries are read from stdin one per line
    query: Option<String>,

    /// lexical_only | semantic_only | latent_semantic | hybrid (default: auto)
    #[arg(short, long)]
    strategy: Option<RankingStrategy>,

    /// Override `search.max_entities`
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Corpus snapshot (defaults to `data.corpus_path`)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Index directory (defaults to `data.index_dir`)
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut settings = Config::load()?.settings()?;
    if let Some(strategy) = cli.strategy { settings.search.strategy = Some(strategy); }
    if let Some(limit) = cli.limit { settings.search.max_entities = limit; }
    settings.validate()?;

    let corpus = load_corpus(&settings, cli.corpus.as_deref())?;
    let paths = cli.index_dir.clone().map_or_else(|| IndexPaths::from_config(&settings), IndexPaths::new);
    let service = SearchService::new(load_context(&settings, corpus, &paths).await?);

    match &cli.query {
        Some(query) => run_query(&service, query, cli.json).await?,
        None => {
            info!("reading queries from stdin");
            for line in std::io::stdin().lock().lines() {
                let line = line?;
                if let Err(e) = run_query(&service, &line, cli.json).await { error!(error = %e, "query failed"); }
            }
        }
    }
    Ok(())
}

async fn run_query(service: &SearchService, query: &str, json: bool) -> Result<()> {
    let results = service.search(query).await;
    let output = if json { format_json(&results)? } else { format_human(query, &results) };
    println!("{output}");
    Ok(())
}
