//! Offline builder: loads the corpus snapshot and writes every index
//! artifact the query binary needs.
use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use streamfind_cli::{init_tracing, load_corpus, IndexPaths};
use streamfind_core::config::Config;
use streamfind_embed::get_default_embedder;
use streamfind_latent::LatentModel;
use streamfind_text::LexicalIndex;
use streamfind_vector::store::{METADATA_FILE, VECTORS_DIR};
use streamfind_vector::VectorIndex;

#[derive(Parser)]
#[command(name = "streamfind-indexer", version, about = "Build lexical, vector and latent indexes from a corpus snapshot")]
struct Cli {
    /// Corpus snapshot (defaults to `data.corpus_path`)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Output directory (defaults to `data.index_dir`)
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Do not embed documents
    #[arg(long)]
    skip_vectors: bool,

    /// Do not build the latent-semantic model
    #[arg(long)]
    skip_latent: bool,

    /// Override `latent.components`
    #[arg(short = 'k', long)]
    components: Option<usize>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut settings = Config::load()?.settings()?;
    if let Some(k) = cli.components { settings.latent.components = k; }
    settings.validate()?;

    let corpus = load_corpus(&settings, cli.corpus.as_deref())?;
    let paths = cli.index_dir.map_or_else(|| IndexPaths::from_config(&settings), IndexPaths::new);
    std::fs::create_dir_all(&paths.root)?;

    let lexical = LexicalIndex::build(&corpus);
    lexical.save(&paths.lexical())?;

    if cli.skip_vectors {
        info!("skipping vector index");
        remove_stale(&paths.root.join(METADATA_FILE))?;
        remove_stale(&paths.root.join(VECTORS_DIR))?;
    } else {
        let embedder = get_default_embedder(&settings.embed)?;
        let index = VectorIndex::build(&corpus, embedder.as_ref(), settings.embed.batch_size)?;
        index.save(paths.vectors()).await?;
    }

    let latent = if cli.skip_latent {
        info!("skipping latent model");
        None
    } else {
        match LatentModel::build(&corpus, &settings.latent) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!(error = %e, "latent model not built; queries will use the hybrid strategy");
                None
            }
        }
    };
    match latent {
        Some(model) => model.save(&paths.latent())?,
        None => remove_stale(&paths.latent())?,
    }

    info!(documents = corpus.len(), entities = corpus.entities().len(), dir = %paths.root.display(), "indexing complete");
    Ok(())
}

/// Artifacts from an earlier build would no longer match this corpus.
fn remove_stale(path: &Path) -> Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else if path.exists() {
        std::fs::remove_file(path)?;
    } else {
        return Ok(());
    }
    info!(path = %path.display(), "removed stale artifact");
    Ok(())
}
