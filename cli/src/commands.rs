//! Subcommand handlers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clause_radar::{ContractRecommender, Document, parse_keywords};
use tracing::info;

use crate::render;

/// Default number of search results.
pub const DEFAULT_TOP_K: usize = 5;

/// Read every file into a [`Document`] named after its file stem.
pub async fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        documents.push(load_document(path).await?);
    }
    Ok(documents)
}

async fn load_document(path: &Path) -> Result<Document> {
    let id = Document::id_from_path(path)
        .with_context(|| format!("cannot derive a contract id from {}", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Document::new(id, bytes))
}

pub async fn index(
    recommender: &ContractRecommender,
    keywords: &str,
    files: &[PathBuf],
) -> Result<()> {
    if files.is_empty() {
        bail!("upload at least one PDF before indexing");
    }
    let keywords = parse_keywords(keywords);
    if keywords.is_empty() {
        bail!("enter at least one keyword or phrase");
    }

    let documents = load_documents(files).await?;
    info!(documents = documents.len(), keywords = keywords.len(), "Indexing contracts");

    let report = recommender
        .index_contracts(&documents, &keywords)
        .await
        .context("indexing failed")?;
    print!("{}", render::index_summary(&report));

    let stats = recommender
        .stats()
        .await
        .context("failed to read index statistics")?;
    println!("Index now holds {} vector(s).", stats.total_vector_count);
    Ok(())
}

pub async fn search(
    recommender: &ContractRecommender,
    query: &str,
    top_k: usize,
    json: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        bail!("enter a keyword or phrase before searching");
    }

    let top_k = recommender
        .clamp_top_k(top_k)
        .await
        .context("failed to read index statistics")?;
    let matches = recommender
        .recommend(query, top_k)
        .await
        .context("search failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else if matches.is_empty() {
        println!("No matches found. Try a different keyword or index more contracts.");
    } else {
        println!("Top {} matches for \u{201c}{}\u{201d}\n", matches.len(), query.trim());
        print!("{}", render::results_table(&matches));
    }
    Ok(())
}

pub async fn stats(recommender: &ContractRecommender) -> Result<()> {
    let stats = recommender
        .stats()
        .await
        .context("failed to read index statistics")?;
    print!("{}", render::stats_summary(&recommender.index().name, &stats));
    Ok(())
}
