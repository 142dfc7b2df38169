use serde::Serialize;
use tracing::{debug, info};

use crate::{
    aggregate::{self, DocumentMatches, MatchReport, RawPageMatches},
    config::SearchConfig,
    error::Result,
    model::Document,
    snippet::Keyword,
    store::DocumentSource,
};

/// One matching document.
///
/// The shape follows the document's body layout: paged documents carry a
/// full [`MatchReport`], raw documents carry per-page snippet lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SearchHit {
    Paged {
        id: u64,
        document_title: Option<String>,
        matches: MatchReport,
        total_matches: usize,
    },
    Raw {
        id: u64,
        document_title: Option<String>,
        pages: Vec<RawPageMatches>,
    },
}

impl SearchHit {
    pub fn id(&self) -> u64 {
        match self {
            Self::Paged { id, .. } | Self::Raw { id, .. } => *id,
        }
    }

    pub fn document_title(&self) -> Option<&str> {
        match self {
            Self::Paged { document_title, .. }
            | Self::Raw { document_title, .. } => document_title.as_deref(),
        }
    }

    /// Number of matches, counting one per raw snippet line.
    pub fn match_count(&self) -> usize {
        match self {
            Self::Paged { total_matches, .. } => *total_matches,
            Self::Raw { pages, .. } => {
                pages.iter().map(|page| page.lines.len()).sum()
            }
        }
    }
}

/// Search every document in `source` for `keyword`.
///
/// The keyword is validated before any document is read. Documents
/// without a single match are left out; the rest keep the source order.
pub fn search(
    source: &impl DocumentSource,
    keyword: &str,
    config: &SearchConfig,
) -> Result<Vec<SearchHit>> {
    let keyword = Keyword::new(keyword)?;
    let documents = source.list_documents()?;
    let hits = search_documents(&documents, &keyword, config);
    info!(
        keyword = keyword.as_str(),
        documents = documents.len(),
        hits = hits.len(),
        "search complete"
    );
    Ok(hits)
}

pub fn search_documents(
    documents: &[Document],
    keyword: &Keyword,
    config: &SearchConfig,
) -> Vec<SearchHit> {
    documents
        .iter()
        .filter_map(|document| {
            debug!(document = document.id, "scanning document");
            let matches = aggregate::aggregate(document, keyword, config);
            (!matches.is_empty()).then(|| into_hit(document, matches))
        })
        .collect()
}

fn into_hit(document: &Document, matches: DocumentMatches) -> SearchHit {
    let id = document.id;
    let document_title = document.title.clone();
    match matches {
        DocumentMatches::Paged(report) => SearchHit::Paged {
            id,
            document_title,
            total_matches: report.total_matches(),
            matches: report,
        },
        DocumentMatches::Raw(pages) => SearchHit::Raw {
            id,
            document_title,
            pages,
        },
    }
}

/// Format results for human-readable terminal output.
pub fn format_human(results: &[SearchHit]) {
    if results.is_empty() {
        println!("No matches found.");
        return;
    }

    for hit in results {
        println!(
            "#{} {} ({} match{})",
            hit.id(),
            hit.document_title().unwrap_or("<untitled>"),
            hit.match_count(),
            if hit.match_count() == 1 { "" } else { "es" }
        );
        match hit {
            SearchHit::Paged { matches, .. } => {
                for title in &matches.title_matches {
                    println!("     title: {}", title.context);
                }
                for page in &matches.page_matches {
                    for m in &page.matches {
                        println!(
                            "     p.{} [{}] {}",
                            page.page_number, m.source, m.context
                        );
                    }
                }
            }
            SearchHit::Raw { pages, .. } => {
                for page in pages {
                    for line in &page.lines {
                        println!("     p.{} {}", page.page_number, line);
                    }
                }
            }
        }
    }
    println!("\n{} document(s)", results.len());
}

/// Format results as JSON output.
pub fn format_json(results: &[SearchHit]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(results)?);
    Ok(())
}
