use crate::error::Result;
use crate::index::{DocId, Phase};
use crate::persist::IndexStore;
use crate::tokenizer::normalize_terms;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
}

/// Read-only ranking over the committed `final_postings` relation.
#[derive(Clone)]
pub struct SearchEngine {
    store: IndexStore,
}

impl SearchEngine {
    pub fn new(store: IndexStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Rank documents for a free-text query.
    ///
    /// Each distinct query term contributes its normalized weight to every
    /// document it appears in (a dot product with an all-ones query vector).
    /// Query terms are not stopword-filtered. An index whose final phase has not
    /// committed yields no hits.
    pub fn search(&self, text: &str) -> Result<Vec<SearchHit>> {
        if !self.store.is_complete(Phase::Normalize)? {
            tracing::debug!("search against an uncommitted index");
            return Ok(Vec::new());
        }
        let terms = query_terms(text);
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for term in &terms {
            for posting in self.store.scan_final_postings_for_term(term)? {
                *scores.entry(posting.doc_id).or_insert(0.0) += posting.normalized_weight;
            }
        }
        Ok(rank(scores))
    }
}

/// Distinct normalized terms of a query, normalized the same way as documents.
pub fn query_terms(text: &str) -> BTreeSet<String> {
    normalize_terms(text).into_iter().collect()
}

/// Descending score, ties broken by ascending document id.
pub fn rank(scores: HashMap<DocId, f64>) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = scores.into_iter().map(|(doc_id, score)| SearchHit { doc_id, score }).collect();
    hits.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.doc_id.cmp(&b.doc_id),
        other => other,
    });
    hits
}
