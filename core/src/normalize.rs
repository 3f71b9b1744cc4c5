use crate::error::{IndexError, Result};
use crate::index::{NormalizedPosting, Phase, WeightedPosting};
use crate::persist::IndexStore;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub documents: usize,
    pub postings: usize,
    /// Documents whose weight vector was all zeros; stored with zero weights.
    pub zero_magnitude: usize,
}

/// Euclidean length of a document's weight vector.
pub fn magnitude(rows: &[WeightedPosting]) -> f64 {
    rows.iter().map(|r| r.weight * r.weight).sum::<f64>().sqrt()
}

/// Scale a document's postings to unit length.
///
/// A zero (or non-finite) magnitude keeps every row with a normalized weight of 0.
pub fn normalize_document(rows: Vec<WeightedPosting>) -> (Vec<NormalizedPosting>, bool) {
    let norm = magnitude(&rows);
    let degenerate = norm == 0.0 || !norm.is_finite();
    let out = rows
        .into_iter()
        .map(|row| NormalizedPosting {
            normalized_weight: if degenerate { 0.0 } else { row.weight / norm },
            term: row.term,
            doc_id: row.doc_id,
            positions: row.positions,
        })
        .collect();
    (out, degenerate)
}

/// Phase 3: per document, write unit-normalized `final_postings` rows.
pub fn run(store: &IndexStore) -> Result<NormalizeReport> {
    if !store.is_complete(Phase::CorpusStats)? {
        return Err(IndexError::PhaseIncomplete(Phase::CorpusStats));
    }
    store.begin_phase(Phase::Normalize)?;

    let doc_ids = store.scan_all_distinct_document_ids()?;
    let per_doc = doc_ids
        .par_iter()
        .map(|doc_id| {
            let (rows, degenerate) = normalize_document(store.scan_postings_for_document(doc_id)?);
            if degenerate {
                tracing::debug!(%doc_id, "zero-magnitude document, storing zero weights");
            }
            store.insert_normalized_postings(&rows)?;
            Ok((rows.len(), degenerate))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut report = NormalizeReport { documents: per_doc.len(), ..Default::default() };
    for (rows, degenerate) in per_doc {
        report.postings += rows;
        report.zero_magnitude += usize::from(degenerate);
    }

    store.commit_phase(Phase::Normalize)?;
    tracing::info!(
        documents = report.documents,
        postings = report.postings,
        zero_magnitude = report.zero_magnitude,
        "normalized postings committed"
    );
    Ok(report)
}
