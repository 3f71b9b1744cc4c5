use crate::error::{IndexError, Result};
use crate::index::Phase;
use crate::persist::IndexStore;
use crate::scoring::{idf, weigh_rows};
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsReport {
    pub terms: usize,
    pub postings: usize,
    /// Terms whose smoothed idf came out at or below zero.
    pub non_positive_idf: usize,
}

/// Phase 2: per term, derive document frequency and idf from `tokens`, then
/// write `postings` rows with `weight = tf × idf`.
///
/// Must only run after every document has committed its `tokens` rows.
pub fn run(store: &IndexStore, vocabulary: &[String], valid_documents: u64) -> Result<StatsReport> {
    if !store.is_complete(Phase::Ingest)? {
        return Err(IndexError::PhaseIncomplete(Phase::Ingest));
    }
    store.begin_phase(Phase::CorpusStats)?;

    let per_term = vocabulary
        .par_iter()
        .map(|term| weigh_term(store, term, valid_documents))
        .collect::<Result<Vec<_>>>()?;

    let report = per_term.into_iter().fold(StatsReport::default(), |mut acc, (rows, term_idf)| {
        acc.terms += 1;
        acc.postings += rows;
        if term_idf <= 0.0 {
            acc.non_positive_idf += 1;
        }
        acc
    });

    store.commit_phase(Phase::CorpusStats)?;
    tracing::info!(
        terms = report.terms,
        postings = report.postings,
        non_positive_idf = report.non_positive_idf,
        valid_documents,
        "corpus statistics committed"
    );
    Ok(report)
}

fn weigh_term(store: &IndexStore, term: &str, valid_documents: u64) -> Result<(usize, f64)> {
    let rows = store.scan_term_rows(term)?;
    let document_frequency = rows.len();
    let term_idf = idf(valid_documents, document_frequency);
    let postings = weigh_rows(rows, term_idf);
    store.insert_weighted_postings(&postings)?;
    tracing::debug!(term, document_frequency, idf = term_idf, "weighted term");
    Ok((postings.len(), term_idf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DocId, Positions, TermRow};

    fn row(term: &str, doc: DocId, tf: f64) -> TermRow {
        TermRow { term: term.into(), doc_id: doc, frequency: 1, tf, positions: Positions::new(vec![0]) }
    }

    #[test]
    fn weights_rows_with_smoothed_idf() {
        let store = IndexStore::temporary().unwrap();
        let (a, b) = (DocId::new(0, 1), DocId::new(0, 2));
        store.insert_term_rows(&[row("rare", a, 2.0), row("common", a, 1.0), row("common", b, 3.0)]).unwrap();
        store.commit_phase(Phase::Ingest).unwrap();

        let vocabulary = store.scan_vocabulary().unwrap();
        let report = run(&store, &vocabulary, 9).unwrap();
        assert_eq!(report, StatsReport { terms: 2, postings: 3, non_positive_idf: 0 });

        let rare = store.scan_postings_for_document(&a).unwrap();
        let rare = rare.iter().find(|p| p.term == "rare").unwrap();
        // log10(9 / 2)
        assert!((rare.weight - 2.0 * (4.5f64).log10()).abs() < 1e-12);
        assert!(store.is_complete(Phase::CorpusStats).unwrap());
    }

    #[test]
    fn rerunning_is_idempotent() {
        let store = IndexStore::temporary().unwrap();
        let d = DocId::new(0, 1);
        store.insert_term_rows(&[row("x", d, 1.0)]).unwrap();
        store.commit_phase(Phase::Ingest).unwrap();
        let vocabulary = vec!["x".to_string()];
        let first = run(&store, &vocabulary, 1).unwrap();
        let second = run(&store, &vocabulary, 1).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.counts().postings, 1);
        // log10(1 / 2) < 0
        assert_eq!(first.non_positive_idf, 1);
    }

    #[test]
    fn refuses_to_run_before_ingest() {
        let store = IndexStore::temporary().unwrap();
        assert!(matches!(run(&store, &[], 0), Err(IndexError::PhaseIncomplete(Phase::Ingest))));
    }
}
