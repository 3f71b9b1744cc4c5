use crate::aggregate::{DocumentTermAggregate, TermAggregate};
use crate::index::{DocId, Positions, TermRow, Tier, WeightedPosting};
use std::collections::BTreeMap;

/// Tiered, log-dampened term frequency:
/// `Σ over observed tiers (log10(count) + 1) × tier weight`.
///
/// Each tier is dampened on its own before weighting, so the same total count
/// spread across tiers scores differently from a single-tier count.
pub fn tiered_tf(tiers: &BTreeMap<Tier, u32>) -> f64 {
    tiers
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(tier, &count)| ((count as f64).log10() + 1.0) * tier.weight())
        .sum()
}

/// Smoothed inverse document frequency: `log10(valid_documents / (df + 1))`.
///
/// Terms in nearly every document get an idf at or below zero; that is expected.
pub fn idf(valid_documents: u64, document_frequency: usize) -> f64 {
    if valid_documents == 0 {
        return 0.0;
    }
    (valid_documents as f64 / (document_frequency as f64 + 1.0)).log10()
}

pub fn score_term(term: &str, doc_id: DocId, agg: &TermAggregate) -> TermRow {
    TermRow {
        term: term.to_string(),
        doc_id,
        frequency: agg.frequency,
        tf: tiered_tf(&agg.tiers),
        positions: Positions::new(agg.positions.clone()),
    }
}

/// Score every term of one document into `tokens` rows, in term order.
pub fn score_document(doc_id: DocId, terms: &DocumentTermAggregate) -> Vec<TermRow> {
    terms.iter().map(|(term, agg)| score_term(term, doc_id, agg)).collect()
}

/// Apply a term's corpus idf to all its `tokens` rows.
pub fn weigh_rows(rows: Vec<TermRow>, idf: f64) -> Vec<WeightedPosting> {
    rows.into_iter()
        .map(|row| WeightedPosting {
            weight: row.tf * idf,
            term: row.term,
            doc_id: row.doc_id,
            frequency: row.frequency,
            tf: row.tf,
            positions: row.positions,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers(entries: &[(Tier, u32)]) -> BTreeMap<Tier, u32> {
        entries.iter().copied().collect()
    }

    #[test]
    fn single_tier_scores() {
        let three_headings = tiered_tf(&tiers(&[(Tier::Heading, 3)]));
        assert!((three_headings - (3f64.log10() + 1.0) * 2.0).abs() < 1e-12);
        assert!((three_headings - 2.954).abs() < 1e-3);
        assert_eq!(tiered_tf(&tiers(&[(Tier::Plain, 1)])), 1.0);
        assert_eq!(tiered_tf(&tiers(&[(Tier::Emphasis, 1)])), 1.5);
    }

    #[test]
    fn tiers_are_dampened_separately() {
        // Same total count (4), different distribution.
        let split = tiered_tf(&tiers(&[(Tier::Plain, 2), (Tier::Heading, 2)]));
        let lumped = tiered_tf(&tiers(&[(Tier::Plain, 4)]));
        let expected_split = (2f64.log10() + 1.0) * 1.0 + (2f64.log10() + 1.0) * 2.0;
        assert!((split - expected_split).abs() < 1e-12);
        assert!((lumped - (4f64.log10() + 1.0)).abs() < 1e-12);
        assert!(split > lumped);
    }

    #[test]
    fn monotonic_within_a_tier() {
        for tier in [Tier::Plain, Tier::Emphasis, Tier::Heading] {
            let mut prev = 0.0;
            for count in 1..50 {
                let tf = tiered_tf(&tiers(&[(tier, count), (Tier::Plain, 3)]));
                assert!(tf >= prev, "tier {tier:?} count {count}");
                prev = tf;
            }
        }
    }

    #[test]
    fn empty_histogram_scores_zero() {
        assert_eq!(tiered_tf(&BTreeMap::new()), 0.0);
        assert_eq!(tiered_tf(&tiers(&[(Tier::Heading, 0)])), 0.0);
    }

    #[test]
    fn idf_is_smoothed() {
        assert_eq!(idf(3, 2), 0.0);
        assert!((idf(100, 9) - 1.0).abs() < 1e-12);
        assert!(idf(3, 5) < 0.0);
        assert_eq!(idf(0, 0), 0.0);
    }

    #[test]
    fn weigh_rows_multiplies_tf_by_idf() {
        let d = DocId::new(1, 2);
        let row = TermRow { term: "cat".into(), doc_id: d, frequency: 2, tf: 1.5, positions: Positions::new(vec![4, 1]) };
        let weighted = weigh_rows(vec![row], 2.0);
        assert_eq!(weighted[0].weight, 3.0);
        assert_eq!(weighted[0].positions.as_slice(), &[1, 4]);
        assert_eq!(weighted[0].doc_id, d);
    }
}
