use crate::index::{DocId, RawOccurrence, Tier};
use crate::stopwords::Stopwords;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Per-document statistics for one term, before scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermAggregate {
    pub frequency: u32,
    /// 0-based positions in the hosting document's token stream, ascending.
    pub positions: Vec<u32>,
    /// Occurrence count per emphasis tier. Only observed tiers are present.
    pub tiers: BTreeMap<Tier, u32>,
}

impl TermAggregate {
    fn record(&mut self, position: u32, tier: Tier) {
        self.frequency += 1;
        self.positions.push(position);
        *self.tiers.entry(tier).or_insert(0) += 1;
    }

    fn merge(&mut self, other: TermAggregate) {
        self.frequency += other.frequency;
        self.positions.extend(other.positions);
        self.positions.sort_unstable();
        for (tier, count) in other.tiers {
            *self.tiers.entry(tier).or_insert(0) += count;
        }
    }
}

/// Term → aggregate for one target document.
pub type DocumentTermAggregate = BTreeMap<String, TermAggregate>;

/// Output of aggregating one or more documents' occurrence streams.
///
/// Anchor text credits other documents, so one stream can touch several targets.
/// Aggregations from independent workers combine with [`Aggregation::merge`].
#[derive(Debug, Default)]
pub struct Aggregation {
    pub documents: HashMap<DocId, DocumentTermAggregate>,
    pub vocabulary: BTreeSet<String>,
    /// Raw occurrences consumed, stopwords included.
    pub processed: u64,
}

impl Aggregation {
    pub fn merge(mut self, mut other: Aggregation) -> Aggregation {
        if self.documents.len() < other.documents.len() {
            std::mem::swap(&mut self, &mut other);
        }
        for (doc_id, terms) in other.documents {
            let into = self.documents.entry(doc_id).or_default();
            for (term, agg) in terms {
                into.entry(term).or_default().merge(agg);
            }
        }
        if self.vocabulary.len() < other.vocabulary.len() {
            std::mem::swap(&mut self.vocabulary, &mut other.vocabulary);
        }
        self.vocabulary.append(&mut other.vocabulary);
        self.processed += other.processed;
        self
    }

    /// Documents that received at least one surviving occurrence.
    pub fn valid_documents(&self) -> u64 {
        self.documents.values().filter(|terms| !terms.is_empty()).count() as u64
    }
}

/// Folds a document's occurrence stream into per-term aggregates.
pub struct PostingAggregator<'a> {
    stopwords: &'a Stopwords,
}

impl<'a> PostingAggregator<'a> {
    pub fn new(stopwords: &'a Stopwords) -> Self {
        Self { stopwords }
    }

    /// Every occurrence consumes one position, including filtered stopwords, so
    /// positions stay aligned with the original token stream.
    pub fn aggregate<I>(&self, occurrences: I) -> Aggregation
    where
        I: IntoIterator<Item = RawOccurrence>,
    {
        let mut out = Aggregation::default();
        for (position, occ) in occurrences.into_iter().enumerate() {
            out.processed += 1;
            if self.stopwords.contains(&occ.term) {
                continue;
            }
            let terms = out.documents.entry(occ.target).or_default();
            if let Some(agg) = terms.get_mut(&occ.term) {
                agg.record(position as u32, occ.tier);
            } else {
                out.vocabulary.insert(occ.term.clone());
                terms.entry(occ.term).or_default().record(position as u32, occ.tier);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(term: &str, target: DocId, tier: Tier) -> RawOccurrence {
        RawOccurrence::new(term, target, tier)
    }

    #[test]
    fn aggregates_frequency_positions_and_tiers() {
        let d = DocId::new(0, 1);
        let sw = Stopwords::from_words(["the"]);
        let agg = PostingAggregator::new(&sw).aggregate(vec![
            occ("cat", d, Tier::Heading),
            occ("the", d, Tier::Plain),
            occ("cat", d, Tier::Plain),
            occ("dog", d, Tier::Plain),
            occ("cat", d, Tier::Heading),
        ]);
        assert_eq!(agg.processed, 5);
        let terms = &agg.documents[&d];
        assert_eq!(terms.keys().collect::<Vec<_>>(), vec!["cat", "dog"]);
        let cat = &terms["cat"];
        assert_eq!(cat.frequency, 3);
        assert_eq!(cat.positions, vec![0, 2, 4]);
        assert_eq!(cat.tiers[&Tier::Heading], 2);
        assert_eq!(cat.tiers[&Tier::Plain], 1);
        assert!(!cat.tiers.contains_key(&Tier::Emphasis));
        assert_eq!(terms["dog"].positions, vec![3]);
        assert_eq!(agg.vocabulary.iter().collect::<Vec<_>>(), vec!["cat", "dog"]);
    }

    #[test]
    fn stopwords_are_case_insensitive_and_consume_positions() {
        let d = DocId::new(0, 1);
        let sw = Stopwords::from_words(["THE"]);
        let agg = PostingAggregator::new(&sw).aggregate(vec![occ("the", d, Tier::Plain), occ("cat", d, Tier::Plain)]);
        assert_eq!(agg.documents[&d]["cat"].positions, vec![1]);
        assert!(!agg.vocabulary.contains("the"));
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let sw = Stopwords::default();
        let agg = PostingAggregator::new(&sw).aggregate(Vec::new());
        assert!(agg.documents.is_empty());
        assert_eq!(agg.valid_documents(), 0);
    }

    #[test]
    fn stopword_only_document_is_not_valid() {
        let d = DocId::new(0, 1);
        let sw = Stopwords::from_words(["a", "the"]);
        let agg = PostingAggregator::new(&sw).aggregate(vec![occ("a", d, Tier::Plain), occ("the", d, Tier::Heading)]);
        assert_eq!(agg.valid_documents(), 0);
        assert!(agg.vocabulary.is_empty());
    }

    #[test]
    fn merge_combines_forwarded_anchor_text() {
        let host = DocId::new(0, 1);
        let linked = DocId::new(0, 2);
        let sw = Stopwords::default();
        let aggregator = PostingAggregator::new(&sw);
        let a = aggregator.aggregate(vec![occ("fish", host, Tier::Plain), occ("tuna", linked, Tier::Plain)]);
        let b = aggregator.aggregate(vec![occ("tuna", linked, Tier::Heading), occ("salmon", linked, Tier::Plain)]);
        let merged = a.merge(b);
        assert_eq!(merged.processed, 4);
        assert_eq!(merged.valid_documents(), 2);
        let tuna = &merged.documents[&linked]["tuna"];
        assert_eq!(tuna.frequency, 2);
        assert_eq!(tuna.positions, vec![0, 1]);
        assert_eq!(tuna.tiers.len(), 2);
        assert_eq!(merged.vocabulary.len(), 3);
    }
}
