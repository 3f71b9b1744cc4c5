use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Corpus document identity: the shard directory plus the file name inside it,
/// rendered as `shard/local` (e.g. `12/305`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DocId {
    pub shard: u32,
    pub local: u32,
}

impl DocId {
    pub fn new(shard: u32, local: u32) -> Self {
        Self { shard, local }
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.shard, self.local)
    }
}

impl FromStr for DocId {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IndexError::InvalidDocId(s.to_string());
        let (shard, local) = s.split_once('/').ok_or_else(invalid)?;
        Ok(Self {
            shard: shard.trim().parse().map_err(|_| invalid())?,
            local: local.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl From<DocId> for String {
    fn from(id: DocId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for DocId {
    type Error = IndexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Emphasis tier of an occurrence, derived from the HTML element it appeared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Plain,
    Emphasis,
    Heading,
}

impl Tier {
    pub fn weight(self) -> f64 {
        match self {
            Tier::Plain => 1.0,
            Tier::Emphasis => 1.5,
            Tier::Heading => 2.0,
        }
    }
}

/// One token as yielded by an extraction adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOccurrence {
    pub term: String,
    /// Document the token is credited to. Anchor text points at the linked document.
    pub target: DocId,
    pub tier: Tier,
}

impl RawOccurrence {
    pub fn new(term: impl Into<String>, target: DocId, tier: Tier) -> Self {
        Self { term: term.into(), target, tier }
    }
}

/// Ordered 0-based token positions, persisted as space-delimited integers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Positions(Vec<u32>);

impl Positions {
    pub fn new(mut positions: Vec<u32>) -> Self {
        positions.sort_unstable();
        Self(positions)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Positions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.0.iter();
        if let Some(first) = iter.next() {
            write!(f, "{first}")?;
            for p in iter {
                write!(f, " {p}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Positions {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = s
            .split_whitespace()
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| IndexError::InvalidPositions(s.to_string()))?;
        if parsed.windows(2).any(|w| w[0] > w[1]) {
            return Err(IndexError::InvalidPositions(s.to_string()));
        }
        Ok(Self(parsed))
    }
}

impl From<Positions> for String {
    fn from(p: Positions) -> Self {
        p.to_string()
    }
}

impl TryFrom<String> for Positions {
    type Error = IndexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A row of the `documents` relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocId,
    pub path: String,
}

/// A row of the `tokens` relation: raw per-document statistics for one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRow {
    pub term: String,
    pub doc_id: DocId,
    pub frequency: u32,
    pub tf: f64,
    pub positions: Positions,
}

/// A row of the `postings` relation: tf scaled by the term's corpus idf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPosting {
    pub term: String,
    pub doc_id: DocId,
    pub frequency: u32,
    pub tf: f64,
    pub weight: f64,
    pub positions: Positions,
}

/// A row of the `final_postings` relation, the only one read at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    pub term: String,
    pub doc_id: DocId,
    pub positions: Positions,
    pub normalized_weight: f64,
}

/// Build stages, in the order they must commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Ingest,
    CorpusStats,
    Normalize,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Ingest, Phase::CorpusStats, Phase::Normalize];

    /// Name of the relation this phase writes.
    pub fn relation(self) -> &'static str {
        match self {
            Phase::Ingest => "tokens",
            Phase::CorpusStats => "postings",
            Phase::Normalize => "final_postings",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Ingest => "ingest",
            Phase::CorpusStats => "corpus-stats",
            Phase::Normalize => "normalize",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_parses_and_displays() {
        let id: DocId = "12/305".parse().unwrap();
        assert_eq!(id, DocId::new(12, 305));
        assert_eq!(id.to_string(), "12/305");
        assert!("12".parse::<DocId>().is_err());
        assert!("a/1".parse::<DocId>().is_err());
    }

    #[test]
    fn doc_id_orders_numerically() {
        let a: DocId = "2/9".parse().unwrap();
        let b: DocId = "12/1".parse().unwrap();
        assert!(a < b);
        assert!(DocId::new(0, 2) < DocId::new(0, 10));
    }

    #[test]
    fn positions_round_trip() {
        let p = Positions::new(vec![0, 3, 17, 17, 42]);
        let text = p.to_string();
        assert_eq!(text, "0 3 17 17 42");
        let back: Positions = text.parse().unwrap();
        assert_eq!(back, p);
        assert_eq!(back.as_slice(), &[0, 3, 17, 17, 42]);
    }

    #[test]
    fn empty_positions_format_as_empty_text() {
        let p = Positions::default();
        assert_eq!(p.to_string(), "");
        assert_eq!("".parse::<Positions>().unwrap(), p);
    }

    #[test]
    fn positions_reject_garbage_and_disorder() {
        assert!("1 two 3".parse::<Positions>().is_err());
        assert!("5 1".parse::<Positions>().is_err());
    }

    #[test]
    fn tier_weights() {
        assert_eq!(Tier::Plain.weight(), 1.0);
        assert_eq!(Tier::Emphasis.weight(), 1.5);
        assert_eq!(Tier::Heading.weight(), 2.0);
        assert!(Tier::Heading > Tier::Emphasis && Tier::Emphasis > Tier::Plain);
    }
}
