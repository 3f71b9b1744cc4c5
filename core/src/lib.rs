pub mod aggregate;
pub mod bookkeeping;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod index;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod scoring;
pub mod search;
pub mod stats;
pub mod stopwords;
pub mod tier;
pub mod tokenizer;

pub use error::{IndexError, Result};
pub use index::{DocId, DocumentRecord, NormalizedPosting, Phase, Positions, RawOccurrence, TermRow, Tier, WeightedPosting};
pub use persist::{IndexMeta, IndexStore, RelationCounts};
pub use pipeline::{build_index, build_into, BuildReport, IngestReport, Pipeline};
pub use search::{SearchEngine, SearchHit};
