use crate::aggregate::{Aggregation, PostingAggregator};
use crate::bookkeeping::Bookkeeping;
use crate::config::IndexConfig;
use crate::corpus::{self, CorpusDocument};
use crate::error::Result;
use crate::extract::{Extract, HtmlExtractor};
use crate::index::{DocId, DocumentRecord, Phase};
use crate::normalize::{self, NormalizeReport};
use crate::persist::{IndexMeta, IndexStore};
use crate::scoring::score_document;
use crate::stats::{self, StatsReport};
use crate::stopwords::Stopwords;
use rayon::prelude::*;
use std::path::Path;

pub const INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Documents whose file was extracted successfully.
    pub extracted: usize,
    pub failed: Vec<(DocId, String)>,
    pub valid_documents: u64,
    /// Every surviving term, ascending.
    pub vocabulary: Vec<String>,
    pub term_rows: usize,
    pub occurrences: u64,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub documents: usize,
    pub ingest: IngestReport,
    pub stats: StatsReport,
    pub normalize: NormalizeReport,
}

/// Per-worker phase-1 state, merged at the ingest barrier.
#[derive(Default)]
struct Harvest {
    aggregation: Aggregation,
    failed: Vec<(DocId, String)>,
    extracted: usize,
}

impl Harvest {
    fn merge(mut self, mut other: Harvest) -> Harvest {
        self.aggregation = std::mem::take(&mut self.aggregation).merge(other.aggregation);
        self.failed.append(&mut other.failed);
        self.extracted += other.extracted;
        self
    }
}

/// The barrier-separated build: ingest → corpus statistics → normalization.
///
/// Each stage finishes for the whole corpus and commits before the next starts.
pub struct Pipeline<'a, E: Extract> {
    store: &'a IndexStore,
    extractor: &'a E,
    stopwords: &'a Stopwords,
}

impl<'a, E: Extract> Pipeline<'a, E> {
    pub fn new(store: &'a IndexStore, extractor: &'a E, stopwords: &'a Stopwords) -> Self {
        Self { store, extractor, stopwords }
    }

    /// Rebuild the index from scratch.
    pub fn run(&self, corpus: &[CorpusDocument]) -> Result<BuildReport> {
        self.store.reset()?;
        let records: Vec<DocumentRecord> = corpus
            .iter()
            .map(|d| DocumentRecord { id: d.id, path: d.path.clone() })
            .collect();
        self.store.insert_documents(&records)?;

        let ingest = self.ingest(corpus)?;
        let stats = stats::run(self.store, &ingest.vocabulary, ingest.valid_documents)?;
        let normalize = normalize::run(self.store)?;

        let meta = IndexMeta {
            documents: records.len() as u64,
            valid_documents: ingest.valid_documents,
            vocabulary_size: ingest.vocabulary.len() as u64,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: INDEX_VERSION,
        };
        self.store.save_meta(&meta)?;
        tracing::info!(documents = records.len(), valid_documents = ingest.valid_documents, "index build complete");
        Ok(BuildReport { documents: records.len(), ingest, stats, normalize })
    }

    /// Phase 1: extract, aggregate and score every document, then write `tokens`.
    pub fn ingest(&self, corpus: &[CorpusDocument]) -> Result<IngestReport> {
        self.store.begin_phase(Phase::Ingest)?;
        let aggregator = PostingAggregator::new(self.stopwords);

        let harvest = corpus
            .par_iter()
            .filter_map(|doc| doc.file.as_deref().map(|file| (doc.id, file)))
            .map(|(doc_id, file)| self.harvest(&aggregator, doc_id, file))
            .reduce(Harvest::default, Harvest::merge);

        let Harvest { aggregation, mut failed, extracted } = harvest;
        failed.sort();
        let valid_documents = aggregation.valid_documents();

        let term_rows: usize = aggregation
            .documents
            .par_iter()
            .map(|(doc_id, terms)| {
                let rows = score_document(*doc_id, terms);
                self.store.insert_term_rows(&rows)?;
                Ok(rows.len())
            })
            .collect::<Result<Vec<usize>>>()?
            .into_iter()
            .sum();

        self.store.commit_phase(Phase::Ingest)?;
        let report = IngestReport {
            extracted,
            failed,
            valid_documents,
            vocabulary: aggregation.vocabulary.into_iter().collect(),
            term_rows,
            occurrences: aggregation.processed,
        };
        tracing::info!(
            extracted = report.extracted,
            failed = report.failed.len(),
            valid_documents = report.valid_documents,
            vocabulary = report.vocabulary.len(),
            term_rows = report.term_rows,
            "ingest committed"
        );
        Ok(report)
    }

    fn harvest(&self, aggregator: &PostingAggregator<'_>, doc_id: DocId, file: &Path) -> Harvest {
        match self.extractor.extract(&doc_id, file) {
            Ok(occurrences) => {
                let aggregation = aggregator.aggregate(occurrences);
                tracing::debug!(%doc_id, occurrences = aggregation.processed, "aggregated document");
                Harvest { aggregation, failed: Vec::new(), extracted: 1 }
            }
            Err(err) => {
                tracing::warn!(%doc_id, %err, "skipping document");
                Harvest { failed: vec![(doc_id, err.to_string())], ..Default::default() }
            }
        }
    }
}

/// Load the collaborators named by `config` and build the index into `config.db_path`.
pub fn build_index(config: &IndexConfig) -> Result<BuildReport> {
    let store = IndexStore::open(&config.db_path)?;
    build_into(&store, config)
}

/// Same as [`build_index`] against an already open store.
pub fn build_into(store: &IndexStore, config: &IndexConfig) -> Result<BuildReport> {
    let bookkeeping_path = config.bookkeeping_path();
    let bookkeeping = if bookkeeping_path.exists() {
        Bookkeeping::load(&bookkeeping_path)?
    } else {
        tracing::warn!(path = %bookkeeping_path.display(), "no bookkeeping map, anchor text will be discarded");
        Bookkeeping::default()
    };
    let stopwords = config.stopwords_path.as_deref().map(Stopwords::load).unwrap_or_default();
    let corpus = corpus::discover(&config.corpus_root, &bookkeeping);
    tracing::info!(root = %config.corpus_root.display(), documents = corpus.len(), "discovered corpus");

    let extractor = HtmlExtractor::new(&bookkeeping);
    let pipeline = Pipeline::new(store, &extractor, &stopwords);
    match config.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            pool.install(|| pipeline.run(&corpus))
        }
        None => pipeline.run(&corpus),
    }
}
