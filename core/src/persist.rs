use crate::error::{IndexError, Result};
use crate::index::{DocId, DocumentRecord, NormalizedPosting, Phase, TermRow, WeightedPosting};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

const SEP: u8 = 0;
const META_KEY: &[u8] = b"index_meta";
const COMPLETE: &[u8] = b"complete";

/// Summary written once the whole build has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub documents: u64,
    pub valid_documents: u64,
    pub vocabulary_size: u64,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RelationCounts {
    pub documents: usize,
    pub tokens: usize,
    pub postings: usize,
    pub final_postings: usize,
}

/// The four index relations, each stored in its own sled tree.
///
/// Keys are laid out for prefix scans: `tokens` and `final_postings` by
/// `term\0doc`, `postings` by `doc\0term`, `documents` by doc id.
/// Cloning is cheap and clones share the same database.
#[derive(Clone)]
pub struct IndexStore {
    db: sled::Db,
    documents: sled::Tree,
    tokens: sled::Tree,
    postings: sled::Tree,
    final_postings: sled::Tree,
    meta: sled::Tree,
}

impl IndexStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref())?;
        Self::from_db(db)
    }

    /// In-memory store removed on drop.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        Ok(Self {
            documents: db.open_tree("documents")?,
            tokens: db.open_tree(Phase::Ingest.relation())?,
            postings: db.open_tree(Phase::CorpusStats.relation())?,
            final_postings: db.open_tree(Phase::Normalize.relation())?,
            meta: db.open_tree("meta")?,
            db,
        })
    }

    fn tree(&self, phase: Phase) -> &sled::Tree {
        match phase {
            Phase::Ingest => &self.tokens,
            Phase::CorpusStats => &self.postings,
            Phase::Normalize => &self.final_postings,
        }
    }

    /// Drop every relation and marker.
    pub fn reset(&self) -> Result<()> {
        self.begin_phase(Phase::Ingest)?;
        self.documents.clear()?;
        self.meta.clear()?;
        Ok(())
    }

    // --- phase bookkeeping ---

    /// Clear the phase's relation and everything downstream of it.
    pub fn begin_phase(&self, phase: Phase) -> Result<()> {
        for p in Phase::ALL.into_iter().filter(|p| *p >= phase) {
            self.meta.remove(marker_key(p))?;
            self.tree(p).clear()?;
        }
        self.meta.remove(META_KEY)?;
        Ok(())
    }

    /// Flush the phase's writes and mark it complete. Requires the previous phase.
    pub fn commit_phase(&self, phase: Phase) -> Result<()> {
        if let Some(prev) = Phase::ALL.into_iter().filter(|p| *p < phase).last() {
            if !self.is_complete(prev)? {
                return Err(IndexError::PhaseIncomplete(prev));
            }
        }
        self.db.flush()?;
        self.meta.insert(marker_key(phase), COMPLETE)?;
        self.db.flush()?;
        Ok(())
    }

    pub fn is_complete(&self, phase: Phase) -> Result<bool> {
        Ok(self.meta.get(marker_key(phase))?.is_some())
    }

    pub fn save_meta(&self, meta: &IndexMeta) -> Result<()> {
        self.meta.insert(META_KEY, serde_json::to_vec_pretty(meta)?)?;
        self.db.flush()?;
        Ok(())
    }

    pub fn load_meta(&self) -> Result<Option<IndexMeta>> {
        match self.meta.get(META_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn counts(&self) -> RelationCounts {
        RelationCounts {
            documents: self.documents.len(),
            tokens: self.tokens.len(),
            postings: self.postings.len(),
            final_postings: self.final_postings.len(),
        }
    }

    // --- documents ---

    pub fn insert_document(&self, id: &DocId, path: &str) -> Result<()> {
        let record = DocumentRecord { id: *id, path: path.to_string() };
        self.documents.insert(id.to_string(), bincode::serialize(&record)?)?;
        Ok(())
    }

    pub fn insert_documents(&self, records: &[DocumentRecord]) -> Result<()> {
        let mut batch = sled::Batch::default();
        for record in records {
            batch.insert(record.id.to_string().as_bytes(), bincode::serialize(record)?);
        }
        self.documents.apply_batch(batch)?;
        Ok(())
    }

    pub fn document(&self, id: &DocId) -> Result<Option<DocumentRecord>> {
        self.documents.get(id.to_string())?.map(|v| decode(&v)).transpose()
    }

    pub fn documents(&self) -> Result<Vec<DocumentRecord>> {
        let mut out = self.documents.iter().values().map(|v| decode(&v?)).collect::<Result<Vec<DocumentRecord>>>()?;
        out.sort_by_key(|d| d.id);
        Ok(out)
    }

    // --- bulk inserts, one atomic batch per call ---

    pub fn insert_term_rows(&self, rows: &[TermRow]) -> Result<()> {
        let mut batch = sled::Batch::default();
        for row in rows {
            batch.insert(compound_key(&row.term, &row.doc_id.to_string()), bincode::serialize(row)?);
        }
        self.tokens.apply_batch(batch)?;
        Ok(())
    }

    pub fn insert_weighted_postings(&self, rows: &[WeightedPosting]) -> Result<()> {
        let mut batch = sled::Batch::default();
        for row in rows {
            batch.insert(compound_key(&row.doc_id.to_string(), &row.term), bincode::serialize(row)?);
        }
        self.postings.apply_batch(batch)?;
        Ok(())
    }

    pub fn insert_normalized_postings(&self, rows: &[NormalizedPosting]) -> Result<()> {
        let mut batch = sled::Batch::default();
        for row in rows {
            batch.insert(compound_key(&row.term, &row.doc_id.to_string()), bincode::serialize(row)?);
        }
        self.final_postings.apply_batch(batch)?;
        Ok(())
    }

    // --- scans ---

    /// All `tokens` rows for a term, in document-key order.
    pub fn scan_term_rows(&self, term: &str) -> Result<Vec<TermRow>> {
        scan_prefix(&self.tokens, term)
    }

    /// Distinct terms present in `tokens`, ascending.
    pub fn scan_vocabulary(&self) -> Result<Vec<String>> {
        distinct_leading(&self.tokens)
    }

    /// Distinct document ids present in `postings`.
    pub fn scan_all_distinct_document_ids(&self) -> Result<Vec<DocId>> {
        let mut ids = distinct_leading(&self.postings)?
            .into_iter()
            .map(|s| s.parse::<DocId>())
            .collect::<Result<Vec<_>>>()?;
        ids.sort_unstable();
        Ok(ids)
    }

    pub fn scan_postings_for_document(&self, doc_id: &DocId) -> Result<Vec<WeightedPosting>> {
        scan_prefix(&self.postings, &doc_id.to_string())
    }

    pub fn scan_final_postings_for_term(&self, term: &str) -> Result<Vec<NormalizedPosting>> {
        scan_prefix(&self.final_postings, term)
    }
}

fn marker_key(phase: Phase) -> Vec<u8> {
    format!("phase:{}", phase.relation()).into_bytes()
}

fn compound_key(lead: &str, rest: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(lead.len() + rest.len() + 1);
    key.extend_from_slice(lead.as_bytes());
    key.push(SEP);
    key.extend_from_slice(rest.as_bytes());
    key
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

fn scan_prefix<T: DeserializeOwned>(tree: &sled::Tree, lead: &str) -> Result<Vec<T>> {
    let mut prefix = lead.as_bytes().to_vec();
    prefix.push(SEP);
    tree.scan_prefix(prefix).values().map(|v| decode(&v?)).collect()
}

/// Distinct leading key components. Keys sharing a lead are contiguous.
fn distinct_leading(tree: &sled::Tree) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for key in tree.iter().keys() {
        let key = key?;
        let lead = key.split(|b| *b == SEP).next().unwrap_or_default();
        if out.last().map(|l| l.as_bytes()) != Some(lead) {
            out.push(String::from_utf8_lossy(lead).into_owned());
        }
    }
    Ok(out)
}
