use crate::bookkeeping::Bookkeeping;
use crate::index::DocId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A corpus member as recorded in the `documents` relation.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusDocument {
    pub id: DocId,
    /// Value stored in `documents.path`: the bookkeeping URL, or the relative file path.
    pub path: String,
    /// Raw HTML file on disk; `None` for bookkeeping entries with no file.
    pub file: Option<PathBuf>,
}

/// Enumerate `<root>/<shard>/<local>` files and merge them with the bookkeeping
/// entries. Returned in ascending document id order.
pub fn discover(root: &Path, bookkeeping: &Bookkeeping) -> Vec<CorpusDocument> {
    let mut documents: BTreeMap<DocId, CorpusDocument> = bookkeeping
        .entries()
        .map(|(id, url)| (*id, CorpusDocument { id: *id, path: url.to_string(), file: None }))
        .collect();

    for entry in WalkDir::new(root).min_depth(2).max_depth(2).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(id) = doc_id_for(root, entry.path()) else {
            tracing::debug!(path = %entry.path().display(), "skipping file outside the shard/local layout");
            continue;
        };
        let file = entry.path().to_path_buf();
        documents
            .entry(id)
            .and_modify(|d| d.file = Some(file.clone()))
            .or_insert_with(|| CorpusDocument { id, path: id.to_string(), file: Some(file) });
    }
    documents.into_values().collect()
}

fn doc_id_for(root: &Path, file: &Path) -> Option<DocId> {
    let rel = file.strip_prefix(root).ok()?;
    let mut parts = rel.iter().map(|c| c.to_str());
    let shard = parts.next()??.parse().ok()?;
    let local = parts.next()??.parse().ok()?;
    Some(DocId::new(shard, local))
}
