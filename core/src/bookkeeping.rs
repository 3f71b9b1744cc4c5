use crate::error::Result;
use crate::index::DocId;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

/// Document id ↔ URL map loaded from the corpus `bookkeeping.json`.
#[derive(Debug, Clone, Default)]
pub struct Bookkeeping {
    urls: BTreeMap<DocId, String>,
    by_url: HashMap<String, DocId>,
}

impl Bookkeeping {
    /// Load `{"shard/local": "url", ...}`. Entries with malformed ids are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let raw: HashMap<String, String> = serde_json::from_reader(reader)?;
        let mut skipped = 0usize;
        let entries = raw.into_iter().filter_map(|(id, url)| match id.parse::<DocId>() {
            Ok(id) => Some((id, url)),
            Err(_) => {
                skipped += 1;
                None
            }
        });
        let bookkeeping = Self::from_entries(entries.collect::<Vec<_>>());
        if skipped > 0 {
            tracing::warn!(skipped, "bookkeeping entries with malformed document ids ignored");
        }
        tracing::info!(path = %path.display(), entries = bookkeeping.len(), "loaded bookkeeping");
        Ok(bookkeeping)
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (DocId, S)>,
        S: Into<String>,
    {
        let mut bookkeeping = Self::default();
        for (id, url) in entries {
            let url = url.into();
            if let Some(key) = canonical_url(&url) {
                bookkeeping.by_url.insert(key, id);
            }
            bookkeeping.urls.insert(id, url);
        }
        bookkeeping
    }

    pub fn url(&self, id: &DocId) -> Option<&str> {
        self.urls.get(id).map(String::as_str)
    }

    pub fn resolve(&self, url: &str) -> Option<DocId> {
        canonical_url(url).and_then(|key| self.by_url.get(&key).copied())
    }

    /// Resolve an `href` found in document `base` to the document it points at.
    pub fn resolve_link(&self, base: &DocId, href: &str) -> Option<DocId> {
        let base_url = parse_lenient(self.url(base)?)?;
        let target = base_url.join(href.trim()).ok()?;
        if !matches!(target.scheme(), "http" | "https") {
            return None;
        }
        self.by_url.get(&canonical_key(&target)).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&DocId, &str)> + '_ {
        self.urls.iter().map(|(id, url)| (id, url.as_str()))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Canonical lookup key for a URL: host, path and query without scheme,
/// fragment or trailing slash. Bookkeeping URLs usually omit the scheme.
pub fn canonical_url(raw: &str) -> Option<String> {
    parse_lenient(raw).map(|u| canonical_key(&u))
}

fn parse_lenient(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(u) if u.has_host() => Some(u),
        _ => Url::parse(&format!("http://{raw}")).ok(),
    }
}

fn canonical_key(u: &Url) -> String {
    let mut key = String::new();
    key.push_str(u.host_str().unwrap_or_default());
    key.push_str(u.path());
    if let Some(q) = u.query() {
        key.push('?');
        key.push_str(q);
    }
    while key.ends_with('/') {
        key.pop();
    }
    key
}
