use crate::tokenizer::normalize_token;
use std::collections::HashSet;
use std::path::Path;

/// Stopword set held in normalized (stemmed) form, the same form the
/// aggregator sees, so "because" filters the term "becaus".
#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    /// Load one stopword per line. A missing or unreadable file yields an empty set.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let stopwords = Self::from_words(text.lines());
                tracing::info!(path = %path.display(), count = stopwords.len(), "loaded stopwords");
                stopwords
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "stopword list not available, continuing without stopwords");
                Self::default()
            }
        }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .filter_map(|w| normalize_token(w.as_ref().trim()))
            .collect();
        Self { words }
    }

    pub fn contains(&self, term: &str) -> bool {
        if term.bytes().any(|b| b.is_ascii_uppercase()) {
            self.words.contains(&term.to_lowercase())
        } else {
            self.words.contains(term)
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn case_insensitive_membership() {
        let sw = Stopwords::from_words(["The", " and ", ""]);
        assert_eq!(sw.len(), 2);
        assert!(sw.contains("the"));
        assert!(sw.contains("THE"));
        assert!(sw.contains("and"));
        assert!(!sw.contains("cat"));
    }

    #[test]
    fn stopwords_match_their_stemmed_terms() {
        let sw = Stopwords::from_words(["because", "very", "only", "once", "before", "ourselves"]);
        for word in ["because", "very", "only", "once", "before", "ourselves"] {
            let term = normalize_token(word).unwrap();
            assert!(sw.contains(&term), "{word} -> {term}");
        }
        assert!(sw.contains("becaus"));
        assert!(!sw.contains("cat"));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sw = Stopwords::load(&dir.path().join("nope.txt"));
        assert!(sw.is_empty());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stopwords.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "a\nthe\n\nof").unwrap();
        let sw = Stopwords::load(&path);
        assert_eq!(sw.len(), 3);
        assert!(sw.contains("of"));
    }
}
