use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // A word run with an optional clitic ("runner's"); the clitic is dropped below.
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+(?:'\p{L}+)?").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Normalize a single raw token into an index term.
///
/// Returns `None` for tokens that are not purely ASCII-alphabetic.
pub fn normalize_token(token: &str) -> Option<String> {
    let word = token.split('\'').next().unwrap_or(token).to_lowercase();
    if word.is_empty() || !word.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    Some(STEMMER.stem(&word).into_owned())
}

/// Tokenize text into normalized terms in document order.
///
/// NFKC normalization, lower-casing, alphabetic filtering and stemming. Stopwords
/// are not removed here: documents filter them in the aggregator and queries keep them.
/// Documents and queries must both go through this function so their vocabularies line up.
pub fn normalize_terms(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized)
        .filter_map(|m| normalize_token(m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_normalize() {
        let t = normalize_terms("Running, runner's run!");
        assert_eq!(t[0], "run");
        assert!(t.iter().all(|w| !w.contains('\'')));
        assert!(t.contains(&"runner".to_string()));
    }

    #[test]
    fn drops_non_alphabetic_tokens() {
        let t = normalize_terms("abc123 2024 café plain");
        assert_eq!(t, vec!["plain".to_string()]);
    }

    #[test]
    fn keeps_stopwords() {
        let t = normalize_terms("the cat");
        assert_eq!(t, vec!["the".to_string(), "cat".to_string()]);
    }

    #[test]
    fn normalize_token_lowercases() {
        assert_eq!(normalize_token("CATS").as_deref(), Some("cat"));
        assert_eq!(normalize_token("x1"), None);
        assert_eq!(normalize_token(""), None);
    }
}
