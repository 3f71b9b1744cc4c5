use crate::bookkeeping::Bookkeeping;
use crate::error::{IndexError, Result};
use crate::index::{DocId, RawOccurrence, Tier};
use crate::tier::classify_tag;
use crate::tokenizer::normalize_terms;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use std::path::Path;

/// Source of (term, target document, tier) triples for one corpus document.
pub trait Extract: Sync {
    fn extract(&self, doc_id: &DocId, file: &Path) -> Result<Vec<RawOccurrence>>;
}

const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];
const META_NAMES: [&str; 2] = ["description", "keywords"];

/// Extracts tiered occurrences from raw HTML files.
pub struct HtmlExtractor<'a> {
    bookkeeping: &'a Bookkeeping,
}

impl<'a> HtmlExtractor<'a> {
    pub fn new(bookkeeping: &'a Bookkeeping) -> Self {
        Self { bookkeeping }
    }
}

impl Extract for HtmlExtractor<'_> {
    fn extract(&self, doc_id: &DocId, file: &Path) -> Result<Vec<RawOccurrence>> {
        let html = std::fs::read_to_string(file).map_err(|err| IndexError::UnreadableDocument {
            doc_id: *doc_id,
            reason: err.to_string(),
        })?;
        Ok(extract_html(&html, *doc_id, self.bookkeeping))
    }
}

/// Walk an HTML document and emit its occurrences in document order.
pub fn extract_html(html: &str, doc_id: DocId, bookkeeping: &Bookkeeping) -> Vec<RawOccurrence> {
    let document = Html::parse_document(html);
    let mut walker = Walker { doc_id, bookkeeping, out: Vec::new() };
    walker.visit(document.root_element(), Tier::Plain, Credit::Host);
    walker.out
}

/// Who text inside the current subtree is credited to.
#[derive(Debug, Clone, Copy)]
enum Credit {
    Host,
    Linked(DocId),
    Discard,
}

struct Walker<'a> {
    doc_id: DocId,
    bookkeeping: &'a Bookkeeping,
    out: Vec<RawOccurrence>,
}

impl Walker<'_> {
    fn visit(&mut self, element: ElementRef<'_>, tier: Tier, credit: Credit) {
        let el = element.value();
        let name = el.name();
        if SKIPPED_TAGS.contains(&name) {
            return;
        }
        let tier = tier.max(classify_tag(name));

        if name == "meta" {
            let described = el
                .attr("name")
                .is_some_and(|n| META_NAMES.iter().any(|m| n.eq_ignore_ascii_case(m)));
            if let (true, Some(content)) = (described, el.attr("content")) {
                self.emit(content, tier, credit);
            }
            return;
        }

        let credit = match (name, el.attr("href")) {
            ("a", Some(href)) => match self.bookkeeping.resolve_link(&self.doc_id, href) {
                Some(target) if target == self.doc_id => Credit::Host,
                Some(target) => Credit::Linked(target),
                None => Credit::Discard,
            },
            _ => credit,
        };

        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.emit(text, tier, credit),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.visit(child_el, tier, credit);
                    }
                }
                _ => {}
            }
        }
    }

    fn emit(&mut self, text: &str, tier: Tier, credit: Credit) {
        let target = match credit {
            Credit::Host => self.doc_id,
            Credit::Linked(target) => target,
            Credit::Discard => return,
        };
        self.out
            .extend(normalize_terms(text).into_iter().map(|term| RawOccurrence::new(term, target, tier)));
    }
}
