use criterion::{criterion_group, criterion_main, Criterion};
use webidx_core::aggregate::PostingAggregator;
use webidx_core::bookkeeping::Bookkeeping;
use webidx_core::extract::extract_html;
use webidx_core::scoring::score_document;
use webidx_core::stopwords::Stopwords;
use webidx_core::tokenizer::normalize_terms;
use webidx_core::DocId;

const PAGE: &str = r#"<html><head><title>Inverted index construction</title>
<meta name="description" content="Building and querying a weighted inverted index"></head>
<body><h1>Indexing the corpus</h1>
<p>Each document is <b>tokenized</b>, lemmatized and aggregated into postings.
The corpus pass computes document frequencies, then <em>normalization</em> scales
every document vector to unit length before queries are ranked.</p>
<h2>Querying</h2><p>Queries are normalized the same way as documents.</p></body></html>"#;

fn bench_normalize_terms(c: &mut Criterion) {
    c.bench_function("normalize_terms_page", |b| b.iter(|| normalize_terms(PAGE)));
}

fn bench_extract_and_score(c: &mut Criterion) {
    let bookkeeping = Bookkeeping::default();
    let stopwords = Stopwords::from_words(["the", "and", "a", "of", "are", "is", "to"]);
    let doc_id = DocId::new(0, 0);
    c.bench_function("extract_aggregate_score_page", |b| {
        b.iter(|| {
            let occurrences = extract_html(PAGE, doc_id, &bookkeeping);
            let aggregation = PostingAggregator::new(&stopwords).aggregate(occurrences);
            aggregation
                .documents
                .iter()
                .map(|(id, terms)| score_document(*id, terms).len())
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, bench_normalize_terms, bench_extract_and_score);
criterion_main!(benches);
