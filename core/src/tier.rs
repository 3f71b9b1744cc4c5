use crate::index::Tier;

/// Classify an HTML element name into its emphasis tier.
///
/// Pure mapping from tag label to tier; callers decide how tiers nest.
pub fn classify_tag(tag: &str) -> Tier {
    match tag.to_ascii_lowercase().as_str() {
        "title" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Tier::Heading,
        "b" | "strong" | "em" | "i" | "mark" | "meta" => Tier::Emphasis,
        _ => Tier::Plain,
    }
}
