//! Map raw oracle labels onto the taxonomy.
//!
//! Both functions are total: unknown regions fall back to the default region
//! and unknown categories pass through unchanged (an unmapped bucket). Both
//! are fixed points on canonical labels.

use crate::models::BucketKey;
use crate::taxonomy::Taxonomy;

const PREFIX_SEPARATORS: &[&str] = &["\u{2013}", "-"];

/// Canonical region for `raw`, or the taxonomy's default region.
pub fn normalize_region(taxonomy: &Taxonomy, raw: &str) -> String {
    let raw = raw.trim();
    taxonomy
        .regions
        .iter()
        .find(|r| r.eq_ignore_ascii_case(raw))
        .unwrap_or(&taxonomy.default_region)
        .clone()
}

/// Canonical category for `raw`.
///
/// Strips a `"<Region> – "` / `"<Region> - "` prefix, then resolves aliases
/// and spelling variants. Anything unrecognized is returned trimmed but
/// otherwise unchanged.
pub fn normalize_category(taxonomy: &Taxonomy, raw: &str) -> String {
    let label = strip_region_prefix(taxonomy, raw.trim());

    if let Some(canonical) = taxonomy.categories.iter().find(|c| c.as_str() == label) {
        return canonical.clone();
    }
    if let Some(target) = taxonomy.aliases.get(label) {
        return target.clone();
    }
    if let Some(target) = taxonomy
        .aliases
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(label))
        .map(|(_, target)| target)
    {
        return target.clone();
    }
    if let Some(canonical) = taxonomy.categories.iter().find(|c| c.eq_ignore_ascii_case(label)) {
        return canonical.clone();
    }
    label.to_string()
}

/// Strips region prefixes until none is left, so `"Global - Global - X"` is `"X"`.
fn strip_region_prefix<'a>(taxonomy: &Taxonomy, mut label: &'a str) -> &'a str {
    while let Some(rest) = PREFIX_SEPARATORS.iter().find_map(move |sep| {
        let (prefix, rest) = label.split_once(*sep)?;
        let prefix = prefix.trim();
        taxonomy
            .regions
            .iter()
            .any(|r| r.eq_ignore_ascii_case(prefix))
            .then(|| rest.trim())
    }) {
        label = rest;
    }
    label
}

/// Bucket for a pair of raw labels.
pub fn bucket_for(taxonomy: &Taxonomy, region: &str, category: &str) -> BucketKey {
    BucketKey::new(
        normalize_region(taxonomy, region),
        normalize_category(taxonomy, category),
    )
}
