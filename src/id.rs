//! Slug identifiers for td tasks.

use crate::types::ValidationError;
use std::cmp::Ordering;

/// Longest slug derived from a title.
pub const MAX_SLUG_LEN: usize = 60;

/// Turn free text into a slug: lowercase ASCII alphanumerics joined by single hyphens.
/// Returns an empty string when the text has nothing to keep.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        // ASCII only, so byte truncation is safe
        slug.truncate(MAX_SLUG_LEN);
        let trimmed = slug.trim_end_matches('-').len();
        slug.truncate(trimmed);
    }
    slug
}

/// Check that an id is already in slug shape.
pub fn is_valid_slug(id: &str) -> bool {
    !id.is_empty()
        && id.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !id.starts_with('-')
        && !id.ends_with('-')
        && !id.contains("--")
}

/// Pick the base id for a new task: the override if given, otherwise the title's slug.
pub fn base_id(title: &str, id_override: Option<&str>) -> Result<String, ValidationError> {
    match id_override {
        Some(id) if is_valid_slug(id) => Ok(id.to_string()),
        Some(id) => Err(ValidationError::InvalidId(id.to_string())),
        None => {
            let slug = slugify(title);
            if slug.is_empty() {
                Err(ValidationError::EmptySlug(title.to_string()))
            } else {
                Ok(slug)
            }
        }
    }
}

/// First of `base`, `base-2`, `base-3`, ... for which `taken` is false.
pub fn unique_id(base: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2u64..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Order ids so collision suffixes sort numerically: `fix-bug`, `fix-bug-2`, `fix-bug-10`.
pub fn id_order(a: &str, b: &str) -> Ordering {
    suffix_key(a).cmp(&suffix_key(b)).then_with(|| a.cmp(b))
}

/// Split off a numeric `-N` suffix; an id without one counts as suffix 1.
fn suffix_key(id: &str) -> (&str, u64) {
    id.rsplit_once('-')
        .and_then(|(base, tail)| tail.parse::<u64>().ok().map(|n| (base, n)))
        .unwrap_or((id, 1))
}
