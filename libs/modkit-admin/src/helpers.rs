//! Naming and list normalisation helpers.

use std::collections::HashSet;

use crate::query::DefaultSort;

/// Split `PostTag`, `post_tag` or `post-tag` into lowercase words.
fn words(name: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// `PostTag` / `post_tag` -> `post-tag`
#[must_use]
pub fn slugify_class_name(name: &str) -> String {
    words(name).join("-")
}

/// `PostTag` / `post_tag` -> `Post Tag`
#[must_use]
pub fn prettify_class_name(name: &str) -> String {
    words(name)
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `PostTag` -> `post_tag`
#[must_use]
pub fn snake_case(name: &str) -> String {
    words(name).join("_")
}

/// Trim names, drop blanks and duplicates, keep first-seen order.
pub fn normalize_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_owned())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/// Normalise default-sort entries; a field listed twice keeps its first direction.
pub fn normalize_default_sort<I, S>(items: I) -> Vec<DefaultSort>
where
    I: IntoIterator<Item = S>,
    S: Into<DefaultSort>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(Into::into)
        .map(|s| DefaultSort {
            field: s.field.trim().to_owned(),
            descending: s.descending,
        })
        .filter(|s| !s.field.is_empty() && seen.insert(s.field.clone()))
        .collect()
}
