//! Slug and label generation for entity names.
//!
//! Handles are URL/CLI-safe slugs derived from directory and file names;
//! labels and titles are title-cased fallbacks used when config does not
//! override them.

use unicode_normalization::UnicodeNormalization;

/// Turn an arbitrary name into a URL/CLI-safe slug.
///
/// Unicode is NFKD-normalized and combining marks are dropped, so
/// `Büttón` slugs to `button`. Runs of non-alphanumeric characters
/// collapse into a single `-`; leading and trailing dashes are trimmed.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.nfkd() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if !unicode_normalization::char::is_combining_mark(ch) {
            pending_dash = true;
        }
    }
    slug
}

/// Title-case a name for display: `my-button_group` becomes `My Button Group`.
pub fn titlize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, word) in input
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Pick a handle unique within `taken`, appending `-2`, `-3`, … in
/// first-seen order when the base handle is already claimed.
pub fn unique_handle(base: &str, taken: &mut std::collections::HashSet<String>) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
