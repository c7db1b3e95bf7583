use std::sync::LazyLock;

use regex::Regex;

/// HTML/XML tags, stripped before anything else.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Characters never allowed into fulltext blobs or search terms:
/// punctuation, quoting, brackets and control characters.
static FORBIDDEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.\-_=+\[{\]}\\|;:'",<>?/\x00\t\n\r!@#$%^&*()`~]"#).unwrap()
});

/// Normalize text for fulltext content and queries: strip tags, lower-case,
/// trim, drop the forbidden character set.
///
/// Both the indexer (blob construction) and the search side (term
/// filtering) run through here, so a stored keyword and a query for it
/// always normalize identically.
pub fn filter_forbidden(value: &str) -> String {
    let stripped = TAG_PATTERN.replace_all(value, "");
    let lowered = stripped.to_lowercase();

    FORBIDDEN_PATTERN.replace_all(lowered.trim(), "").into_owned()
}

/// Boolean term filter compiled from raw search input.
///
/// Terms come from splitting the input on single spaces and filtering each
/// piece; empty pieces drop out. `AND` requires every term, `OR` any term,
/// as substring containment against the (already filtered) blob content.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    terms: Vec<String>,
    op_and: bool,
}

impl SearchFilter {
    pub fn new(search: &str, op_and: bool) -> Self {
        let terms = search
            .split(' ')
            .map(filter_forbidden)
            .filter(|term| !term.is_empty())
            .collect();

        SearchFilter { terms, op_and }
    }

    /// A filter with no surviving terms matches nothing.
    pub fn matches(&self, content: &str) -> bool {
        if self.terms.is_empty() {
            return false;
        }

        if self.op_and {
            self.terms.iter().all(|term| content.contains(term.as_str()))
        } else {
            self.terms.iter().any(|term| content.contains(term.as_str()))
        }
    }
}
