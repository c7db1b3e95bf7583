use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

/// Canonical document identifier shape: hyphenated lower-case UUIDv4.
///
/// Anchored on both ends so a valid identifier embedded in a longer string
/// (a traversal payload, a mangled filename) never passes.
static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$").unwrap()
});

/// Store and index names: word characters only, no path separators.
static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w]+$").unwrap());

/// Generate a fresh document identifier.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Exact-match identifier validation. Must pass before the id is used to
/// resolve any filesystem path.
pub fn validate_id(id: &str) -> bool {
    ID_PATTERN.is_match(id)
}

/// Validate a store or index name.
pub fn valid_key(name: &str) -> bool {
    KEY_PATTERN.is_match(name)
}

/// Extract the document id from a `.ddb`/`.ddi` file path.
///
/// The id is the basename up to the first dot; anything that fails
/// validation yields `None` and the file is ignored by scans.
pub fn id_from_filename(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let id = name.split('.').next()?;

    if validate_id(id) {
        Some(id.to_string())
    } else {
        None
    }
}
