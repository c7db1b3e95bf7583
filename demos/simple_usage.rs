/// Complete docstore API walkthrough
///
/// Demonstrates the major store operations:
/// - CRUD (create, read, update, delete)
/// - Fulltext search (AND / OR, lazy iteration)
/// - Exact-match index lookups, counts and distinct values
/// - Force reindex after an out-of-band edit
use serde_json::{Value, json};

use docstore::core::database::Database;
use docstore::core::types::Document;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("docstore - simple usage demo\n");

    // Step 1: Open a database with one store and three indexes
    println!("Step 1: OPEN - Bootstrapping store layout...");
    let root = tempfile::tempdir()?;
    let db = Database::open(
        root.path(),
        &json!({
            "articles": {
                "_fulltext": {"fields": ["title", "body"]},
                "slug": {},
                "tags": {"distinct": true},
            }
        }),
        5,
    )?;
    println!("  Root: {}\n", root.path().display());

    // Step 2: INSERT - Add documents
    println!("Step 2: INSERT - Adding documents...");
    let first = db.create_document(
        "articles",
        &document(json!({
            "title": "Rust Programming",
            "body": "Ownership, borrowing and fearless concurrency.",
            "slug": "rust-programming",
            "tags": ["rust", "systems"],
        })),
    )?;
    db.create_document(
        "articles",
        &document(json!({
            "title": "Database Systems",
            "body": "Storage engines, indexes and query execution.",
            "slug": "database-systems",
            "tags": ["databases", "systems"],
        })),
    )?;
    println!("  Inserted 2 documents, first id: {}\n", first);

    // Step 3: SEARCH - Fulltext and index lookups
    println!("Step 3: SEARCH - Querying documents...");
    let hits = db.get_documents_by_fulltext_search("articles", "indexes query", true, 0, 0)?;
    println!("  'indexes query' (AND): {} hit(s)", hits.len());

    let hits = db.get_documents_by_fulltext_search("articles", "ownership indexes", false, 0, 0)?;
    println!("  'ownership indexes' (OR): {} hit(s)", hits.len());

    // Lazy form: stop after the first hit without scanning the rest.
    let first_hit = db
        .get_documents_by_fulltext_search_iter("articles", "systems", true, 0, 0)?
        .next()
        .transpose()?;
    println!("  first 'systems' hit: {:?}", first_hit.map(|record| record.id));

    let hits = db.get_documents_by_index("articles", "slug", &json!("rust-programming"), 0, 0)?;
    println!("  slug 'rust-programming': {} hit(s)", hits.len());

    let count = db.count_value_by_index("articles", "tags", &json!("systems"), "")?;
    println!("  tag 'systems' count: {}", count);

    let distinct = db.get_distinct_by_index("articles", "tags")?;
    println!("  distinct tags: {}\n", Value::Object(distinct));

    // Step 4: UPDATE - Overwrite a document in place
    println!("Step 4: UPDATE - Updating document...");
    db.update_document_by_id(
        "articles",
        &document(json!({
            "title": "Advanced Rust",
            "body": "Deep dive into lifetimes and unsafe code.",
            "slug": "advanced-rust",
            "tags": ["rust"],
        })),
        &first,
    )?;
    let record = db.get_document_by_id("articles", &first)?;
    println!("  Updated title: {}\n", record.document["title"]);

    // Step 5: DELETE - Remove a document and its index entries
    println!("Step 5: DELETE - Removing document...");
    db.delete_document_by_id("articles", &first)?;
    let count = db.count_value_by_index("articles", "tags", &json!("rust"), "")?;
    println!("  tag 'rust' count after delete: {}\n", count);

    // Step 6: REINDEX - Full table scan, deploy-time tool
    println!("Step 6: REINDEX - Rebuilding all index entries...");
    db.force_reindex("articles")?;
    println!("  Done.");

    Ok(())
}

/// Helper to build a document from a JSON literal
fn document(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}
