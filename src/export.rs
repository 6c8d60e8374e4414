// JSONL dump and seed for the catalog

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::models::NewProduct;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

/// Outcome of an import run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records created in the catalog.
    pub created: usize,
    /// Lines skipped: malformed JSON or a product name already taken.
    pub skipped: usize,
}

/// Write every catalog record to `path` as one JSON object per line.
///
/// The file is truncated first and held under an exclusive lock while
/// writing, so a concurrent importer never sees a half-written dump.
pub fn export_jsonl(catalog: &Catalog, path: &Path) -> Result<usize> {
    let products = catalog.list_all()?;

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.lock_exclusive()?;

    for product in &products {
        let json = serde_json::to_string(product)?;
        writeln!(file, "{}", json)?;
    }
    file.sync_all()?;

    info!(file = ?path, count = products.len(), "Exported catalog to JSONL");
    Ok(products.len())
}

/// Seed the catalog from a JSONL file, one candidate per line.
///
/// Every record goes through `Catalog::create`, so the name-uniqueness
/// invariant holds for the imported set too. Blank lines are ignored;
/// malformed lines and name collisions are counted as skipped, with a
/// warning, rather than aborting the run. Exported records import cleanly:
/// their id and timestamps are extra fields the candidate simply ignores.
pub fn import_jsonl(catalog: &mut Catalog, path: &Path) -> Result<ImportSummary> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut summary = ImportSummary::default();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let candidate: NewProduct = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse JSON, skipping"
                );
                summary.skipped += 1;
                continue;
            }
        };

        match catalog.create(candidate) {
            Ok(_) => summary.created += 1,
            Err(CatalogError::AlreadyExists { value, .. }) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    name = %value,
                    "Product name already taken, skipping"
                );
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        file = ?path,
        created = summary.created,
        skipped = summary.skipped,
        "Imported catalog from JSONL"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProduct;
    use std::fs;
    use tempfile::TempDir;

    fn candidate(name: &str) -> NewProduct {
        NewProduct {
            product_name: name.to_string(),
            category: "Electronics".to_string(),
            price: 10.0,
            quantity: 1,
            description: None,
        }
    }

    #[test]
    fn test_export_then_import_round_trip() {
        let temp = TempDir::new().unwrap();
        let dump = temp.path().join("catalog.jsonl");

        let mut source = Catalog::in_memory().unwrap();
        source.create(candidate("Laptop")).unwrap();
        source.create(candidate("Phone")).unwrap();

        let exported = export_jsonl(&source, &dump).unwrap();
        assert_eq!(exported, 2);

        let mut target = Catalog::in_memory().unwrap();
        let summary = import_jsonl(&mut target, &dump).unwrap();
        assert_eq!(summary, ImportSummary { created: 2, skipped: 0 });

        let names: Vec<String> = target
            .list_all()
            .unwrap()
            .into_iter()
            .map(|p| p.product_name)
            .collect();
        assert_eq!(names, vec!["Laptop", "Phone"]);
    }

    #[test]
    fn test_import_skips_malformed_lines() {
        let temp = TempDir::new().unwrap();
        let dump = temp.path().join("catalog.jsonl");
        fs::write(
            &dump,
            r#"{"product_name":"Laptop","category":"Electronics","price":10.0,"quantity":1,"description":null}
{malformed json}

{"product_name":"Phone","category":"Electronics","price":10.0,"quantity":1,"description":null}
"#,
        )
        .unwrap();

        let mut catalog = Catalog::in_memory().unwrap();
        let summary = import_jsonl(&mut catalog, &dump).unwrap();
        assert_eq!(summary, ImportSummary { created: 2, skipped: 1 });
    }

    #[test]
    fn test_import_skips_name_collisions() {
        let temp = TempDir::new().unwrap();
        let dump = temp.path().join("catalog.jsonl");

        let mut source = Catalog::in_memory().unwrap();
        source.create(candidate("Laptop")).unwrap();
        export_jsonl(&source, &dump).unwrap();

        let mut target = Catalog::in_memory().unwrap();
        target.create(candidate("LAPTOP")).unwrap();
        let summary = import_jsonl(&mut target, &dump).unwrap();
        assert_eq!(summary, ImportSummary { created: 0, skipped: 1 });
        assert_eq!(target.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_export_truncates_previous_dump() {
        let temp = TempDir::new().unwrap();
        let dump = temp.path().join("catalog.jsonl");
        fs::write(&dump, "stale contents\n").unwrap();

        let catalog = Catalog::in_memory().unwrap();
        let exported = export_jsonl(&catalog, &dump).unwrap();
        assert_eq!(exported, 0);
        assert_eq!(fs::read_to_string(&dump).unwrap(), "");
    }

    #[test]
    fn test_import_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let mut catalog = Catalog::in_memory().unwrap();
        let err = import_jsonl(&mut catalog, &temp.path().join("absent.jsonl")).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
