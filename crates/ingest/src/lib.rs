pub mod catalog;
pub mod chunk;
pub mod chunker;
pub mod reader;
pub mod record;

pub use catalog::{Catalog, CatalogError, LoadReport};
pub use chunk::{Chunk, ChunkMetadata, FacetType};
pub use chunker::Chunker;
pub use reader::FileReader;
pub use record::DrugRecord;

use anyhow::{Context, Result};
use std::path::Path;

/// Load a catalog from a JSON file, or from every JSON file in a directory
/// (merged in path order; later duplicates are rejected).
pub async fn load_catalog(path: &Path) -> Result<(Catalog, LoadReport)> {
    let documents = if path.is_dir() {
        FileReader::read_directory(path).await?
    } else {
        vec![(
            path.to_string_lossy().to_string(),
            FileReader::read_file(path).await?,
        )]
    };

    let mut merged = serde_json::Map::new();
    let mut report = LoadReport::default();

    for (source, content) in documents {
        let entries: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
            .context(format!("Catalog file is not a JSON object: {}", source))?;
        for (id, value) in entries {
            if merged.contains_key(&id) {
                report.rejected.push(CatalogError::DuplicateEntry(id));
                continue;
            }
            merged.insert(id, value);
        }
    }

    let (catalog, file_report) = Catalog::from_json_str(&serde_json::Value::Object(merged).to_string())?;
    report.loaded = file_report.loaded;
    report.rejected.extend(file_report.rejected);

    Ok((catalog, report))
}

/// Chunk every record of the catalog, in catalog order.
pub fn chunk_catalog(catalog: &Catalog) -> Vec<Chunk> {
    Chunker::new().chunk_catalog(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_catalog_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let builtin = Catalog::builtin().unwrap();
        let para = serde_json::to_value(builtin.get("paracetamol").unwrap()).unwrap();
        let amox = serde_json::to_value(builtin.get("amoxicillin").unwrap()).unwrap();

        std::fs::write(
            dir.path().join("a.json"),
            serde_json::json!({ "paracetamol": para }).to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            serde_json::json!({ "amoxicillin": amox, "paracetamol": para }).to_string(),
        )
        .unwrap();

        let (catalog, report) = load_catalog(dir.path()).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(report.loaded, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(chunk_catalog(&catalog).len(), 12);
    }
}
