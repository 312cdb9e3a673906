use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::catalog::CatalogError;

pub struct FileReader;

impl FileReader {
    pub async fn read_file(path: &Path) -> Result<String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension {
            "json" => {
                let content = fs::read_to_string(path)
                    .await
                    .map_err(|source| CatalogError::Io {
                        path: path.display().to_string(),
                        source,
                    })?;
                Ok(content)
            }
            _ => anyhow::bail!("Unsupported catalog format: {}", extension),
        }
    }

    /// Read every `.json` file in `dir`, sorted by path so that load order
    /// (and therefore tie-breaking) does not depend on the filesystem.
    pub async fn read_directory(dir: &Path) -> Result<Vec<(String, String)>> {
        let mut files = Vec::new();

        let mut entries = fs::read_dir(dir)
            .await
            .context(format!("Failed to read directory: {:?}", dir))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                let content = Self::read_file(&path).await?;
                let path_str = path.to_string_lossy().to_string();
                files.push((path_str, content));
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }
}
