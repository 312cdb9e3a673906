use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::record::{DrugRecord, RawRecord};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed record '{entry_id}': {reason}")]
    MalformedRecord { entry_id: String, reason: String },

    #[error("duplicate entry id '{0}'")]
    DuplicateEntry(String),

    #[error("catalog must be a JSON object of records: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    pub(crate) fn malformed(entry_id: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            entry_id: entry_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Outcome of a lenient load: how many records made it in and why the rest
/// were turned away.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub rejected: Vec<CatalogError>,
}

/// In-memory mapping of entry IDs to records, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<DrugRecord>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// The bundled two-entry catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        let (catalog, report) = Self::from_json_str(BUILTIN_CATALOG)?;
        if let Some(err) = report.rejected.into_iter().next() {
            return Err(err);
        }
        Ok(catalog)
    }

    /// Strict construction from already-built records. Fails on the first
    /// invalid or duplicate record.
    pub fn from_records(records: impl IntoIterator<Item = DrugRecord>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for record in records {
            catalog.insert(record)?;
        }
        Ok(catalog)
    }

    /// Lenient construction from a JSON object `{ entry_id: record, ... }`.
    ///
    /// Only a document that is not an object fails as a whole; individual
    /// bad records are skipped and listed in the report.
    pub fn from_json_str(json: &str) -> Result<(Self, LoadReport), CatalogError> {
        let entries: Map<String, Value> = serde_json::from_str(json)?;
        let mut catalog = Self::default();
        let mut report = LoadReport::default();

        for (raw_id, value) in entries {
            match catalog.load_entry(&raw_id, value) {
                Ok(()) => report.loaded += 1,
                Err(err) => {
                    warn!(entry_id = %raw_id, error = %err, "Rejected catalog record");
                    report.rejected.push(err);
                }
            }
        }

        info!(
            loaded = report.loaded,
            rejected = report.rejected.len(),
            "Catalog loaded"
        );
        Ok((catalog, report))
    }

    fn load_entry(&mut self, raw_id: &str, value: Value) -> Result<(), CatalogError> {
        let entry_id = raw_id.trim().to_lowercase();
        if entry_id.is_empty() {
            return Err(CatalogError::malformed(raw_id, "entry id is empty"));
        }

        let raw: RawRecord = serde_json::from_value(value)
            .map_err(|e| CatalogError::malformed(&entry_id, e.to_string()))?;
        let record = raw.into_record(&entry_id)?;
        self.insert(record)
    }

    fn insert(&mut self, record: DrugRecord) -> Result<(), CatalogError> {
        record.validate()?;
        if self.by_id.contains_key(&record.entry_id) {
            return Err(CatalogError::DuplicateEntry(record.entry_id));
        }
        self.by_id.insert(record.entry_id.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, entry_id: &str) -> Option<&DrugRecord> {
        self.by_id.get(entry_id).map(|&i| &self.records[i])
    }

    /// Case-insensitive lookup by display name.
    pub fn find_by_name(&self, name: &str) -> Option<&DrugRecord> {
        let needle = name.trim().to_lowercase();
        self.records
            .iter()
            .find(|r| r.name.to_lowercase() == needle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrugRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
