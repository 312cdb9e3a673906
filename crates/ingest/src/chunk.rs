use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Semantic aspect of a drug record. Declaration order is the default
/// context priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetType {
    Indication,
    Dose,
    Adverse,
    Contraindication,
    Interaction,
    Warning,
}

impl FacetType {
    pub const ALL: [FacetType; 6] = [
        FacetType::Indication,
        FacetType::Dose,
        FacetType::Adverse,
        FacetType::Contraindication,
        FacetType::Interaction,
        FacetType::Warning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacetType::Indication => "indication",
            FacetType::Dose => "dose",
            FacetType::Adverse => "adverse",
            FacetType::Contraindication => "contraindication",
            FacetType::Interaction => "interaction",
            FacetType::Warning => "warning",
        }
    }

    /// Section heading used when rendering context blocks.
    pub fn heading(&self) -> &'static str {
        match self {
            FacetType::Indication => "INDIKASI",
            FacetType::Dose => "DOSIS",
            FacetType::Adverse => "EFEK SAMPING",
            FacetType::Contraindication => "KONTRAINDIKASI",
            FacetType::Interaction => "INTERAKSI OBAT",
            FacetType::Warning => "PERINGATAN",
        }
    }
}

impl fmt::Display for FacetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FacetType::ALL
            .into_iter()
            .find(|facet| facet.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown facet type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub categories: Vec<String>,
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub entry_id: String,
    pub entry_name: String,
    pub facet_type: FacetType,
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(
        entry_id: String,
        entry_name: String,
        facet_type: FacetType,
        content: String,
        metadata: ChunkMetadata,
    ) -> Self {
        // One chunk per (entry, facet), so that pair is the identity
        let chunk_id = Self::generate_chunk_id(&entry_id, facet_type);

        Self {
            chunk_id,
            entry_id,
            entry_name,
            facet_type,
            content,
            metadata,
        }
    }

    fn generate_chunk_id(entry_id: &str, facet_type: FacetType) -> String {
        let mut hasher = Sha256::new();
        hasher.update(entry_id.as_bytes());
        hasher.update(b":");
        hasher.update(facet_type.as_str().as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16]) // Use first 16 bytes (32 hex chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_round_trips_through_str() {
        for facet in FacetType::ALL {
            assert_eq!(facet.as_str().parse::<FacetType>().unwrap(), facet);
        }
        assert!("dosage".parse::<FacetType>().is_err());
    }

    #[test]
    fn test_chunk_id_is_stable_per_entry_and_facet() {
        let meta = ChunkMetadata { categories: vec![], symptoms: vec![] };
        let a = Chunk::new("x".into(), "X".into(), FacetType::Dose, "one".into(), meta.clone());
        let b = Chunk::new("x".into(), "X".into(), FacetType::Dose, "two".into(), meta.clone());
        let c = Chunk::new("x".into(), "X".into(), FacetType::Adverse, "one".into(), meta);

        assert_eq!(a.chunk_id, b.chunk_id);
        assert_ne!(a.chunk_id, c.chunk_id);
        assert_eq!(a.chunk_id.len(), 32);
    }
}
