use crate::catalog::Catalog;
use crate::chunk::{Chunk, ChunkMetadata, FacetType};
use crate::record::DrugRecord;

/// Turns records into one chunk per present facet.
///
/// Output order follows `FacetType::ALL`; the same record always yields
/// byte-identical chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chunker;

impl Chunker {
    pub fn new() -> Self {
        Self
    }

    pub fn chunk_record(&self, record: &DrugRecord) -> Vec<Chunk> {
        let metadata = ChunkMetadata {
            categories: record.category_tags(),
            symptoms: record.symptom_tags(),
        };

        FacetType::ALL
            .into_iter()
            .filter_map(|facet| {
                let content = Self::render(facet, record)?;
                Some(Chunk::new(
                    record.entry_id.clone(),
                    record.name.clone(),
                    facet,
                    content,
                    metadata.clone(),
                ))
            })
            .collect()
    }

    pub fn chunk_catalog(&self, catalog: &Catalog) -> Vec<Chunk> {
        catalog
            .iter()
            .flat_map(|record| self.chunk_record(record))
            .collect()
    }

    fn render(facet: FacetType, record: &DrugRecord) -> Option<String> {
        let name = &record.name;
        let content = match facet {
            FacetType::Indication => format!("{} digunakan untuk: {}", name, record.indications),
            FacetType::Dose => format!(
                "Dosis {}: Dewasa – {}, Anak – {}",
                name, record.adult_dose, record.pediatric_dose
            ),
            FacetType::Adverse => format!("Efek samping {}: {}", name, record.adverse_effects),
            FacetType::Contraindication => {
                format!("Kontraindikasi {}: {}", name, record.contraindications)
            }
            FacetType::Interaction => format!("Interaksi obat {}: {}", name, record.interactions),
            FacetType::Warning => format!("Peringatan {}: {}", name, record.warning()?),
        };
        Some(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paracetamol() -> DrugRecord {
        Catalog::builtin().unwrap().get("paracetamol").unwrap().clone()
    }

    #[test]
    fn test_one_chunk_per_facet() {
        let chunks = Chunker::new().chunk_record(&paracetamol());

        let facets: Vec<_> = chunks.iter().map(|c| c.facet_type).collect();
        assert_eq!(facets, FacetType::ALL.to_vec());
        assert!(chunks.iter().all(|c| c.content.contains("Paracetamol")));
        assert!(chunks.iter().all(|c| c.entry_id == "paracetamol"));
    }

    #[test]
    fn test_absent_warning_yields_no_chunk() {
        let mut record = paracetamol();
        record.warnings = None;

        let chunks = Chunker::new().chunk_record(&record);
        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.facet_type != FacetType::Warning));
    }

    #[test]
    fn test_dose_chunk_combines_populations() {
        let chunks = Chunker::new().chunk_record(&paracetamol());
        let dose = chunks.iter().find(|c| c.facet_type == FacetType::Dose).unwrap();

        assert!(dose.content.starts_with("Dosis Paracetamol: Dewasa – 500-1000 mg"));
        assert!(dose.content.contains("Anak – 10-15 mg/kgBB"));
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let catalog = Catalog::builtin().unwrap();
        let chunker = Chunker::new();
        assert_eq!(chunker.chunk_catalog(&catalog), chunker.chunk_catalog(&catalog));
        assert_eq!(chunker.chunk_catalog(&catalog).len(), 12);
    }

    #[test]
    fn test_metadata_carries_tags() {
        let chunks = Chunker::new().chunk_record(&paracetamol());
        assert!(chunks[0].metadata.symptoms.contains(&"sakit kepala".to_string()));
        assert!(chunks[0].metadata.categories.contains(&"antipiretik".to_string()));
    }
}
