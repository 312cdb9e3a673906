use std::collections::HashSet;

use async_trait::async_trait;
use ingest::{DrugRecord, FacetType};

use crate::error::QueryError;
use crate::generator::Generator;

const CLOSING_NOTE: &str = "Catatan: Informasi ini bersifat umum. Konsultasikan dengan dokter atau apoteker sebelum menggunakan obat.";

/// Facet triggers, checked in this order. Single words must match a whole
/// query token; phrases match anywhere in the lowercased query.
const KEYWORDS: [(FacetType, &[&str]); 5] = [
    (FacetType::Dose, &["dosis", "takaran", "aturan pakai", "berapa"]),
    (FacetType::Adverse, &["efek samping", "side effect"]),
    (FacetType::Contraindication, &["kontraindikasi", "tidak boleh", "larangan"]),
    (FacetType::Interaction, &["interaksi", "bersamaan"]),
    (FacetType::Indication, &["indikasi", "kegunaan", "manfaat", "untuk apa"]),
];

/// Rule-based answer built straight from the selected record.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Facets the question asks about, in keyword-table order.
    pub fn requested_facets(question: &str) -> Vec<FacetType> {
        let lowered = question.to_lowercase();
        let tokens: HashSet<String> = index::tokenize(&lowered);

        KEYWORDS
            .iter()
            .filter(|(_, keywords)| {
                keywords.iter().any(|keyword| {
                    if keyword.contains(' ') {
                        lowered.contains(keyword)
                    } else {
                        tokens.contains(*keyword)
                    }
                })
            })
            .map(|(facet, _)| *facet)
            .collect()
    }

    pub fn compose(&self, question: &str, entry: &DrugRecord) -> String {
        let facets = Self::requested_facets(question);

        let mut lines = Vec::new();
        if facets.is_empty() {
            lines.push(format!("Indikasi: {}", entry.indications));
            lines.push(format!("Dosis dewasa: {}", entry.adult_dose));
            lines.push(format!("Efek samping: {}", entry.adverse_effects));
        } else {
            for facet in facets {
                match facet {
                    FacetType::Dose => {
                        lines.push(format!("Dosis dewasa: {}", entry.adult_dose));
                        lines.push(format!("Dosis anak: {}", entry.pediatric_dose));
                    }
                    FacetType::Adverse => lines.push(format!("Efek samping: {}", entry.adverse_effects)),
                    FacetType::Contraindication => {
                        lines.push(format!("Kontraindikasi: {}", entry.contraindications))
                    }
                    FacetType::Interaction => lines.push(format!("Interaksi obat: {}", entry.interactions)),
                    FacetType::Indication => lines.push(format!("Indikasi: {}", entry.indications)),
                    FacetType::Warning => {}
                }
            }
        }

        let mut answer = format!("Informasi tentang {} ({}):\n\n", entry.name, entry.class);
        answer.push_str(&lines.join("\n"));
        answer.push_str("\n\n");
        if let Some(warning) = entry.warning() {
            answer.push_str(&format!("Peringatan: {}\n\n", warning));
        }
        answer.push_str(CLOSING_NOTE);
        answer
    }
}

#[async_trait]
impl Generator for FallbackGenerator {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn answer(&self, question: &str, _context: &str, entry: &DrugRecord) -> Result<String, QueryError> {
        Ok(self.compose(question, entry))
    }
}
