use ingest::FacetType;

use crate::aggregator::SelectionResult;

const CONTEXT_HEADER: &str = "INFORMASI OBAT YANG RELEVAN:";

/// Renders a selection into the context block handed to the generator.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    facet_order: Vec<FacetType>,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(FacetType::ALL.to_vec())
    }
}

impl ContextAssembler {
    pub fn new(facet_order: Vec<FacetType>) -> Self {
        Self { facet_order }
    }

    /// Facets without retrieved chunks get no section at all.
    pub fn assemble(&self, selection: &SelectionResult) -> String {
        let mut context = String::new();
        context.push_str(CONTEXT_HEADER);
        context.push_str("\n\n");

        for facet in &self.facet_order {
            let Some(chunks) = selection.per_facet_chunks.get(facet) else {
                continue;
            };
            if chunks.is_empty() {
                continue;
            }

            context.push_str(&format!("{}:\n", facet.heading()));
            for scored in chunks {
                context.push_str(&format!("- {}\n", scored.chunk.content));
            }
            context.push('\n');
        }

        let record = &selection.best_record;
        context.push_str("INFORMASI UMUM:\n");
        context.push_str(&format!("- Nama: {}\n", record.name));
        context.push_str(&format!("- Golongan: {}\n", record.class));
        context.push_str(&format!("- Merek dagang: {}\n", record.brand_names));

        context
    }
}
