use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;

/// A single catalog entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugRecord {
    #[serde(default)]
    pub entry_id: String,
    pub name: String,
    pub class: String,
    pub indications: String,
    pub adult_dose: String,
    pub pediatric_dose: String,
    pub adverse_effects: String,
    pub contraindications: String,
    pub interactions: String,
    pub brand_names: String,
    pub categories: String, // comma-separated tags
    pub symptoms: String,   // comma-separated tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<String>,
}

/// Wire shape of a record before validation. Every field is optional here so
/// that a missing field can be reported by name instead of as a serde error.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawRecord {
    name: Option<String>,
    class: Option<String>,
    indications: Option<String>,
    adult_dose: Option<String>,
    pediatric_dose: Option<String>,
    adverse_effects: Option<String>,
    contraindications: Option<String>,
    interactions: Option<String>,
    brand_names: Option<String>,
    categories: Option<String>,
    symptoms: Option<String>,
    warnings: Option<String>,
}

impl RawRecord {
    pub(crate) fn into_record(self, entry_id: &str) -> Result<DrugRecord, CatalogError> {
        let required = |value: Option<String>, field: &str| -> Result<String, CatalogError> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                Some(_) => Err(CatalogError::malformed(entry_id, format!("field '{}' is blank", field))),
                None => Err(CatalogError::malformed(entry_id, format!("missing field '{}'", field))),
            }
        };

        Ok(DrugRecord {
            entry_id: entry_id.to_string(),
            name: required(self.name, "name")?,
            class: required(self.class, "class")?,
            indications: required(self.indications, "indications")?,
            adult_dose: required(self.adult_dose, "adult_dose")?,
            pediatric_dose: required(self.pediatric_dose, "pediatric_dose")?,
            adverse_effects: required(self.adverse_effects, "adverse_effects")?,
            contraindications: required(self.contraindications, "contraindications")?,
            interactions: required(self.interactions, "interactions")?,
            brand_names: required(self.brand_names, "brand_names")?,
            categories: required(self.categories, "categories")?,
            symptoms: required(self.symptoms, "symptoms")?,
            warnings: self
                .warnings
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty()),
        })
    }
}

impl DrugRecord {
    /// Check the invariants a hand-built record must satisfy before it can
    /// enter a catalog.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let id = self.entry_id.as_str();
        if id.trim().is_empty() {
            return Err(CatalogError::malformed(id, "entry id is empty"));
        }
        if id != id.trim().to_lowercase() {
            return Err(CatalogError::malformed(id, "entry id must be lowercase"));
        }

        let required = [
            ("name", &self.name),
            ("class", &self.class),
            ("indications", &self.indications),
            ("adult_dose", &self.adult_dose),
            ("pediatric_dose", &self.pediatric_dose),
            ("adverse_effects", &self.adverse_effects),
            ("contraindications", &self.contraindications),
            ("interactions", &self.interactions),
            ("brand_names", &self.brand_names),
            ("categories", &self.categories),
            ("symptoms", &self.symptoms),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CatalogError::malformed(id, format!("field '{}' is blank", field)));
            }
        }

        Ok(())
    }

    pub fn category_tags(&self) -> Vec<String> {
        split_tags(&self.categories)
    }

    pub fn symptom_tags(&self) -> Vec<String> {
        split_tags(&self.symptoms)
    }

    /// Warning text, if the record carries a non-blank one.
    pub fn warning(&self) -> Option<&str> {
        self.warnings
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_paracetamol() -> RawRecord {
        serde_json::from_value(serde_json::json!({
            "name": "Paracetamol",
            "class": "Analgesik",
            "indications": "demam",
            "adult_dose": "500 mg",
            "pediatric_dose": "10 mg/kgBB",
            "adverse_effects": "ruam",
            "contraindications": "gangguan hati",
            "interactions": "alkohol",
            "brand_names": "Panadol",
            "categories": "analgesik, antipiretik",
            "symptoms": "demam , sakit kepala,"
        }))
        .unwrap()
    }

    #[test]
    fn test_raw_record_without_warning_is_valid() {
        let record = raw_paracetamol().into_record("paracetamol").unwrap();
        assert_eq!(record.entry_id, "paracetamol");
        assert!(record.warnings.is_none());
        assert_eq!(record.symptom_tags(), vec!["demam", "sakit kepala"]);
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut raw = raw_paracetamol();
        raw.adult_dose = None;
        let err = raw.into_record("paracetamol").unwrap_err();
        assert!(err.to_string().contains("adult_dose"));
    }

    #[test]
    fn test_blank_warning_is_absent() {
        let mut raw = raw_paracetamol();
        raw.warnings = Some("   ".to_string());
        let record = raw.into_record("paracetamol").unwrap();
        assert_eq!(record.warning(), None);
    }
}
