use query::{AnswerSource, AssistantResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QAPair {
    pub question: String,
    /// `None` when the catalog should have nothing relevant.
    pub expected_entry: Option<String>,
    pub expected_answer_contains: Vec<String>,
    pub category: QuestionType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuestionType {
    Symptom,          // Which drug treats a complaint
    Dose,
    AdverseEffect,
    Contraindication,
    Interaction,
    Warning,
    OutOfCatalog,     // Nothing should be retrieved
}

fn qa(question: &str, expected_entry: Option<&str>, contains: &[&str], category: QuestionType) -> QAPair {
    QAPair {
        question: question.to_string(),
        expected_entry: expected_entry.map(str::to_string),
        expected_answer_contains: contains.iter().map(|s| s.to_string()).collect(),
        category,
    }
}

/// Questions against the bundled catalog.
pub fn get_test_set() -> Vec<QAPair> {
    use QuestionType::*;

    vec![
        // Symptom lookups
        qa("sakit kepala", Some("paracetamol"), &["paracetamol", "sakit kepala"], Symptom),
        qa("obat untuk demam dan nyeri", Some("paracetamol"), &["demam"], Symptom),
        qa("infeksi saluran napas", Some("amoxicillin"), &["amoxicillin", "infeksi saluran napas"], Symptom),

        // Dosing
        qa("dosis paracetamol untuk dewasa", Some("paracetamol"), &["500-1000 mg", "dosis anak"], Dose),
        qa("dosis anak amoxicillin", Some("amoxicillin"), &["20-40 mg/kgbb"], Dose),

        // Adverse effects
        qa("efek samping amoxicillin", Some("amoxicillin"), &["diare", "ruam kulit"], AdverseEffect),
        qa("efek samping paracetamol", Some("paracetamol"), &["ruam kulit"], AdverseEffect),

        // Contraindications and interactions
        qa("kontraindikasi amoxicillin", Some("amoxicillin"), &["penisilin"], Contraindication),
        qa("interaksi obat paracetamol", Some("paracetamol"), &["warfarin"], Interaction),

        // Warnings
        qa("peringatan paracetamol", Some("paracetamol"), &["alkohol"], Warning),

        // Out of catalog
        qa("xyzzy", None, &[], OutOfCatalog),
        qa("harga obat", None, &[], OutOfCatalog),
    ]
}

/// Fraction of expected keywords found in the answer, case-insensitively.
pub fn score_answer(answer: &str, expected_keywords: &[String]) -> f64 {
    if expected_keywords.is_empty() {
        return 1.0;
    }

    let answer = answer.to_lowercase();
    let hits = expected_keywords
        .iter()
        .filter(|keyword| answer.contains(&keyword.to_lowercase()))
        .count();

    hits as f64 / expected_keywords.len() as f64
}

/// Whether the response picked the expected entry (or correctly found none).
pub fn retrieval_hit(qa: &QAPair, response: &AssistantResponse) -> bool {
    match &qa.expected_entry {
        Some(expected) => response.entry_id.as_deref() == Some(expected.as_str()),
        None => response.source == AnswerSource::NoInformation,
    }
}

/// Quality of one response: keyword coverage when an entry is expected,
/// all-or-nothing for out-of-catalog questions.
pub fn score_response(qa: &QAPair, response: &AssistantResponse) -> f64 {
    match qa.expected_entry {
        Some(_) if response.source == AnswerSource::NoInformation => 0.0,
        Some(_) => score_answer(&response.answer, &qa.expected_answer_contains),
        None if response.source == AnswerSource::NoInformation => 1.0,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_answer() {
        let expected = vec!["Diare".to_string(), "mual".to_string()];
        assert_eq!(score_answer("Efek samping: mual, diare", &expected), 1.0);
        assert_eq!(score_answer("Efek samping: mual", &expected), 0.5);
        assert_eq!(score_answer("tidak ada", &expected), 0.0);
        assert_eq!(score_answer("apa saja", &[]), 1.0);
    }

    #[test]
    fn test_set_covers_every_category() {
        let set = get_test_set();
        for category in [
            QuestionType::Symptom,
            QuestionType::Dose,
            QuestionType::AdverseEffect,
            QuestionType::Contraindication,
            QuestionType::Interaction,
            QuestionType::Warning,
            QuestionType::OutOfCatalog,
        ] {
            assert!(set.iter().any(|qa| qa.category == category), "{:?}", category);
        }
        assert!(
            set.iter()
                .filter(|qa| qa.category == QuestionType::OutOfCatalog)
                .all(|qa| qa.expected_entry.is_none())
        );
    }
}
