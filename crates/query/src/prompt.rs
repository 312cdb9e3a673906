use ingest::DrugRecord;

pub fn build_answer_prompt(question: &str, context: &str, entry: &DrugRecord) -> String {
    format!(
        r#"Anda adalah asisten informasi obat yang menjawab pertanyaan berdasarkan konteks yang diberikan.

KONTEKS:
{}

PERTANYAAN PENGGUNA: {}

INSTRUKSI:
- Jawab HANYA menggunakan informasi dari konteks di atas
- Jika konteks tidak memuat informasi yang cukup, katakan dengan jelas bahwa informasinya tidak tersedia
- Fokus pada obat {} dan jangan membahas obat lain
- Sertakan peringatan keamanan jika relevan
- Jawab dalam Bahasa Indonesia secara ringkas dan faktual

JAWABAN:"#,
        context, question, entry.name
    )
}
