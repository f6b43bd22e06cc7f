//! Text scoring helpers used by the reference backends.
//!
//! All functions are pure and return scores in `[0.0, 1.0]` unless noted.

use std::collections::{HashMap, HashSet};

/// Words ignored when tokenizing (English and Spanish).
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "for", "from", "how", "i",
    "in", "is", "it", "me", "my", "of", "on", "or", "the", "to", "was", "what", "with", "you",
    "de", "el", "en", "es", "la", "las", "lo", "los", "mi", "por", "que", "se", "su", "un",
    "una", "y",
];

/// A canonical keyword and the spellings that count as mentioning it.
#[derive(Debug, Clone, Copy)]
pub struct KeywordGroup {
    /// Canonical term
    pub keyword: &'static str,
    /// Equivalent spellings and translations
    pub variations: &'static [&'static str],
}

/// Bilingual keyword groups for obesity-treatment questions.
pub const MEDICAL_KEYWORDS: &[KeywordGroup] = &[
    KeywordGroup { keyword: "nausea", variations: &["nausea", "náuseas", "vomit", "vómito"] },
    KeywordGroup { keyword: "injection", variations: &["inyección", "injection", "inject", "inyectar"] },
    KeywordGroup { keyword: "dose", variations: &["dosis", "dose", "missed", "olvida"] },
    KeywordGroup { keyword: "effects", variations: &["efectos", "effects", "side", "secundarios"] },
    KeywordGroup { keyword: "weight", variations: &["peso", "weight", "loss", "pérdida"] },
    KeywordGroup { keyword: "ozempic", variations: &["ozempic", "semaglutide"] },
    KeywordGroup { keyword: "exercise", variations: &["ejercicio", "exercise", "physical"] },
    KeywordGroup { keyword: "diet", variations: &["dieta", "diet", "food", "comida"] },
    KeywordGroup { keyword: "pain", variations: &["dolor", "pain", "abdominal"] },
];

/// Query words that mark an urgent question.
pub const URGENCY_TERMS: &[&str] = &["severe", "severo", "grave", "emergency", "emergencia", "inmediata"];

/// Lowercase alphanumeric tokens without stopwords or single characters.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1 && !STOPWORDS.contains(t))
        .map(String::from)
        .collect()
}

/// Term frequency vector of a text.
#[must_use]
pub fn term_frequencies(text: &str) -> HashMap<String, f32> {
    let mut tf = HashMap::new();
    for token in tokenize(text) {
        *tf.entry(token).or_insert(0.0) += 1.0;
    }
    tf
}

/// Cosine similarity between two term frequency vectors.
#[must_use]
pub fn cosine_similarity(a: &HashMap<String, f32>, b: &HashMap<String, f32>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f32 = a
        .iter()
        .filter_map(|(term, wa)| b.get(term).map(|wb| wa * wb))
        .sum();
    let norm_a = a.values().map(|w| w * w).sum::<f32>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Fraction of distinct query terms present in `text`.
#[must_use]
pub fn term_overlap_score(query: &str, text: &str) -> f32 {
    let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
    if query_terms.is_empty() {
        return 0.0;
    }
    let text_terms: HashSet<String> = tokenize(text).into_iter().collect();
    let matched = query_terms.iter().filter(|t| text_terms.contains(*t)).count();
    matched as f32 / query_terms.len() as f32
}

/// Raw keyword score of an item for a query.
///
/// For every variation mentioned in the query: +2 when the item mentions
/// the same variation, otherwise +1 when it mentions the canonical keyword.
/// Urgent items gain +5 when the query uses an urgency term. Unbounded.
#[must_use]
pub fn keyword_score(query: &str, item_text: &str, urgent_item: bool, groups: &[KeywordGroup]) -> u32 {
    let query = query.to_lowercase();
    let item = item_text.to_lowercase();
    let mut score = 0;

    for group in groups {
        for variation in group.variations {
            if query.contains(variation) {
                if item.contains(variation) {
                    score += 2;
                } else if item.contains(group.keyword) {
                    score += 1;
                }
            }
        }
    }

    if urgent_item && URGENCY_TERMS.iter().any(|t| query.contains(t)) {
        score += 5;
    }
    score
}
