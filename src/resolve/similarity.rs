use crate::config::SimilarityKind;

/// Scores how close a candidate name is to a lookup keyword, from 0.0
/// (unrelated) to 1.0 (identical).
pub trait Similarity {
    fn score(&self, keyword: &str, candidate: &str) -> f64;
}

/// Edit distance scaled by the longer string's length.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl Similarity for NormalizedLevenshtein {
    fn score(&self, keyword: &str, candidate: &str) -> f64 {
        strsim::normalized_levenshtein(keyword, candidate)
    }
}

/// Jaro-Winkler similarity, favouring shared prefixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl Similarity for JaroWinkler {
    fn score(&self, keyword: &str, candidate: &str) -> f64 {
        strsim::jaro_winkler(keyword, candidate)
    }
}

/// Builds the configured similarity implementation.
pub fn for_kind(kind: SimilarityKind) -> Box<dyn Similarity> {
    match kind {
        SimilarityKind::NormalizedLevenshtein => Box::new(NormalizedLevenshtein),
        SimilarityKind::JaroWinkler => Box::new(JaroWinkler),
    }
}
