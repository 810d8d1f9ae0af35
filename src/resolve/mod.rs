//! Locates the export that backs each source slot.
//!
//! Resolution runs two passes over the folder listing. The keyword is first
//! tried as a case-insensitive pattern against every file name in listing
//! order. Only when nothing matches are the file stems ranked with a
//! [`Similarity`] implementation, and the best one is accepted when it reaches
//! the threshold.

use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::config::PipelineConfig;
use crate::model::{Diagnostics, Stage};

pub mod similarity;

pub use similarity::{JaroWinkler, NormalizedLevenshtein, Similarity};

/// How a file was picked for a keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchKind {
    Pattern,
    Approximate { score: f64 },
}

/// File chosen for a keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub file: String,
    pub kind: MatchKind,
}

pub struct FileResolver {
    similarity: Box<dyn Similarity>,
    threshold: f64,
}

impl FileResolver {
    pub fn new(similarity: Box<dyn Similarity>, threshold: f64) -> Self {
        Self {
            similarity,
            threshold,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(similarity::for_kind(config.similarity), config.threshold)
    }

    /// Picks the file for `keyword` among `candidates`, or `None` when neither
    /// pass finds one. Every outcome is recorded in `diagnostics`.
    pub fn resolve(
        &self,
        keyword: &str,
        candidates: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Option<Resolution> {
        let pattern = compile(keyword);
        let lowered = keyword.to_lowercase();
        let is_match = |name: &str| match &pattern {
            Some(pattern) => pattern.is_match(name),
            None => name.to_lowercase().contains(&lowered),
        };
        if let Some(file) = candidates.iter().find(|name| is_match(name.as_str())) {
            diagnostics.info(Stage::Resolve, format!("matched '{keyword}' -> {file}"));
            return Some(Resolution {
                file: file.clone(),
                kind: MatchKind::Pattern,
            });
        }

        let mut best: Option<(f64, &String)> = None;
        for name in candidates {
            let score = self.similarity.score(&lowered, &stem(name).to_lowercase());
            if best.is_none_or(|(best_score, _)| score > best_score) {
                best = Some((score, name));
            }
        }

        match best {
            Some((score, file)) if score >= self.threshold => {
                diagnostics.warning(
                    Stage::Resolve,
                    format!("approximate match for '{keyword}' -> {file} (similarity {score:.2})"),
                );
                Some(Resolution {
                    file: file.clone(),
                    kind: MatchKind::Approximate { score },
                })
            }
            _ => {
                diagnostics.error(Stage::Resolve, format!("no match found for '{keyword}'"));
                None
            }
        }
    }
}

impl Default for FileResolver {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Keywords are patterns; one that does not compile is matched literally.
fn compile(keyword: &str) -> Option<Regex> {
    RegexBuilder::new(keyword)
        .case_insensitive(true)
        .build()
        .or_else(|_| {
            RegexBuilder::new(&regex::escape(keyword))
                .case_insensitive(true)
                .build()
        })
        .ok()
}

fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn listing(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn pattern_match_is_case_insensitive_and_first_wins() {
        let files = listing(&["CF-insider-trading-2.csv", "CF-Insider-Trading.csv"]);
        let mut diagnostics = Diagnostics::new();

        let resolution = FileResolver::default()
            .resolve("Insider", &files, &mut diagnostics)
            .expect("resolved");

        assert_eq!(resolution.file, "CF-insider-trading-2.csv");
        assert_eq!(resolution.kind, MatchKind::Pattern);
        assert_eq!(diagnostics.count(Severity::Info), 1);
    }

    #[test]
    fn approximate_match_is_a_warning() {
        let files = listing(&["EQUITY_L.csv", "bhav_data.csv"]);
        let mut diagnostics = Diagnostics::new();

        let resolution = FileResolver::default()
            .resolve("bhavdata", &files, &mut diagnostics)
            .expect("resolved");

        assert_eq!(resolution.file, "bhav_data.csv");
        assert!(matches!(resolution.kind, MatchKind::Approximate { score } if score > 0.8));
        assert_eq!(diagnostics.count(Severity::Warning), 1);
    }

    #[test]
    fn unrelated_listing_is_not_found() {
        let files = listing(&["EQUITY_L.csv", "CF-Insider-Trading.csv"]);
        let mut diagnostics = Diagnostics::new();

        assert!(
            FileResolver::default()
                .resolve("bhavdata", &files, &mut diagnostics)
                .is_none()
        );
        assert_eq!(diagnostics.count(Severity::Error), 1);
    }

    #[test]
    fn invalid_pattern_is_matched_literally() {
        let files = listing(&["report(1.csv"]);
        let mut diagnostics = Diagnostics::new();

        let resolution = FileResolver::default()
            .resolve("report(", &files, &mut diagnostics)
            .expect("resolved");
        assert_eq!(resolution.kind, MatchKind::Pattern);
    }

    struct Constant(f64);

    impl Similarity for Constant {
        fn score(&self, _: &str, _: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn equal_scores_keep_the_earlier_file() {
        let files = listing(&["sec_bhav.csv", "bhav_full.csv"]);
        let mut diagnostics = Diagnostics::new();
        let resolver = FileResolver::new(Box::new(Constant(0.7)), 0.6);

        let resolution = resolver
            .resolve("bhavdata", &files, &mut diagnostics)
            .expect("resolved");

        assert_eq!(resolution.file, "sec_bhav.csv");
        assert_eq!(resolution.kind, MatchKind::Approximate { score: 0.7 });
    }

    #[test]
    fn similarity_is_pluggable() {
        struct Always;
        impl Similarity for Always {
            fn score(&self, _: &str, _: &str) -> f64 {
                0.99
            }
        }

        let files = listing(&["unrelated.csv"]);
        let mut diagnostics = Diagnostics::new();
        let resolver = FileResolver::new(Box::new(Always), 0.9);

        assert!(resolver.resolve("bhavdata", &files, &mut diagnostics).is_some());
    }
}
