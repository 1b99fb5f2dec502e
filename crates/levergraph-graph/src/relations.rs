//! Textual relation evidence.
//!
//! A sentence is evidence for a pair of terms when one term appears, then a
//! relation marker, then the other term. Terms and markers are matched
//! case-insensitively; markers only as whole words.

use levergraph_core::{LeverageError, RelationCategory, RelationTriple, Result, Term};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

const CAUSAL_MARKERS: &[&str] = &[
    "causes",
    "caused by",
    "leads to",
    "drives",
    "increases",
    "decreases",
    "affects",
    "influences",
    "results in",
    "impacts",
];

const DEPENDENCY_MARKERS: &[&str] = &["depends on", "requires", "relies on", "is based on", "needs"];

const PRECEDENCE_MARKERS: &[&str] = &[
    "precedes",
    "comes before",
    "is followed by",
    "happens before",
    "triggers",
];

/// One piece of evidence linking two term positions.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationEvidence {
    pub subject: usize,
    pub object: usize,
    pub category: RelationCategory,
    /// Marker text as it appeared, or the declared predicate.
    pub marker: String,
}

impl RelationEvidence {
    /// Unordered key; evidence is symmetric once it reaches the graph.
    pub fn pair(&self) -> (usize, usize) {
        if self.subject < self.object {
            (self.subject, self.object)
        } else {
            (self.object, self.subject)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    id: usize,
}

pub struct RelationExtractor {
    terms: Vec<Regex>,
    markers: Vec<(RelationCategory, Regex)>,
    sentence_split: Regex,
}

impl RelationExtractor {
    pub fn new(terms: &[Term]) -> Result<Self> {
        let terms = terms
            .iter()
            .map(|t| compile(&term_pattern(t)))
            .collect::<Result<Vec<_>>>()?;

        let markers = [
            (RelationCategory::Causal, CAUSAL_MARKERS),
            (RelationCategory::Dependency, DEPENDENCY_MARKERS),
            (RelationCategory::Precedence, PRECEDENCE_MARKERS),
        ]
        .into_iter()
        .map(|(category, words)| Ok((category, compile(&marker_pattern(words))?)))
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            terms,
            markers,
            // a period inside a number such as 3.5 is not a boundary
            sentence_split: compile(r"[.!?]+(?:\s+|$)|\n+")?,
        })
    }

    /// Evidence found in `corpus`, one entry per unordered pair, in
    /// discovery order.
    pub fn extract(&self, corpus: &str) -> Vec<RelationEvidence> {
        let mut seen = HashSet::new();
        let mut evidence = Vec::new();

        for sentence in self.sentence_split.split(corpus) {
            if sentence.trim().is_empty() {
                continue;
            }
            for found in self.scan_sentence(sentence) {
                if seen.insert(found.pair()) {
                    evidence.push(found);
                }
            }
        }

        debug!("Extracted {} textual relations", evidence.len());
        evidence
    }

    fn scan_sentence(&self, sentence: &str) -> Vec<RelationEvidence> {
        let mut occurrences: Vec<Span> = Vec::new();
        for (id, pattern) in self.terms.iter().enumerate() {
            occurrences.extend(pattern.find_iter(sentence).map(|m| Span {
                start: m.start(),
                end: m.end(),
                id,
            }));
        }
        if occurrences.len() < 2 {
            return Vec::new();
        }
        occurrences.sort_by_key(|s| (s.start, s.end, s.id));

        let mut markers: Vec<(Span, RelationCategory, &str)> = Vec::new();
        for (id, (category, pattern)) in self.markers.iter().enumerate() {
            markers.extend(pattern.find_iter(sentence).map(|m| {
                (
                    Span {
                        start: m.start(),
                        end: m.end(),
                        id,
                    },
                    *category,
                    m.as_str(),
                )
            }));
        }
        if markers.is_empty() {
            return Vec::new();
        }
        markers.sort_by_key(|(s, _, _)| (s.start, s.end, s.id));

        let mut found = Vec::new();
        for a in &occurrences {
            for b in occurrences.iter().filter(|b| b.start >= a.end && b.id != a.id) {
                let between = markers
                    .iter()
                    .find(|(m, _, _)| m.start >= a.end && m.end <= b.start);
                if let Some((_, category, text)) = between {
                    found.push(RelationEvidence {
                        subject: a.id,
                        object: b.id,
                        category: *category,
                        marker: text.to_lowercase(),
                    });
                }
            }
        }
        found
    }
}

/// Evidence from explicitly declared triples. Triples naming terms outside
/// the graph, or relating a term to itself, are skipped.
pub fn declared_evidence(
    positions: &HashMap<Term, usize>,
    triples: &[RelationTriple],
) -> Vec<RelationEvidence> {
    let mut evidence = Vec::new();
    for triple in triples {
        match (positions.get(&triple.subject), positions.get(&triple.object)) {
            (Some(&subject), Some(&object)) if subject != object => {
                evidence.push(RelationEvidence {
                    subject,
                    object,
                    category: RelationCategory::Declared,
                    marker: triple.predicate.clone(),
                });
            }
            (Some(_), Some(_)) => {
                debug!("Skipping self-relation on '{}'", triple.subject);
            }
            _ => {
                warn!(
                    "Skipping relation '{} {} {}': term not in graph",
                    triple.subject, triple.predicate, triple.object
                );
            }
        }
    }
    evidence
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| LeverageError::InvalidInput(format!("bad pattern {}: {}", pattern, e)))
}

/// Word boundaries only where the term itself starts or ends with a word
/// character, so terms like "C++" still match.
fn term_pattern(term: &str) -> String {
    let escaped = regex::escape(term.trim()).replace(' ', r"\s+");
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(term.trim().chars().next()) { r"\b" } else { "" };
    let trail = if is_word(term.trim().chars().last()) { r"\b" } else { "" };
    format!("(?i){}{}{}", lead, escaped, trail)
}

fn marker_pattern(words: &[&str]) -> String {
    let alternatives: Vec<String> = words
        .iter()
        .map(|w| regex::escape(w).replace(' ', r"\s+"))
        .collect();
    format!(r"(?i)\b(?:{})\b", alternatives.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> Vec<Term> {
        vec![
            "Marketing Budget".to_string(),
            "Revenue".to_string(),
            "Churn".to_string(),
            "Onboarding".to_string(),
        ]
    }

    #[test]
    fn test_marker_between_terms() {
        let extractor = RelationExtractor::new(&terms()).unwrap();
        let evidence = extractor.extract("Marketing budget drives revenue. Churn is high.");
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].subject, 0);
        assert_eq!(evidence[0].object, 1);
        assert_eq!(evidence[0].category, RelationCategory::Causal);
        assert_eq!(evidence[0].marker, "drives");
    }

    #[test]
    fn test_no_evidence_across_sentences_or_without_marker() {
        let extractor = RelationExtractor::new(&terms()).unwrap();
        assert!(extractor.extract("Revenue grew. Churn depends on pricing.").is_empty());
        assert!(extractor.extract("Revenue and churn were reported.").is_empty());
        // marker must sit between the terms
        assert!(extractor.extract("Drives revenue and churn").is_empty());
    }

    #[test]
    fn test_pairs_deduplicated_in_discovery_order() {
        let extractor = RelationExtractor::new(&terms()).unwrap();
        let evidence = extractor.extract(
            "Churn depends on onboarding. Onboarding precedes churn! Revenue is caused by marketing budget",
        );
        let pairs: Vec<_> = evidence.iter().map(|e| e.pair()).collect();
        assert_eq!(pairs, vec![(2, 3), (0, 1)]);
        assert_eq!(evidence[0].category, RelationCategory::Dependency);
    }

    #[test]
    fn test_decimal_numbers_do_not_split_sentences() {
        let extractor = RelationExtractor::new(&terms()).unwrap();
        let evidence = extractor.extract("A 3.5% churn drives revenue.");
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].pair(), (1, 2));
        assert_eq!(evidence[0].subject, 2);

        // real boundaries still separate the terms
        assert!(extractor.extract("Churn fell 2.5 points. Revenue depends on pricing.").is_empty());
        assert!(extractor.extract("Churn rose\nand drives revenue").is_empty());
    }

    #[test]
    fn test_markers_are_whole_words() {
        let extractor = RelationExtractor::new(&terms()).unwrap();
        assert!(extractor.extract("Revenue overdrives churn").is_empty());
        assert_eq!(extractor.extract("Revenue  LEADS   TO churn").len(), 1);
    }

    #[test]
    fn test_declared_evidence_skips_unknown_terms() {
        let positions: HashMap<Term, usize> = terms()
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t, i))
            .collect();
        let triples = vec![
            RelationTriple::new("Churn", "reduces", "Revenue"),
            RelationTriple::new("Churn", "reduces", "Profit"),
        ];
        let evidence = declared_evidence(&positions, &triples);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].pair(), (1, 2));
        assert_eq!(evidence[0].category, RelationCategory::Declared);
    }

    #[test]
    fn test_term_pattern_handles_symbols() {
        let extractor = RelationExtractor::new(&["C++".to_string(), "Latency".to_string()]).unwrap();
        assert_eq!(extractor.extract("C++ impacts latency").len(), 1);
    }
}
