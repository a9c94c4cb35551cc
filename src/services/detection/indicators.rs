// Indicator Library
// Each indicator maps text features to a bounded sub-score in [0, 100].
// Indicators are independent: none reads another one's output.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;

use crate::models::{AnalysisType, Indicator, IndicatorKind};
use crate::services::text_processor::{fold_for_matching, TextDecomposition};

use super::error::DetectionError;
use super::heuristics::{HeuristicConfig, LexicalDomain};

fn compile(pattern: &str) -> Result<Regex, DetectionError> {
    Regex::new(pattern).map_err(|source| DetectionError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, DetectionError> {
    patterns.iter().map(|p| compile(p)).collect()
}

fn word_patterns(words: &[String]) -> Result<Vec<Regex>, DetectionError> {
    words
        .iter()
        .map(|w| compile(&format!(r"(?i)\b{}\b", regex::escape(&fold_for_matching(w)))))
        .collect()
}

fn folded_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| fold_for_matching(s)).collect()
}

fn count_matches(patterns: &[Regex], haystack: &str) -> usize {
    patterns.iter().map(|re| re.find_iter(haystack).count()).sum()
}

fn count_present(needles: &[String], haystack: &str) -> usize {
    needles.iter().filter(|n| haystack.contains(n.as_str())).count()
}

struct TenseRegexes {
    past: Regex,
    present: Regex,
    future: Regex,
}

/// Indicator functions bound to one heuristic table
pub struct IndicatorLibrary {
    config: Arc<HeuristicConfig>,
    transition_markers: Vec<String>,
    chaining_marker: String,
    complex_structures: Vec<Regex>,
    temporal_markers: Vec<String>,
    argumentative_markers: Vec<String>,
    stylistic_patterns: Vec<Regex>,
    formal_register: Vec<Regex>,
    informal_register: Vec<Regex>,
    emotional_words: Vec<String>,
    cultural_references: Vec<String>,
    common_concepts: Vec<String>,
    tenses: TenseRegexes,
    generic_words: Vec<Regex>,
}

impl IndicatorLibrary {
    pub fn new(config: Arc<HeuristicConfig>) -> Result<Self, DetectionError> {
        let tenses = TenseRegexes {
            past: compile(&config.tense_patterns.past)?,
            present: compile(&config.tense_patterns.present)?,
            future: compile(&config.tense_patterns.future)?,
        };

        Ok(Self {
            transition_markers: folded_all(&config.transition_markers),
            chaining_marker: fold_for_matching(&config.chaining_marker),
            complex_structures: compile_all(&config.complex_structure_patterns)?,
            temporal_markers: folded_all(&config.temporal_markers),
            argumentative_markers: folded_all(&config.argumentative_markers),
            stylistic_patterns: compile_all(&config.stylistic_patterns)?,
            formal_register: word_patterns(&config.formal_register)?,
            informal_register: word_patterns(&config.informal_register)?,
            emotional_words: folded_all(&config.emotional_words),
            cultural_references: folded_all(&config.cultural_references),
            common_concepts: folded_all(&config.common_concepts),
            tenses,
            generic_words: word_patterns(&config.generic_words)?,
            config,
        })
    }

    /// Base set always, extended set appended for advanced analyses
    pub fn compute(&self, doc: &TextDecomposition<'_>, analysis_type: AnalysisType) -> Vec<Indicator> {
        let extended: &[IndicatorKind] = if analysis_type.includes_extended() {
            &IndicatorKind::EXTENDED
        } else {
            &[]
        };

        IndicatorKind::BASE
            .iter()
            .chain(extended.iter())
            .map(|&kind| Indicator::new(kind, self.score(kind, doc), self.config.weights.weight(kind)))
            .collect()
    }

    pub fn score(&self, kind: IndicatorKind, doc: &TextDecomposition<'_>) -> f64 {
        let folded = doc.folded.as_str();
        match kind {
            IndicatorKind::SentenceLength => sentence_length_score(&doc.sentences),
            IndicatorKind::VocabularyRepetition => vocabulary_repetition_score(&doc.words),
            IndicatorKind::Transitions => {
                transition_score(&doc.sentences, &self.transition_markers, &self.chaining_marker)
            }
            IndicatorKind::SyntaxComplexity => {
                syntax_complexity_score(folded, doc.segment_count, &self.complex_structures)
            }
            IndicatorKind::TemporalMarkers => {
                temporal_marker_score(folded, doc.segment_count, &self.temporal_markers)
            }
            IndicatorKind::LexicalCoherence => {
                lexical_coherence_score(&doc.words, &self.config.lexical_domains)
            }
            IndicatorKind::PunctuationPatterns => punctuation_score(doc.text, doc.segment_count),
            IndicatorKind::ArgumentativeStructure => {
                argumentative_score(&doc.sentences, &self.argumentative_markers)
            }
            IndicatorKind::StylisticPatterns => {
                (count_matches(&self.stylistic_patterns, folded) as f64 * 25.0).min(100.0)
            }
            IndicatorKind::RegisterImbalance => {
                register_imbalance_score(folded, &self.formal_register, &self.informal_register)
            }
            IndicatorKind::EmotionalIntensity => {
                (count_present(&self.emotional_words, folded) as f64 * 20.0).min(100.0)
            }
            IndicatorKind::CulturalReferences => {
                cultural_reference_score(count_present(&self.cultural_references, folded))
            }
            IndicatorKind::ConceptualOriginality => {
                (count_present(&self.common_concepts, folded) as f64 * 25.0).min(100.0)
            }
            IndicatorKind::TenseDistribution => tense_distribution_score(folded, &self.tenses),
            IndicatorKind::GenericVocabulary => {
                generic_vocabulary_score(folded, doc.words.len(), &self.generic_words)
            }
        }
    }
}

// ============================================================================
// Base set
// ============================================================================

/// Uniform sentence lengths read as machine-like
fn sentence_length_score(sentences: &[&str]) -> f64 {
    if sentences.is_empty() {
        return 20.0;
    }

    let lengths: Vec<f64> = sentences
        .iter()
        .map(|s| s.split_whitespace().count() as f64)
        .collect();
    let n = lengths.len() as f64;
    let avg = lengths.iter().sum::<f64>() / n;
    let variance = lengths.iter().map(|l| (l - avg).powi(2)).sum::<f64>() / n;

    let regularity = (100.0 - variance * 2.0).max(0.0);
    let length_suspicion = if avg > 15.0 && avg < 25.0 {
        ((20.0 - avg).abs() * 3.0).min(60.0)
    } else {
        0.0
    };

    (regularity + length_suspicion).min(100.0)
}

fn vocabulary_repetition_score(words: &[&str]) -> f64 {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in words {
        let clean: String = word
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if clean.chars().count() > 3 {
            *counts.entry(clean).or_insert(0) += 1;
        }
    }

    if counts.is_empty() {
        return 0.0;
    }

    let repeated = counts.values().filter(|&&c| c > 1).count() as f64;
    (repeated * 150.0 / counts.len() as f64).min(100.0)
}

fn transition_score(sentences: &[&str], markers: &[String], chaining_marker: &str) -> f64 {
    if sentences.is_empty() {
        return 0.0;
    }

    let folded: Vec<String> = sentences.iter().map(|s| fold_for_matching(s)).collect();
    let mut with_transition = 0usize;
    let mut chained = 0usize;

    for (idx, sentence) in folded.iter().enumerate() {
        if !markers.iter().any(|m| sentence.contains(m.as_str())) {
            continue;
        }
        with_transition += 1;
        if idx > 0 && folded[idx - 1].contains(chaining_marker) {
            chained += 1;
        }
    }

    let ratio = with_transition as f64 / sentences.len() as f64;
    let excessive = if ratio > 0.4 { (ratio - 0.4) * 200.0 } else { 0.0 };
    let chained_penalty = if chained > 2 { chained as f64 * 15.0 } else { 0.0 };

    (excessive + chained_penalty).min(100.0)
}

/// Both very plain and uniformly convoluted syntax are suspicious
fn syntax_complexity_score(folded: &str, segment_count: usize, patterns: &[Regex]) -> f64 {
    let ratio = count_matches(patterns, folded) as f64 / segment_count.max(1) as f64;

    if ratio < 0.1 {
        60.0
    } else if ratio > 0.8 {
        75.0
    } else {
        (ratio * 40.0).min(100.0)
    }
}

fn temporal_marker_score(folded: &str, segment_count: usize, markers: &[String]) -> f64 {
    let occurrences: usize = markers
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| folded.matches(m.as_str()).count())
        .sum();
    (occurrences as f64 / segment_count.max(1) as f64 * 120.0).min(100.0)
}

fn lexical_coherence_score(words: &[&str], domains: &[LexicalDomain]) -> f64 {
    let vocabulary: HashSet<String> = words
        .iter()
        .map(|w| fold_for_matching(w.trim_matches(|c: char| !c.is_alphanumeric())))
        .filter(|w| !w.is_empty())
        .collect();

    let best = domains
        .iter()
        .filter(|d| !d.words.is_empty())
        .map(|d| {
            let overlap = d
                .words
                .iter()
                .filter(|w| vocabulary.contains(&fold_for_matching(w)))
                .count();
            overlap as f64 / d.words.len() as f64
        })
        .fold(0.0_f64, f64::max);

    let coherence = best * 100.0;
    if coherence > 80.0 {
        coherence.min(100.0)
    } else {
        (coherence * 0.7).min(100.0)
    }
}

fn punctuation_score(text: &str, segment_count: usize) -> f64 {
    let marks = text
        .chars()
        .filter(|c| matches!(c, '.' | '!' | '?' | ';' | ':' | ','))
        .count();
    let avg = marks as f64 / segment_count.max(1) as f64;

    if avg > 3.0 && avg < 6.0 {
        ((4.5 - avg).abs() * 20.0).min(100.0)
    } else {
        0.0
    }
}

fn argumentative_score(sentences: &[&str], markers: &[String]) -> f64 {
    if sentences.is_empty() {
        return 0.0;
    }

    let last = sentences.len() - 1;
    let mut marked = 0usize;
    let mut inner = 0usize;

    for (idx, sentence) in sentences.iter().enumerate() {
        let folded = fold_for_matching(sentence);
        if markers.iter().any(|m| folded.contains(m.as_str())) {
            marked += 1;
            if idx > 0 && idx < last {
                inner += 1;
            }
        }
    }

    let ratio = marked as f64 / sentences.len() as f64;
    let sequence_bonus = if inner > 3 { 30.0 } else { 0.0 };
    (ratio * 100.0 + sequence_bonus).min(100.0)
}

// ============================================================================
// Extended set
// ============================================================================

fn register_imbalance_score(folded: &str, formal: &[Regex], informal: &[Regex]) -> f64 {
    let formal_hits = formal.iter().filter(|re| re.is_match(folded)).count() as f64;
    let informal_hits = informal.iter().filter(|re| re.is_match(folded)).count() as f64;
    ((formal_hits - informal_hits).abs() * 10.0).min(100.0)
}

/// A couple of references is natural; a cluster of them is staged
fn cultural_reference_score(present: usize) -> f64 {
    if present > 2 {
        (present as f64 * 30.0).min(100.0)
    } else {
        0.0
    }
}

fn tense_distribution_score(folded: &str, tenses: &TenseRegexes) -> f64 {
    let counts = [
        tenses.past.find_iter(folded).count() as f64,
        tenses.present.find_iter(folded).count() as f64,
        tenses.future.find_iter(folded).count() as f64,
    ];
    let total: f64 = counts.iter().sum();
    if total == 0.0 {
        return 20.0;
    }

    let skew: f64 = counts.iter().map(|c| (c / total - 0.33).powi(2)).sum();
    (skew * 200.0).min(100.0)
}

fn generic_vocabulary_score(folded: &str, word_count: usize, patterns: &[Regex]) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    (count_matches(patterns, folded) as f64 * 300.0 / word_count as f64).min(100.0)
}
