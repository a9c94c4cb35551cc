// Section Scorer
// Locates each sentence in the original text and flags the suspicious ones.
//
// Location uses a monotonic cursor: each sentence is searched from the end of
// the previous match, so repeated sentences resolve to successive occurrences.
// A sentence that cannot be found from the cursor onward is dropped (logged at
// debug level and reported as a miss) and the cursor stays where it was.

use std::sync::Arc;

use tracing::debug;

use crate::models::{Section, SuspicionLevel};
use crate::services::text_processor::{fold_for_matching, split_sentences, word_count};

use super::error::LocalizationMiss;
use super::heuristics::{HeuristicConfig, SectionRules};

#[derive(Debug, Clone, Default)]
pub struct SectionScan {
    /// Ascending `start_position`, in sentence order.
    pub sections: Vec<Section>,
    pub misses: Vec<LocalizationMiss>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceScore {
    pub score: u32,
    pub reasons: Vec<String>,
}

pub struct SectionScorer {
    config: Arc<HeuristicConfig>,
    boilerplate: Vec<String>,
    openers: Vec<String>,
}

impl SectionScorer {
    pub fn new(config: Arc<HeuristicConfig>) -> Self {
        let rules = &config.sections;
        let boilerplate = rules.boilerplate_phrases.iter().map(|p| fold_for_matching(p)).collect();
        let openers = rules.enumeration_openers.iter().map(|o| fold_for_matching(o)).collect();
        Self {
            config,
            boilerplate,
            openers,
        }
    }

    fn rules(&self) -> &SectionRules {
        &self.config.sections
    }

    pub fn scan(&self, text: &str) -> SectionScan {
        let sentences = split_sentences(text);
        self.scan_sentences(text, &sentences)
    }

    /// Score an already split sentence sequence against `text`
    pub fn scan_sentences(&self, text: &str, sentences: &[&str]) -> SectionScan {
        let mut scan = SectionScan::default();
        let mut cursor = 0usize;

        for (idx, sentence) in sentences.iter().enumerate() {
            let trimmed = sentence.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some(start) = locate(text, trimmed, cursor) else {
                debug!(sentence_index = idx, cursor, "section.localization_miss");
                scan.misses.push(LocalizationMiss {
                    sentence_index: idx,
                    sentence: trimmed.to_string(),
                    cursor,
                });
                continue;
            };
            let end = start + trimmed.len();
            cursor = end;

            let scored = self.score_sentence(trimmed);
            if scored.score <= self.rules().retain_above {
                continue;
            }

            let reasoning = if scored.reasons.is_empty() {
                self.rules().default_reasoning.clone()
            } else {
                scored.reasons.join(", ")
            };

            scan.sections.push(Section {
                text: trimmed.to_string(),
                start_position: start,
                end_position: end,
                suspicion_level: classify(scored.score, self.rules()),
                ai_probability: scored.score.min(100) as u8,
                reasoning,
            });
        }

        scan
    }

    /// Additive point penalties; reasons follow the check order
    pub fn score_sentence(&self, sentence: &str) -> SentenceScore {
        let rules = self.rules();
        let folded = fold_for_matching(sentence.trim());
        let mut score = 0u32;
        let mut reasons = Vec::new();

        if self.boilerplate.iter().any(|p| !p.is_empty() && folded.contains(p.as_str())) {
            score = score.saturating_add(rules.boilerplate_penalty);
            reasons.push(rules.boilerplate_reason.clone());
        }

        if word_count(sentence) > rules.long_sentence_words {
            score = score.saturating_add(rules.long_sentence_penalty);
            reasons.push(rules.long_sentence_reason.clone());
        }

        if self.openers.iter().any(|o| !o.is_empty() && folded.starts_with(o.as_str())) {
            score = score.saturating_add(rules.enumeration_penalty);
            reasons.push(rules.enumeration_reason.clone());
        }

        SentenceScore { score, reasons }
    }
}

/// First occurrence of `needle` at or after `cursor`, as a byte offset into `text`
pub fn locate(text: &str, needle: &str, cursor: usize) -> Option<usize> {
    text.get(cursor..)?.find(needle).map(|offset| cursor + offset)
}

pub fn classify(score: u32, rules: &SectionRules) -> SuspicionLevel {
    if score > rules.high_above {
        SuspicionLevel::High
    } else if score > rules.medium_above {
        SuspicionLevel::Medium
    } else {
        SuspicionLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> SectionScorer {
        SectionScorer::new(Arc::new(HeuristicConfig::default()))
    }

    fn long_sentence(words: usize) -> String {
        vec!["mot"; words].join(" ")
    }

    #[test]
    fn test_classify_boundaries() {
        let rules = SectionRules::default();
        assert_eq!(classify(51, &rules), SuspicionLevel::High);
        assert_eq!(classify(50, &rules), SuspicionLevel::Medium);
        assert_eq!(classify(26, &rules), SuspicionLevel::Medium);
        assert_eq!(classify(25, &rules), SuspicionLevel::Low);
        assert_eq!(classify(16, &rules), SuspicionLevel::Low);
    }

    #[test]
    fn test_short_plain_sentence_is_dropped() {
        let scan = scorer().scan("Le chat dort sur le canapé.");
        assert!(scan.sections.is_empty());
        assert!(scan.misses.is_empty());
    }

    #[test]
    fn test_boilerplate_sentence_is_medium() {
        let text = "Bonjour. Il est important de rester prudent. Merci.";
        let scan = scorer().scan(text);
        assert_eq!(scan.sections.len(), 1);
        let section = &scan.sections[0];
        assert_eq!(section.text, "Il est important de rester prudent");
        assert_eq!(&text[section.start_position..section.end_position], section.text);
        assert_eq!(section.suspicion_level, SuspicionLevel::Medium);
        assert_eq!(section.ai_probability, 30);
        assert_eq!(section.reasoning, "Expression typique d'IA");
    }

    #[test]
    fn test_triggers_stack_in_check_order() {
        let sentence = format!("Premièrement, il est important de dire {}", long_sentence(25));
        let score = scorer().score_sentence(&sentence);
        assert_eq!(score.score, 75);
        assert_eq!(
            score.reasons,
            vec![
                "Expression typique d'IA".to_string(),
                "Phrase anormalement longue".to_string(),
                "Structure artificielle".to_string(),
            ]
        );

        let scan = scorer().scan(&format!("{}.", sentence));
        assert_eq!(scan.sections[0].suspicion_level, SuspicionLevel::High);
        assert_eq!(
            scan.sections[0].reasoning,
            "Expression typique d'IA, Phrase anormalement longue, Structure artificielle"
        );
    }

    #[test]
    fn test_enumeration_opener_is_low_but_retained() {
        let scan = scorer().scan("Enfin il pleut.");
        assert_eq!(scan.sections.len(), 1);
        assert_eq!(scan.sections[0].suspicion_level, SuspicionLevel::Low);
        assert_eq!(scan.sections[0].ai_probability, 25);
    }

    #[test]
    fn test_opener_must_start_the_sentence() {
        assert_eq!(scorer().score_sentence("Il pleut enfin").score, 0);
    }

    #[test]
    fn test_duplicate_sentences_resolve_to_successive_offsets() {
        let text = "Enfin il pleut. Enfin il pleut.";
        let scan = scorer().scan(text);
        assert_eq!(scan.sections.len(), 2);
        assert_eq!(scan.sections[0].start_position, 0);
        assert_eq!(scan.sections[1].start_position, 16);
        for section in &scan.sections {
            assert_eq!(&text[section.start_position..section.end_position], section.text);
        }
    }

    #[test]
    fn test_offsets_are_bytes_with_accents() {
        let text = "Déjà été là. Deuxièmement, ça évolue.";
        let scan = scorer().scan(text);
        assert_eq!(scan.sections.len(), 1);
        let section = &scan.sections[0];
        assert_eq!(section.text, "Deuxièmement, ça évolue");
        assert_eq!(&text[section.start_position..section.end_position], section.text);
    }

    #[test]
    fn test_score_of_sixteen_is_low_and_retained() {
        let mut config = HeuristicConfig::default();
        config.sections.long_sentence_penalty = 16;
        let scorer = SectionScorer::new(Arc::new(config));
        let scan = scorer.scan(&format!("{}.", long_sentence(26)));
        assert_eq!(scan.sections.len(), 1);
        assert_eq!(scan.sections[0].ai_probability, 16);
        assert_eq!(scan.sections[0].suspicion_level, SuspicionLevel::Low);
    }

    #[test]
    fn test_score_at_floor_is_dropped() {
        let mut config = HeuristicConfig::default();
        config.sections.long_sentence_penalty = 15;
        let scorer = SectionScorer::new(Arc::new(config));
        assert!(scorer.scan(&format!("{}.", long_sentence(26))).sections.is_empty());
    }

    #[test]
    fn test_huge_penalties_saturate() {
        let mut config = HeuristicConfig::default();
        config.sections.boilerplate_penalty = u32::MAX;
        config.sections.enumeration_penalty = 10;
        let scorer = SectionScorer::new(Arc::new(config));
        let sentence = "Enfin il est important de partir";
        assert_eq!(scorer.score_sentence(sentence).score, u32::MAX);

        let scan = scorer.scan("Enfin il est important de partir.");
        assert_eq!(scan.sections.len(), 1);
        assert_eq!(scan.sections[0].ai_probability, 100);
        assert_eq!(scan.sections[0].suspicion_level, SuspicionLevel::High);
    }

    #[test]
    fn test_unlocatable_sentence_is_skipped() {
        let text = "Enfin un. Enfin deux.";
        let scan = scorer().scan_sentences(text, &["Enfin un", " Enfin zéro", " Enfin deux"]);
        assert_eq!(scan.misses.len(), 1);
        assert_eq!(scan.misses[0].sentence_index, 1);
        assert_eq!(scan.misses[0].cursor, 8);
        let texts: Vec<&str> = scan.sections.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Enfin un", "Enfin deux"]);
    }

    #[test]
    fn test_locate_from_cursor() {
        assert_eq!(locate("abc abc", "abc", 0), Some(0));
        assert_eq!(locate("abc abc", "abc", 1), Some(4));
        assert_eq!(locate("abc abc", "abc", 5), None);
        assert_eq!(locate("abc", "abc", 10), None);
    }
}
