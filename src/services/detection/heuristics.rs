// Heuristic Tables
// Every keyword list, pattern, weight and threshold the engine reads.
// Built once, shared read-only by the indicator library, the section scorer
// and the attribution rules; alternate tables can be loaded from config.json.

use super::error::DetectionError;
use crate::models::IndicatorKind;
use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeuristicConfig {
    pub weights: IndicatorWeights,
    pub transition_markers: Vec<String>,
    /// A marker sentence following one that contains this word counts as a chained transition.
    pub chaining_marker: String,
    pub complex_structure_patterns: Vec<String>,
    pub temporal_markers: Vec<String>,
    pub lexical_domains: Vec<LexicalDomain>,
    pub argumentative_markers: Vec<String>,
    pub stylistic_patterns: Vec<String>,
    pub formal_register: Vec<String>,
    pub informal_register: Vec<String>,
    pub emotional_words: Vec<String>,
    pub cultural_references: Vec<String>,
    pub common_concepts: Vec<String>,
    pub tense_patterns: TensePatterns,
    pub generic_words: Vec<String>,
    pub sections: SectionRules,
    pub attribution: AttributionRules,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            weights: IndicatorWeights::default(),
            transition_markers: strings(&[
                "cependant",
                "néanmoins",
                "toutefois",
                "en outre",
                "par ailleurs",
                "de plus",
                "en effet",
                "ainsi",
                "par conséquent",
                "donc",
                "en revanche",
                "au contraire",
                "malgré tout",
                "bien que",
            ]),
            chaining_marker: "ainsi".to_string(),
            complex_structure_patterns: strings(&[
                r"(?i)\b(qui|que|dont|où)\b.*\b(qui|que|dont|où)\b",
                r"(?i)\b(bien que|quoique|malgré que)\b",
                r"(?i)\b(afin que|pour que|de sorte que)\b",
                r"(?i)\b(si.*alors|si.*,.*)",
            ]),
            temporal_markers: strings(&[
                "aujourd'hui",
                "actuellement",
                "de nos jours",
                "à l'heure actuelle",
                "récemment",
                "dernièrement",
                "auparavant",
                "jadis",
                "autrefois",
            ]),
            lexical_domains: vec![
                LexicalDomain::new(
                    "education",
                    &["étudiant", "école", "université", "cours", "professeur", "apprentissage"],
                ),
                LexicalDomain::new(
                    "technology",
                    &["technologie", "numérique", "ordinateur", "internet", "logiciel"],
                ),
                LexicalDomain::new(
                    "society",
                    &["société", "social", "communauté", "culture", "politique"],
                ),
                LexicalDomain::new(
                    "science",
                    &["recherche", "étude", "analyse", "méthode", "résultat", "données"],
                ),
            ],
            argumentative_markers: strings(&[
                "premièrement",
                "deuxièmement",
                "troisièmement",
                "enfin",
                "d'une part",
                "d'autre part",
                "en premier lieu",
                "en conclusion",
            ]),
            stylistic_patterns: strings(&[
                r"(?i)\b(il est important de|il convient de|il faut noter que)\b",
                r"(?i)\b(en résumé|pour conclure|en définitive)\b",
                r"(?i)\b(par exemple|notamment|en particulier)\b.*\b(par exemple|notamment|en particulier)\b",
            ]),
            formal_register: strings(&[
                "néanmoins",
                "toutefois",
                "cependant",
                "par conséquent",
                "en outre",
            ]),
            informal_register: strings(&["bon", "alors", "du coup", "en fait", "quand même"]),
            emotional_words: strings(&[
                "magnifique",
                "extraordinaire",
                "fantastique",
                "merveilleux",
                "terrible",
                "affreux",
                "catastrophique",
                "dramatique",
            ]),
            cultural_references: strings(&[
                "molière",
                "voltaire",
                "napoleon",
                "révolution française",
                "baguette",
            ]),
            common_concepts: strings(&[
                "développement durable",
                "intelligence artificielle",
                "mondialisation",
                "changement climatique",
                "société moderne",
            ]),
            tense_patterns: TensePatterns::default(),
            generic_words: strings(&[
                "chose",
                "important",
                "problème",
                "solution",
                "exemple",
                "situation",
            ]),
            sections: SectionRules::default(),
            attribution: AttributionRules::default(),
        }
    }
}

fn invalid(message: String) -> DetectionError {
    DetectionError::InvalidConfig(message)
}

fn check_keywords(list: &str, items: &[String]) -> Result<(), DetectionError> {
    match items.iter().position(|item| item.trim().is_empty()) {
        Some(index) => Err(invalid(format!("{}[{}] is empty", list, index))),
        None => Ok(()),
    }
}

impl HeuristicConfig {
    /// Rejects tables that would score nonsense: non-positive or non-finite weights,
    /// and blank keywords (a blank keyword matches everywhere).
    pub fn validate(&self) -> Result<(), DetectionError> {
        for kind in IndicatorKind::BASE.iter().chain(IndicatorKind::EXTENDED.iter()) {
            let weight = self.weights.weight(*kind);
            if !weight.is_finite() || weight <= 0.0 {
                return Err(invalid(format!(
                    "weight for {:?} must be a positive number, got {}",
                    kind, weight
                )));
            }
        }

        if self.chaining_marker.trim().is_empty() {
            return Err(invalid("chainingMarker is empty".to_string()));
        }

        check_keywords("transitionMarkers", &self.transition_markers)?;
        check_keywords("complexStructurePatterns", &self.complex_structure_patterns)?;
        check_keywords("temporalMarkers", &self.temporal_markers)?;
        check_keywords("argumentativeMarkers", &self.argumentative_markers)?;
        check_keywords("stylisticPatterns", &self.stylistic_patterns)?;
        check_keywords("formalRegister", &self.formal_register)?;
        check_keywords("informalRegister", &self.informal_register)?;
        check_keywords("emotionalWords", &self.emotional_words)?;
        check_keywords("culturalReferences", &self.cultural_references)?;
        check_keywords("commonConcepts", &self.common_concepts)?;
        check_keywords("genericWords", &self.generic_words)?;
        for domain in &self.lexical_domains {
            check_keywords(&format!("lexicalDomains.{}", domain.name), &domain.words)?;
        }
        check_keywords("sections.boilerplatePhrases", &self.sections.boilerplate_phrases)?;
        check_keywords("sections.enumerationOpeners", &self.sections.enumeration_openers)?;

        let attribution = &self.attribution;
        if !attribution.high_score_threshold.is_finite()
            || attribution.rules.iter().any(|r| !r.above.is_finite())
        {
            return Err(invalid("attribution thresholds must be finite".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndicatorWeights {
    pub sentence_length: f64,
    pub vocabulary_repetition: f64,
    pub transitions: f64,
    pub syntax_complexity: f64,
    pub temporal_markers: f64,
    pub lexical_coherence: f64,
    pub punctuation_patterns: f64,
    pub argumentative_structure: f64,
    pub stylistic_patterns: f64,
    pub register_imbalance: f64,
    pub emotional_intensity: f64,
    pub cultural_references: f64,
    pub conceptual_originality: f64,
    pub tense_distribution: f64,
    pub generic_vocabulary: f64,
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            sentence_length: 1.2,
            vocabulary_repetition: 1.5,
            transitions: 1.3,
            syntax_complexity: 1.4,
            temporal_markers: 1.1,
            lexical_coherence: 1.6,
            punctuation_patterns: 1.0,
            argumentative_structure: 1.3,
            stylistic_patterns: 1.8,
            register_imbalance: 1.5,
            emotional_intensity: 1.4,
            cultural_references: 1.2,
            conceptual_originality: 1.7,
            tense_distribution: 1.3,
            generic_vocabulary: 1.4,
        }
    }
}

impl IndicatorWeights {
    pub fn weight(&self, kind: IndicatorKind) -> f64 {
        match kind {
            IndicatorKind::SentenceLength => self.sentence_length,
            IndicatorKind::VocabularyRepetition => self.vocabulary_repetition,
            IndicatorKind::Transitions => self.transitions,
            IndicatorKind::SyntaxComplexity => self.syntax_complexity,
            IndicatorKind::TemporalMarkers => self.temporal_markers,
            IndicatorKind::LexicalCoherence => self.lexical_coherence,
            IndicatorKind::PunctuationPatterns => self.punctuation_patterns,
            IndicatorKind::ArgumentativeStructure => self.argumentative_structure,
            IndicatorKind::StylisticPatterns => self.stylistic_patterns,
            IndicatorKind::RegisterImbalance => self.register_imbalance,
            IndicatorKind::EmotionalIntensity => self.emotional_intensity,
            IndicatorKind::CulturalReferences => self.cultural_references,
            IndicatorKind::ConceptualOriginality => self.conceptual_originality,
            IndicatorKind::TenseDistribution => self.tense_distribution,
            IndicatorKind::GenericVocabulary => self.generic_vocabulary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexicalDomain {
    pub name: String,
    pub words: Vec<String>,
}

impl LexicalDomain {
    fn new(name: &str, words: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            words: strings(words),
        }
    }
}

/// Verb-ending patterns; crude on purpose, they only feed a distribution skew.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TensePatterns {
    pub past: String,
    pub present: String,
    pub future: String,
}

impl Default for TensePatterns {
    fn default() -> Self {
        Self {
            past: r"\b\w+ait\b|\b\w+aient\b".to_string(),
            present: r"\b\w+e\b|\b\w+ent\b".to_string(),
            future: r"\b\w+era\b|\b\w+eront\b".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionRules {
    pub boilerplate_phrases: Vec<String>,
    pub boilerplate_penalty: u32,
    pub boilerplate_reason: String,
    /// Strictly more words than this triggers the long-sentence penalty.
    pub long_sentence_words: usize,
    pub long_sentence_penalty: u32,
    pub long_sentence_reason: String,
    /// Matched case-insensitively at the very start of the trimmed sentence.
    pub enumeration_openers: Vec<String>,
    pub enumeration_penalty: u32,
    pub enumeration_reason: String,
    /// Sections are emitted only when their score is strictly above this floor.
    pub retain_above: u32,
    pub high_above: u32,
    pub medium_above: u32,
    pub default_reasoning: String,
}

impl Default for SectionRules {
    fn default() -> Self {
        Self {
            boilerplate_phrases: strings(&["il est important de"]),
            boilerplate_penalty: 30,
            boilerplate_reason: "Expression typique d'IA".to_string(),
            long_sentence_words: 25,
            long_sentence_penalty: 20,
            long_sentence_reason: "Phrase anormalement longue".to_string(),
            enumeration_openers: strings(&["premièrement", "deuxièmement", "enfin"]),
            enumeration_penalty: 25,
            enumeration_reason: "Structure artificielle".to_string(),
            retain_above: 15,
            high_above: 50,
            medium_above: 25,
            default_reasoning: "Analyse contextuelle".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionRule {
    pub indicator: IndicatorKind,
    /// The indicator must score strictly above this value.
    pub above: f64,
    pub agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttributionRules {
    pub high_score_threshold: f64,
    pub min_high_scores: usize,
    /// Checked in order, first match wins.
    pub rules: Vec<AttributionRule>,
}

impl Default for AttributionRules {
    fn default() -> Self {
        Self {
            high_score_threshold: 70.0,
            min_high_scores: 3,
            rules: vec![
                AttributionRule {
                    indicator: IndicatorKind::ArgumentativeStructure,
                    above: 80.0,
                    agent: "ChatGPT/GPT-4".to_string(),
                },
                AttributionRule {
                    indicator: IndicatorKind::StylisticPatterns,
                    above: 75.0,
                    agent: "Claude/Gemini".to_string(),
                },
                AttributionRule {
                    indicator: IndicatorKind::VocabularyRepetition,
                    above: 70.0,
                    agent: "Generic model".to_string(),
                },
            ],
        }
    }
}
