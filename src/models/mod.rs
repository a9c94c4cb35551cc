// Detectia Data Models
// Shapes exchanged between the engine, the analysis boundary and the store

use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Analysis Type ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Quick,
    Advanced,
}

impl AnalysisType {
    /// Strict parse of the wire value; anything but `quick`/`advanced` is rejected.
    pub fn parse(val: &str) -> Option<Self> {
        match val {
            "quick" => Some(Self::Quick),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Advanced => "advanced",
        }
    }

    pub fn includes_extended(&self) -> bool {
        matches!(self, Self::Advanced)
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Indicators ============

/// Closed set of indicators the library knows how to compute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndicatorKind {
    SentenceLength,
    VocabularyRepetition,
    Transitions,
    SyntaxComplexity,
    TemporalMarkers,
    LexicalCoherence,
    PunctuationPatterns,
    ArgumentativeStructure,
    StylisticPatterns,
    RegisterImbalance,
    EmotionalIntensity,
    CulturalReferences,
    ConceptualOriginality,
    TenseDistribution,
    GenericVocabulary,
}

impl IndicatorKind {
    /// Always computed, in output order.
    pub const BASE: [IndicatorKind; 8] = [
        Self::SentenceLength,
        Self::VocabularyRepetition,
        Self::Transitions,
        Self::SyntaxComplexity,
        Self::TemporalMarkers,
        Self::LexicalCoherence,
        Self::PunctuationPatterns,
        Self::ArgumentativeStructure,
    ];

    /// Computed for advanced analyses only, appended after the base set.
    pub const EXTENDED: [IndicatorKind; 7] = [
        Self::StylisticPatterns,
        Self::RegisterImbalance,
        Self::EmotionalIntensity,
        Self::CulturalReferences,
        Self::ConceptualOriginality,
        Self::TenseDistribution,
        Self::GenericVocabulary,
    ];

    /// Display name, unique within a run.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SentenceLength => "Longueur des phrases",
            Self::VocabularyRepetition => "Vocabulaire répétitif",
            Self::Transitions => "Transition entre idées",
            Self::SyntaxComplexity => "Complexité syntaxique",
            Self::TemporalMarkers => "Marqueurs temporels",
            Self::LexicalCoherence => "Cohérence lexicale",
            Self::PunctuationPatterns => "Patterns de ponctuation",
            Self::ArgumentativeStructure => "Structure argumentative",
            Self::StylisticPatterns => "Analyse stylistique",
            Self::RegisterImbalance => "Métadonnées linguistiques",
            Self::EmotionalIntensity => "Émotions et subjectivité",
            Self::CulturalReferences => "Références culturelles",
            Self::ConceptualOriginality => "Originalité conceptuelle",
            Self::TenseDistribution => "Cohérence temporelle",
            Self::GenericVocabulary => "Spécificité du domaine",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SentenceLength => "Mesure la régularité de la longueur des phrases",
            Self::VocabularyRepetition => "Détecte l'usage répétitif de mots ou expressions",
            Self::Transitions => "Analyse la fluidité des transitions",
            Self::SyntaxComplexity => "Évalue la complexité des structures de phrases",
            Self::TemporalMarkers => "Détecte l'usage artificiel de marqueurs temporels",
            Self::LexicalCoherence => "Mesure la cohérence du vocabulaire utilisé",
            Self::PunctuationPatterns => "Analyse les patterns de ponctuation",
            Self::ArgumentativeStructure => "Évalue la structure des arguments",
            Self::StylisticPatterns => "Détecte les patterns stylistiques d'IA",
            Self::RegisterImbalance => "Analyse des métadonnées linguistiques",
            Self::EmotionalIntensity => "Détecte l'artificialité des émotions",
            Self::CulturalReferences => "Analyse la pertinence des références",
            Self::ConceptualOriginality => "Mesure l'originalité des concepts",
            Self::TenseDistribution => "Vérifie la cohérence temporelle",
            Self::GenericVocabulary => "Évalue la spécificité du vocabulaire",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    #[serde(rename = "id")]
    pub kind: IndicatorKind,
    pub name: String,
    /// Always within [0, 100].
    pub score: f64,
    pub description: String,
    pub weight: f64,
}

impl Indicator {
    pub fn new(kind: IndicatorKind, score: f64, weight: f64) -> Self {
        Self {
            kind,
            name: kind.label().to_string(),
            score: clamp_score(score),
            description: kind.description().to_string(),
            weight,
        }
    }
}

/// Bound a raw heuristic value to [0, 100]; NaN collapses to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

// ============ Sections ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspicionLevel {
    Low,
    Medium,
    High,
}

impl SuspicionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Verbatim slice of the original text.
    pub text: String,
    /// UTF-8 byte offset (0-based) into the original text.
    pub start_position: usize,
    /// UTF-8 byte offset (0-based, end-exclusive) into the original text.
    pub end_position: usize,
    pub suspicion_level: SuspicionLevel,
    pub ai_probability: u8,
    pub reasoning: String,
}

// ============ Analysis Result ============

/// Which attribution rule fired, so every label can be traced back to its trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAttribution {
    pub agent: String,
    pub indicator: IndicatorKind,
    pub score: f64,
    pub threshold: f64,
    pub high_score_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Assigned by the store once the result has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub ai_probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspected_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<AgentAttribution>,
    pub indicators: Vec<Indicator>,
    pub sections: Vec<Section>,
    pub original_text: String,
    pub analysis_type: AnalysisType,
}

// ============ Boundary Requests & Responses ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub analysis_type: Option<String>,
}

/// A document handed over by the upload layer.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Missing means quick, like the upload form.
    pub analysis_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysisResponse {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub file_name: String,
    pub file_size: u64,
    pub extracted_text_length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_type_parse_is_strict() {
        assert_eq!(AnalysisType::parse("quick"), Some(AnalysisType::Quick));
        assert_eq!(AnalysisType::parse("advanced"), Some(AnalysisType::Advanced));
        assert_eq!(AnalysisType::parse("Advanced"), None);
        assert_eq!(AnalysisType::parse(""), None);
    }

    #[test]
    fn test_indicator_labels_are_unique() {
        let mut labels: Vec<&str> = IndicatorKind::BASE
            .iter()
            .chain(IndicatorKind::EXTENDED.iter())
            .map(|k| k.label())
            .collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 15);
    }

    #[test]
    fn test_indicator_new_clamps_score() {
        assert_eq!(Indicator::new(IndicatorKind::SentenceLength, 140.0, 1.2).score, 100.0);
        assert_eq!(Indicator::new(IndicatorKind::SentenceLength, -3.0, 1.2).score, 0.0);
        assert_eq!(Indicator::new(IndicatorKind::SentenceLength, f64::NAN, 1.2).score, 0.0);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = AnalysisResult {
            id: None,
            ai_probability: 42.5,
            suspected_agent: None,
            attribution: None,
            indicators: vec![Indicator::new(IndicatorKind::ArgumentativeStructure, 10.0, 1.3)],
            sections: vec![Section {
                text: "Enfin".to_string(),
                start_position: 0,
                end_position: 5,
                suspicion_level: SuspicionLevel::Low,
                ai_probability: 25,
                reasoning: "Structure artificielle".to_string(),
            }],
            original_text: "Enfin.".to_string(),
            analysis_type: AnalysisType::Quick,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["aiProbability"], 42.5);
        assert_eq!(json["analysisType"], "quick");
        assert_eq!(json["indicators"][0]["id"], "argumentativeStructure");
        assert_eq!(json["indicators"][0]["name"], "Structure argumentative");
        assert_eq!(json["sections"][0]["startPosition"], 0);
        assert_eq!(json["sections"][0]["suspicionLevel"], "low");
        assert!(json.get("id").is_none());
        assert!(json.get("suspectedAgent").is_none());
    }
}
