// Detection Engine
// One analysis run: decomposition -> indicators -> aggregation -> attribution,
// with the section scan over the same decomposition.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::models::{AnalysisResult, AnalysisType};
use crate::services::text_processor::TextDecomposition;

use super::aggregation::aggregate_indicators;
use super::attribution::attribute_agent;
use super::error::DetectionError;
use super::heuristics::HeuristicConfig;
use super::highlight::render_highlighted;
use super::indicators::IndicatorLibrary;
use super::section_scorer::SectionScorer;

/// Stateless across runs; share it behind an `Arc` between callers.
pub struct DetectionEngine {
    config: Arc<HeuristicConfig>,
    library: IndicatorLibrary,
    scorer: SectionScorer,
}

impl DetectionEngine {
    pub fn new(config: Arc<HeuristicConfig>) -> Result<Self, DetectionError> {
        if let Err(e) = config.validate() {
            error!("[ENGINE] Rejected heuristic configuration: {}", e);
            return Err(e);
        }
        let library = IndicatorLibrary::new(config.clone())?;
        let scorer = SectionScorer::new(config.clone());
        Ok(Self {
            config,
            library,
            scorer,
        })
    }

    pub fn with_defaults() -> Result<Self, DetectionError> {
        Self::new(Arc::new(HeuristicConfig::default()))
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    pub fn analyze(&self, text: &str, analysis_type: AnalysisType) -> Result<AnalysisResult, DetectionError> {
        let started = Instant::now();
        let doc = TextDecomposition::new(text);

        let indicators = self.library.compute(&doc, analysis_type);
        let ai_probability = match aggregate_indicators(&indicators) {
            Ok(p) => p,
            Err(e) => {
                error!("[ENGINE] Aggregation failed: {}", e);
                return Err(e);
            }
        };

        let attribution = attribute_agent(&indicators, &self.config.attribution);

        let scan = self.scorer.scan_sentences(text, &doc.sentences);
        if !scan.misses.is_empty() {
            warn!(
                misses = scan.misses.len(),
                sentences = doc.sentences.len(),
                "[ENGINE] Some sentences could not be located and were left out of the sections"
            );
        }

        info!(
            analysis_type = analysis_type.as_str(),
            words = doc.words.len(),
            sentences = doc.sentences.len(),
            indicators = indicators.len(),
            sections = scan.sections.len(),
            ai_probability,
            agent = attribution.as_ref().map(|a| a.agent.as_str()).unwrap_or("unknown"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis.completed"
        );

        Ok(AnalysisResult {
            id: None,
            ai_probability,
            suspected_agent: attribution.as_ref().map(|a| a.agent.clone()),
            attribution,
            indicators,
            sections: scan.sections,
            original_text: text.to_string(),
            analysis_type,
        })
    }

    /// Escaped HTML of the analysed text with its sections highlighted
    pub fn render(&self, result: &AnalysisResult) -> String {
        render_highlighted(&result.original_text, &result.sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SuspicionLevel;
    use crate::services::detection::heuristics::IndicatorWeights;

    const SAMPLE: &str = "Premièrement, il est important de souligner que la technologie \
        transforme notre société. Cependant, les défis restent nombreux. En outre, \
        l'innovation permet de résoudre des problèmes complexes. Enfin, il faut \
        considérer l'impact sur l'environnement et sur l'éducation.";

    fn engine() -> DetectionEngine {
        DetectionEngine::with_defaults().unwrap()
    }

    #[test]
    fn test_quick_has_base_indicators() {
        let result = engine().analyze(SAMPLE, AnalysisType::Quick).unwrap();
        assert_eq!(result.indicators.len(), 8);
        assert_eq!(result.analysis_type, AnalysisType::Quick);
    }

    #[test]
    fn test_advanced_has_all_indicators() {
        let result = engine().analyze(SAMPLE, AnalysisType::Advanced).unwrap();
        assert_eq!(result.indicators.len(), 15);
    }

    #[test]
    fn test_result_is_bounded() {
        let result = engine().analyze(SAMPLE, AnalysisType::Advanced).unwrap();
        assert!((0.0..=100.0).contains(&result.ai_probability));
        for indicator in &result.indicators {
            assert!((0.0..=100.0).contains(&indicator.score), "{:?}", indicator);
        }
        assert!(result.id.is_none());
        assert_eq!(result.original_text, SAMPLE);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let engine = engine();
        let first = engine.analyze(SAMPLE, AnalysisType::Advanced).unwrap();
        let second = engine.analyze(SAMPLE, AnalysisType::Advanced).unwrap();
        assert_eq!(first.ai_probability, second.ai_probability);
        let scores = |r: &AnalysisResult| r.indicators.iter().map(|i| i.score).collect::<Vec<_>>();
        assert_eq!(scores(&first), scores(&second));
        assert_eq!(first.sections, second.sections);
    }

    #[test]
    fn test_sections_slice_original_text() {
        let result = engine().analyze(SAMPLE, AnalysisType::Quick).unwrap();
        assert!(!result.sections.is_empty());
        for section in &result.sections {
            assert!(section.start_position < section.end_position);
            assert_eq!(&SAMPLE[section.start_position..section.end_position], section.text);
        }
        let starts: Vec<usize> = result.sections.iter().map(|s| s.start_position).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
        assert_eq!(result.sections[0].suspicion_level, SuspicionLevel::High);
    }

    #[test]
    fn test_non_positive_weights_fail_construction() {
        let mut config = HeuristicConfig::default();
        config.weights = IndicatorWeights {
            sentence_length: -9.0,
            ..IndicatorWeights::default()
        };
        assert!(matches!(
            DetectionEngine::new(Arc::new(config)),
            Err(DetectionError::InvalidConfig(_))
        ));

        let mut config = HeuristicConfig::default();
        config.weights.tense_distribution = 0.0;
        assert!(matches!(
            DetectionEngine::new(Arc::new(config)),
            Err(DetectionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_blank_keyword_fails_construction() {
        let mut config = HeuristicConfig::default();
        config.emotional_words.push(String::new());
        assert!(matches!(
            DetectionEngine::new(Arc::new(config)),
            Err(DetectionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_saturated_penalty_still_analyzes() {
        let mut config = HeuristicConfig::default();
        config.sections.boilerplate_penalty = u32::MAX;
        config.sections.enumeration_penalty = 10;
        let engine = DetectionEngine::new(Arc::new(config)).unwrap();
        let result = engine
            .analyze("Enfin il est important de partir.", AnalysisType::Quick)
            .unwrap();
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].ai_probability, 100);
        assert_eq!(result.sections[0].suspicion_level, SuspicionLevel::High);
    }

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let mut config = HeuristicConfig::default();
        config.stylistic_patterns = vec!["(unclosed".to_string()];
        assert!(matches!(
            DetectionEngine::new(Arc::new(config)),
            Err(DetectionError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_render_wraps_sections() {
        let engine = engine();
        let result = engine.analyze(SAMPLE, AnalysisType::Quick).unwrap();
        let html = engine.render(&result);
        assert_eq!(html.matches("<span").count(), result.sections.len());
    }
}
