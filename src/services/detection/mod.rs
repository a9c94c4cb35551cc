// Detection Module
// Rule-based AI text detection, organized into specialized submodules:
// - heuristics: the read-only table of keywords, patterns, weights and thresholds
// - indicators: the indicator library (base and extended sets)
// - aggregation: weighted mean of indicator scores
// - attribution: coarse guess of the model family
// - section_scorer: sentence localization and suspicion scoring
// - highlight: safe inline rendering of the scored sections
// - engine: one analysis run end to end

pub mod aggregation;
pub mod attribution;
pub mod engine;
pub mod error;
pub mod heuristics;
pub mod highlight;
pub mod indicators;
pub mod section_scorer;

pub use aggregation::aggregate_indicators;
pub use attribution::attribute_agent;
pub use engine::DetectionEngine;
pub use error::{DetectionError, LocalizationMiss};
pub use heuristics::{AttributionRule, AttributionRules, HeuristicConfig, IndicatorWeights, SectionRules};
pub use highlight::{html_escape, plan_fragments, render_fragments, render_highlighted, Fragment};
pub use indicators::IndicatorLibrary;
pub use section_scorer::{classify, SectionScan, SectionScorer};
