// Agent Attribution
// Coarse, rule-based guess of the model family behind a text.
// Only fires when enough indicators are high; the rule that fired is returned
// with the label so the guess stays auditable.

use crate::models::{AgentAttribution, Indicator};

use super::heuristics::AttributionRules;

pub fn attribute_agent(indicators: &[Indicator], rules: &AttributionRules) -> Option<AgentAttribution> {
    let high_score_count = indicators
        .iter()
        .filter(|i| i.score > rules.high_score_threshold)
        .count();

    if high_score_count < rules.min_high_scores {
        return None;
    }

    rules.rules.iter().find_map(|rule| {
        indicators
            .iter()
            .find(|i| i.kind == rule.indicator && i.score > rule.above)
            .map(|i| AgentAttribution {
                agent: rule.agent.clone(),
                indicator: rule.indicator,
                score: i.score,
                threshold: rule.above,
                high_score_count,
            })
    })
}
