//! Ordered `(pattern, value)` heuristics keyed by a case-insensitive
//! substring of the lever name. `{lever}` in an action is replaced by the
//! lever itself.

/// First match wins.
pub const ACTION_RULES: &[(&str, &str)] = &[
    ("discount", "Test a time-limited discount on {lever} against full price"),
    ("pric", "Run a price test varying {lever} across randomized cohorts"),
    ("marketing", "Reallocate {lever} toward the best-performing channel in a holdout test"),
    ("budget", "Increase {lever} by a fixed increment for the treatment group"),
    ("advertis", "A/B test new creative and targeting for {lever}"),
    ("onboarding", "Ship a streamlined {lever} flow to a random share of new users"),
    ("email", "Test a revised {lever} sequence against the current cadence"),
    ("support", "Offer proactive {lever} to the treatment group"),
    ("feature", "Roll out {lever} behind a feature flag to a random cohort"),
    ("content", "Publish targeted {lever} for the treatment segment"),
    ("retention", "Launch a {lever} incentive for at-risk users"),
];

pub const FALLBACK_ACTION: &str = "Optimize {lever} via controlled experimentation";

/// Applied to every experiment.
pub const BASE_GUARDRAILS: &[&str] = &["revenue per user", "customer satisfaction", "churn rate"];

/// All matches apply, in table order.
pub const GUARDRAIL_RULES: &[(&str, &str)] = &[
    ("cost", "cost per acquisition"),
    ("spend", "cost per acquisition"),
    ("budget", "cost per acquisition"),
    ("marketing", "cost per acquisition"),
    ("advertis", "cost per acquisition"),
    ("discount", "gross margin"),
    ("pric", "gross margin"),
    ("pric", "conversion rate"),
    ("email", "unsubscribe rate"),
    ("support", "support ticket volume"),
    ("onboarding", "activation rate"),
    ("feature", "error rate"),
];

pub fn action_for(lever: &str) -> String {
    let lowered = lever.to_lowercase();
    let template = ACTION_RULES
        .iter()
        .find(|(pattern, _)| lowered.contains(pattern))
        .map(|(_, action)| *action)
        .unwrap_or(FALLBACK_ACTION);
    template.replace("{lever}", lever)
}

/// Base guardrails followed by every matching lever-specific one,
/// without duplicates.
pub fn guardrails_for(lever: &str) -> Vec<String> {
    let lowered = lever.to_lowercase();
    let mut guardrails: Vec<String> = Vec::new();
    let specific = GUARDRAIL_RULES
        .iter()
        .filter(|(pattern, _)| lowered.contains(pattern))
        .map(|(_, guardrail)| *guardrail);

    for guardrail in BASE_GUARDRAILS.iter().copied().chain(specific) {
        if !guardrails.iter().any(|g| g == guardrail) {
            guardrails.push(guardrail.to_string());
        }
    }
    guardrails
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_action_wins() {
        assert_eq!(
            action_for("Discount Pricing"),
            "Test a time-limited discount on Discount Pricing against full price"
        );
        assert_eq!(
            action_for("Marketing Budget"),
            "Reallocate Marketing Budget toward the best-performing channel in a holdout test"
        );
    }

    #[test]
    fn test_fallback_action() {
        assert_eq!(
            action_for("Weather"),
            "Optimize Weather via controlled experimentation"
        );
    }

    #[test]
    fn test_cost_levers_add_acquisition_guardrail_once() {
        let guardrails = guardrails_for("Marketing Spend");
        assert_eq!(
            guardrails,
            vec![
                "revenue per user",
                "customer satisfaction",
                "churn rate",
                "cost per acquisition"
            ]
        );
    }

    #[test]
    fn test_unmatched_lever_gets_base_guardrails() {
        assert_eq!(guardrails_for("Weather"), BASE_GUARDRAILS.to_vec());
    }
}
