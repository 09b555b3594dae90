//! Deterministic overrides of model verdicts
//!
//! Facts the document can answer mechanically (its page count) never depend
//! on the model: when a rule is recognized, the model's verdict is replaced
//! by a locally computed one with full confidence.

use std::fmt;

use shared_types::{Verdict, VerdictStatus};
use tracing::debug;

use crate::patterns::is_minimum_two_pages_rule;

/// Deterministic check a recognized rule is answered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    MinimumPageCount { min_pages: u32 },
}

impl OverrideKind {
    /// Verdict for `rule` computed from the document alone
    pub fn evaluate(&self, rule: &str, page_count: u32) -> Verdict {
        match *self {
            OverrideKind::MinimumPageCount { min_pages } => {
                let passed = page_count >= min_pages;
                let (evidence, reasoning) = if passed {
                    (
                        format!(
                            "Document has {} pages, which is at least {}.",
                            page_count, min_pages
                        ),
                        "Using the PDF metadata, the document length satisfies the minimum page requirement.",
                    )
                } else {
                    (
                        format!(
                            "Document has only {} page(s), which is less than {}.",
                            page_count, min_pages
                        ),
                        "Using the PDF metadata, the document length does not satisfy the minimum page requirement.",
                    )
                };

                Verdict {
                    rule: rule.to_string(),
                    status: VerdictStatus::from_passed(passed),
                    evidence,
                    reasoning: reasoning.to_string(),
                    confidence: 100.0,
                }
            }
        }
    }
}

/// Recognizer paired with the check it triggers
#[derive(Clone, Copy)]
pub struct RuleOverride {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub kind: OverrideKind,
}

impl fmt::Debug for RuleOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleOverride")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Ordered set of overrides; the first matching entry wins.
#[derive(Debug, Clone)]
pub struct RuleOverrideEngine {
    overrides: Vec<RuleOverride>,
}

impl RuleOverrideEngine {
    pub fn new() -> Self {
        Self {
            overrides: vec![RuleOverride {
                name: "minimum-two-pages",
                matches: is_minimum_two_pages_rule,
                kind: OverrideKind::MinimumPageCount { min_pages: 2 },
            }],
        }
    }

    pub fn with_override(mut self, rule_override: RuleOverride) -> Self {
        self.overrides.push(rule_override);
        self
    }

    /// Override that applies to `rule`, if any
    pub fn find(&self, rule: &str) -> Option<&RuleOverride> {
        self.overrides.iter().find(|o| (o.matches)(rule))
    }

    /// Replace verdicts for recognized rules; pass the rest through.
    ///
    /// `rules[i]` is the original rule text behind `verdicts[i]`.
    pub fn apply(&self, rules: &[String], verdicts: Vec<Verdict>, page_count: u32) -> Vec<Verdict> {
        verdicts
            .into_iter()
            .zip(rules)
            .map(|(verdict, rule)| match self.find(rule) {
                Some(rule_override) => {
                    debug!(
                        rule = %rule,
                        check = rule_override.name,
                        page_count,
                        "Overriding model verdict"
                    );
                    rule_override.kind.evaluate(rule, page_count)
                }
                None => verdict,
            })
            .collect()
    }
}

impl Default for RuleOverrideEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn model_verdict(rule: &str, status: VerdictStatus, confidence: f64) -> Verdict {
        Verdict {
            rule: rule.to_string(),
            status,
            evidence: "model evidence".to_string(),
            reasoning: "model reasoning".to_string(),
            confidence,
        }
    }

    #[test]
    fn test_page_rule_overrides_model_fail() {
        let engine = RuleOverrideEngine::new();
        let rules = vec!["Document should have at least 2 pages.".to_string()];
        let verdicts = vec![model_verdict(&rules[0], VerdictStatus::Fail, 30.0)];

        let result = engine.apply(&rules, verdicts, 3);

        assert_eq!(
            result[0],
            Verdict {
                rule: rules[0].clone(),
                status: VerdictStatus::Pass,
                evidence: "Document has 3 pages, which is at least 2.".to_string(),
                reasoning: "Using the PDF metadata, the document length satisfies the minimum page requirement.".to_string(),
                confidence: 100.0,
            }
        );
    }

    #[test]
    fn test_page_rule_fails_for_single_page() {
        let verdict = OverrideKind::MinimumPageCount { min_pages: 2 }.evaluate("at least two pages", 1);
        assert_eq!(verdict.status, VerdictStatus::Fail);
        assert_eq!(
            verdict.evidence,
            "Document has only 1 page(s), which is less than 2."
        );
        assert_eq!(verdict.confidence, 100.0);
    }

    #[test]
    fn test_other_rules_pass_through() {
        let engine = RuleOverrideEngine::new();
        let rules = vec!["Document should mention supervisor name.".to_string()];
        let original = model_verdict(&rules[0], VerdictStatus::Pass, 88.0);

        let result = engine.apply(&rules, vec![original.clone()], 5);
        assert_eq!(result, vec![original]);
    }

    #[test]
    fn test_matches_on_original_rule_text() {
        // The model echoed a paraphrase; the submitted text decides.
        let engine = RuleOverrideEngine::new();
        let rules = vec!["Must be at least two pages".to_string()];
        let verdicts = vec![model_verdict("length requirement", VerdictStatus::Fail, 10.0)];

        let result = engine.apply(&rules, verdicts, 4);
        assert_eq!(result[0].status, VerdictStatus::Pass);
        assert_eq!(result[0].rule, "Must be at least two pages");
    }

    #[test]
    fn test_custom_override_registration() {
        fn mentions_ten_pages(rule: &str) -> bool {
            rule.to_lowercase().contains("at least 10 pages")
        }

        let engine = RuleOverrideEngine::new().with_override(RuleOverride {
            name: "minimum-ten-pages",
            matches: mentions_ten_pages,
            kind: OverrideKind::MinimumPageCount { min_pages: 10 },
        });
        let rules = vec!["Thesis has at least 10 pages".to_string()];
        let verdicts = vec![model_verdict(&rules[0], VerdictStatus::Pass, 99.0)];

        let result = engine.apply(&rules, verdicts, 4);
        assert_eq!(result[0].status, VerdictStatus::Fail);
        assert_eq!(
            result[0].evidence,
            "Document has only 4 page(s), which is less than 10."
        );
    }

    #[test]
    fn test_order_and_length_preserved() {
        let engine = RuleOverrideEngine::new();
        let rules = vec![
            "Mentions supervisor".to_string(),
            "At least 2 pages".to_string(),
            "Has a title".to_string(),
        ];
        let verdicts = rules
            .iter()
            .map(|r| model_verdict(r, VerdictStatus::Fail, 5.0))
            .collect();

        let result = engine.apply(&rules, verdicts, 2);
        let names: Vec<&str> = result.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(names, vec!["Mentions supervisor", "At least 2 pages", "Has a title"]);
        assert_eq!(result[1].status, VerdictStatus::Pass);
    }

    proptest! {
        /// Property: a page-count rule is always fully confident and passes iff pages >= 2,
        /// whatever the model said
        #[test]
        fn page_rule_ignores_model(
            pages in 0u32..50,
            model_pass in any::<bool>(),
            model_confidence in -1000.0f64..1000.0,
            prefix in "[a-zA-Z ]{0,20}",
        ) {
            let engine = RuleOverrideEngine::new();
            let rules = vec![format!("{}at least two pages", prefix)];
            let verdicts = vec![model_verdict(
                &rules[0],
                VerdictStatus::from_passed(model_pass),
                model_confidence,
            )];

            let result = engine.apply(&rules, verdicts, pages);
            prop_assert_eq!(result[0].confidence, 100.0);
            prop_assert_eq!(result[0].status.is_pass(), pages >= 2);
        }
    }
}
