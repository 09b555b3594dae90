//! Analysis pipeline
//!
//! clean rules → extract → page bounds → truncate → judge → overrides → result.
//! Every step either yields a normalized value or aborts the whole request;
//! there are no partial results and no retries at this level.

use model_judge::{truncate_text, ModelJudge};
use shared_pdf::{extract_document, ExtractionError, PdfDocument};
use shared_types::{AnalysisResult, UploadedFile};
use tracing::{debug, info};

use crate::error::AnalysisError;
use crate::overrides::RuleOverrideEngine;

/// Document and request bounds enforced before the model is called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineLimits {
    pub min_pages: u32,
    pub max_pages: u32,
    pub max_rules: usize,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            min_pages: 2,
            max_pages: 10,
            max_rules: 3,
        }
    }
}

/// Trim every rule slot and drop the empty ones, keeping order.
pub fn clean_rules<S: AsRef<str>>(
    raw_rules: &[S],
    max_rules: usize,
) -> Result<Vec<String>, AnalysisError> {
    let cleaned: Vec<String> = raw_rules
        .iter()
        .map(|r| r.as_ref().trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    if cleaned.is_empty() {
        return Err(AnalysisError::Validation(
            "At least one rule is required".to_string(),
        ));
    }
    if cleaned.len() > max_rules {
        return Err(AnalysisError::Validation(format!(
            "At most {} rules are supported",
            max_rules
        )));
    }

    Ok(cleaned)
}

pub fn check_page_bounds(page_count: u32, limits: &PipelineLimits) -> Result<(), AnalysisError> {
    if page_count < limits.min_pages || page_count > limits.max_pages {
        return Err(AnalysisError::PageCount {
            pages: page_count,
            min: limits.min_pages,
            max: limits.max_pages,
        });
    }
    Ok(())
}

/// Orchestrates one analysis request. Holds no per-request state, so one
/// instance can serve concurrent requests.
#[derive(Clone)]
pub struct AnalysisPipeline {
    judge: ModelJudge,
    overrides: RuleOverrideEngine,
    limits: PipelineLimits,
}

impl AnalysisPipeline {
    pub fn new(judge: ModelJudge) -> Self {
        Self {
            judge,
            overrides: RuleOverrideEngine::default(),
            limits: PipelineLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: PipelineLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_overrides(mut self, overrides: RuleOverrideEngine) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn limits(&self) -> &PipelineLimits {
        &self.limits
    }

    /// Check `raw_rules` against the uploaded PDF.
    ///
    /// # Errors
    /// - `AnalysisError::Validation` - no non-empty rule, or too many rules
    /// - `AnalysisError::Extraction` - the buffer is not a readable PDF
    /// - `AnalysisError::PageCount` - page count outside the configured bounds
    /// - `AnalysisError::Judge` - model call failed or replied with garbage
    pub async fn analyze<S: AsRef<str> + Sync>(
        &self,
        file: UploadedFile,
        raw_rules: &[S],
    ) -> Result<AnalysisResult, AnalysisError> {
        let rules = clean_rules(raw_rules, self.limits.max_rules)?;
        let UploadedFile { file_name, bytes } = file;

        info!(
            "Analyzing {} ({} bytes) against {} rule(s)",
            file_name,
            bytes.len(),
            rules.len()
        );

        let document = extract(bytes).await?;
        check_page_bounds(document.page_count, &self.limits)?;

        let text = truncate_text(&document.text);
        debug!(
            total_chars = document.text.chars().count(),
            sent_chars = text.chars().count(),
            "Document text prepared"
        );

        let verdicts = self.judge.judge(text, &rules).await?;
        let results = self.overrides.apply(&rules, verdicts, document.page_count);

        info!(
            "Analysis of {} complete: {}/{} rules passed",
            file_name,
            results.iter().filter(|v| v.status.is_pass()).count(),
            results.len()
        );

        Ok(AnalysisResult {
            file_name,
            total_pages: document.page_count,
            results,
        })
    }
}

/// Run extraction on the blocking pool; pdf-extract is CPU-bound and can
/// panic on unusual font encodings.
async fn extract(bytes: Vec<u8>) -> Result<PdfDocument, AnalysisError> {
    let outcome = tokio::task::spawn_blocking(move || extract_document(&bytes))
        .await
        .map_err(|e| {
            if e.is_panic() {
                AnalysisError::Extraction(ExtractionError::TextExtraction(
                    "PDF text extraction panicked".to_string(),
                ))
            } else {
                AnalysisError::Internal(e.to_string())
            }
        })?;

    Ok(outcome?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::sync::Arc;

    use model_judge::{JudgeError, MockBackend};
    use shared_pdf::fixtures::{build_pdf_with_pages, build_text_pdf};
    use shared_types::VerdictStatus;

    fn pipeline_with(reply: &str) -> (AnalysisPipeline, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::new(reply));
        let judge = ModelJudge::new(backend.clone());
        (AnalysisPipeline::new(judge), backend)
    }

    #[test]
    fn test_clean_rules_trims_and_drops_empty() {
        let cleaned = clean_rules(&["  First  ", "", "\t\n", "Second"], 3).unwrap();
        assert_eq!(cleaned, vec!["First".to_string(), "Second".to_string()]);
    }

    #[test]
    fn test_clean_rules_rejects_all_empty() {
        let err = clean_rules(&["", "   ", "\n"], 3).unwrap_err();
        assert_eq!(err.to_string(), "At least one rule is required");
    }

    #[test]
    fn test_clean_rules_enforces_cap() {
        let err = clean_rules(&["a", "b", "c", "d"], 3).unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
        assert_eq!(err.to_string(), "At most 3 rules are supported");
    }

    #[test]
    fn test_page_bounds() {
        let limits = PipelineLimits::default();
        assert!(check_page_bounds(1, &limits).is_err());
        assert!(check_page_bounds(2, &limits).is_ok());
        assert!(check_page_bounds(10, &limits).is_ok());
        assert!(check_page_bounds(11, &limits).is_err());
    }

    #[tokio::test]
    async fn test_end_to_end_three_page_scenario() {
        let (pipeline, backend) = pipeline_with(
            r#"[
                {"rule":"Document should mention supervisor name.","status":"pass",
                 "evidence":"Found on page 1: 'The supervisor is Dr. Smith.'",
                 "reasoning":"The supervisor is named.","confidence":95},
                {"rule":"Document should have at least 2 pages.","status":"fail",
                 "evidence":"unclear","reasoning":"unsure","confidence":12}
            ]"#,
        );
        let pdf = build_text_pdf(&["The supervisor is Dr. Smith.", "Chapter two", "Chapter three"]);

        let result = pipeline
            .analyze(
                UploadedFile::new("thesis.pdf", pdf),
                &[
                    "Document should mention supervisor name.",
                    "Document should have at least 2 pages.",
                    "",
                ],
            )
            .await
            .unwrap();

        assert_eq!(result.file_name, "thesis.pdf");
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.results[0].status, VerdictStatus::Pass);
        assert_eq!(result.results[0].confidence, 95.0);
        assert_eq!(result.results[1].status, VerdictStatus::Pass);
        assert_eq!(result.results[1].confidence, 100.0);
        assert_eq!(
            result.results[1].evidence,
            "Document has 3 pages, which is at least 2."
        );

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("supervisor"));
        assert!(prompts[0].contains("JSON array of 2 objects"));
    }

    #[tokio::test]
    async fn test_overflowing_confidence_does_not_abort() {
        let (pipeline, _) = pipeline_with(r#"[{"status":"pass","confidence":1e400}]"#);

        let result = pipeline
            .analyze(
                UploadedFile::new("long.pdf", build_pdf_with_pages(10)),
                &["Mentions the methodology"],
            )
            .await
            .unwrap();

        assert_eq!(result.total_pages, 10);
        assert_eq!(result.results[0].status, VerdictStatus::Pass);
        assert_eq!(result.results[0].confidence, 0.0);
    }

    #[tokio::test]
    async fn test_single_page_rejected_before_judge() {
        let (pipeline, backend) = pipeline_with("[]");
        let err = pipeline
            .analyze(UploadedFile::new("short.pdf", build_pdf_with_pages(1)), &["Any rule"])
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::PageCount { pages: 1, .. }));
        assert_eq!(err.to_string(), "PDF must be between 2 and 10 pages.");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_long_document_rejected_before_judge() {
        let (pipeline, backend) = pipeline_with("[]");
        let err = pipeline
            .analyze(UploadedFile::new("long.pdf", build_pdf_with_pages(11)), &["Any rule"])
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::PageCount { pages: 11, .. }));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_rules_rejected_before_extraction() {
        let (pipeline, backend) = pipeline_with("[]");
        // Not even a PDF: validation must fail first.
        let err = pipeline
            .analyze(UploadedFile::new("x.pdf", b"garbage".to_vec()), &["", "  ", ""])
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Validation(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_extraction_error() {
        let (pipeline, backend) = pipeline_with("[]");
        let err = pipeline
            .analyze(UploadedFile::new("x.pdf", b"not a pdf".to_vec()), &["rule"])
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Extraction(_)));
        assert!(err.is_client_error());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_judge_reply_aborts() {
        let (pipeline, _) = pipeline_with("I think the document passes.");
        let err = pipeline
            .analyze(UploadedFile::new("doc.pdf", build_pdf_with_pages(3)), &["rule"])
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Judge(JudgeError::Protocol { .. })));
        assert_eq!(err.to_string(), "LLM returned invalid JSON");
    }

    #[tokio::test]
    async fn test_custom_limits() {
        let (pipeline, _) = pipeline_with(r#"[{"status":"pass","confidence":80}]"#);
        let pipeline = pipeline.with_limits(PipelineLimits {
            min_pages: 1,
            max_pages: 1,
            max_rules: 1,
        });

        let result = pipeline
            .analyze(UploadedFile::new("one.pdf", build_pdf_with_pages(1)), &["rule"])
            .await
            .unwrap();
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.results[0].rule, "rule");
    }

    proptest! {
        /// Property: page bounds reject exactly the counts outside [2, 10]
        #[test]
        fn page_bounds_reject_iff_out_of_range(pages in 0u32..1000) {
            let limits = PipelineLimits::default();
            let rejected = check_page_bounds(pages, &limits).is_err();
            prop_assert_eq!(rejected, !(2..=10).contains(&pages));
        }

        /// Property: cleaning keeps exactly the non-blank slots, trimmed and in order
        #[test]
        fn cleaning_preserves_non_blank_order(
            slots in proptest::collection::vec(
                prop_oneof![Just(String::new()), Just("   ".to_string()), "[ ]{0,2}[a-z]{1,8}[ ]{0,2}"],
                3,
            )
        ) {
            let expected: Vec<String> = slots
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            match clean_rules(&slots, 3) {
                Ok(cleaned) => prop_assert_eq!(cleaned, expected),
                Err(AnalysisError::Validation(_)) => prop_assert!(expected.is_empty()),
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
