//! Stage 2: Document Synthesis
//!
//! Turns the analysis into an HTML user guide with a fixed section layout.
//! Text only: screenshots are not resent.

use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::analysis::AnalysisDocument;
use crate::ai::prompt::PromptTemplates;
use crate::ai::provider::{LlmRequest, SharedProvider};
use crate::config::LlmConfig;
use crate::types::{DocError, PipelineStage, Result};

static HEADING_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\n?[ \t]*(<h[23][\s>])").expect("valid heading regex"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid blank-run regex"));

// =============================================================================
// Formatted Document
// =============================================================================

/// Finished guide body; immutable once built
#[derive(Debug, Clone)]
pub struct FormattedDocument {
    title: String,
    html: String,
    generated_at: DateTime<Local>,
}

impl FormattedDocument {
    /// Normalize model output into a guide body
    pub fn new(title: impl Into<String>, raw_html: &str) -> Self {
        Self {
            title: title.into(),
            html: tidy_html(raw_html),
            generated_at: Local::now(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The HTML fragment produced by the model, post-processed
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn generated_at(&self) -> DateTime<Local> {
        self.generated_at
    }

    /// Full guide page: title block, body, screenshot list, footer
    pub fn render_page(&self, image_names: &[String]) -> String {
        let mut page = String::new();

        page.push_str("<div style=\"text-align: center; max-width: 800px; margin: 0 auto;\">\n\n");
        page.push_str("<h1>Dashboard User Guide</h1>\n");
        page.push_str(&format!("<p><strong>{}</strong></p>\n", self.title));
        page.push_str(&format!(
            "<p><em>Generated {}</em></p>\n\n",
            self.generated_at.format("%B %d, %Y at %I:%M %p")
        ));

        page.push_str(&self.html);
        page.push_str("\n\n");

        if !image_names.is_empty() {
            page.push_str("<h2>Dashboard Screenshots</h2>\n<ul>\n");
            for name in image_names {
                page.push_str(&format!("<li>{}</li>\n", name));
            }
            page.push_str("</ul>\n\n");
        }

        page.push_str("<hr/>\n");
        page.push_str("<p><em>This documentation was automatically generated from dashboard screenshots.</em></p>\n");
        page.push_str("<p><em>For questions or updates, please contact the BI team.</em></p>\n\n");
        page.push_str("</div>\n");

        page
    }
}

/// Strip a code fence, put a blank line before each h2/h3, collapse blank runs
fn tidy_html(raw: &str) -> String {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.split_once('\n').map(|(_, b)| b).unwrap_or(rest);
        body = body.trim_end().strip_suffix("```").unwrap_or(body).trim();
    }

    let spaced = HEADING_GAP.replace_all(body, "\n\n$1");
    BLANK_RUNS
        .replace_all(&spaced, "\n\n")
        .trim()
        .to_string()
}

// =============================================================================
// Document Architect
// =============================================================================

/// Stage 2 agent: analysis to formatted guide
pub struct DocumentArchitect {
    provider: SharedProvider,
    max_tokens: usize,
    temperature: f32,
}

impl DocumentArchitect {
    pub fn new(provider: SharedProvider, config: &LlmConfig) -> Self {
        Self {
            provider,
            max_tokens: config.documentation_max_tokens,
            temperature: config.documentation_temperature,
        }
    }

    /// Write the guide in one text-only model call
    pub async fn synthesize(
        &self,
        analysis: &AnalysisDocument,
        title: &str,
    ) -> Result<FormattedDocument> {
        let stage = PipelineStage::DocumentSynthesis;
        let analysis_text = analysis
            .prompt_text()
            .map_err(|e| DocError::stage(stage, &e, self.provider.name()))?;

        let prompt =
            PromptTemplates::documentation(title, &analysis_text, analysis.is_structured());
        let request = LlmRequest::text(prompt, self.max_tokens, self.temperature);

        info!(
            "{} writing guide from {} analysis",
            stage,
            if analysis.is_structured() { "structured" } else { "raw" }
        );

        let response = self
            .provider
            .generate(&request)
            .await
            .map_err(|e| DocError::stage(stage, &e, self.provider.name()))?;

        if response.content.trim().is_empty() {
            return Err(DocError::empty_response(stage));
        }

        debug!(
            "{} complete: {} chars, {} tokens",
            stage,
            response.content.len(),
            response.usage.total()
        );

        Ok(FormattedDocument::new(title, &response.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::tests::ScriptedProvider;
    use crate::pipeline::analysis::VisualAnalyst;
    use crate::types::ErrorCategory;

    #[test]
    fn test_tidy_spaces_headings() {
        let html = tidy_html("<h2>Executive Summary</h2><p>Intro</p>\n<h3>Queue</h3><p>x</p>");
        assert_eq!(
            html,
            "<h2>Executive Summary</h2><p>Intro</p>\n\n<h3>Queue</h3><p>x</p>"
        );
    }

    #[test]
    fn test_tidy_collapses_blank_runs_and_fences() {
        let html = tidy_html("```html\n<p>a</p>\n\n\n\n<p>b</p>\n   \n\n<p>c</p>\n```");
        assert_eq!(html, "<p>a</p>\n\n<p>b</p>\n\n<p>c</p>");
    }

    #[test]
    fn test_tidy_leaves_other_tags() {
        let html = tidy_html("<p>x</p><header>y</header>");
        assert_eq!(html, "<p>x</p><header>y</header>");
    }

    #[test]
    fn test_render_page() {
        let doc = FormattedDocument::new("Support Queue", "<h2>Executive Summary</h2>");
        let page = doc.render_page(&["queue.png".to_string()]);
        assert!(page.contains("<h1>Dashboard User Guide</h1>"));
        assert!(page.contains("<strong>Support Queue</strong>"));
        assert!(page.contains("<h2>Executive Summary</h2>"));
        assert!(page.contains("<li>queue.png</li>"));
        assert!(page.trim_end().ends_with("</div>"));

        let bare = doc.render_page(&[]);
        assert!(!bare.contains("Dashboard Screenshots"));
    }

    #[tokio::test]
    async fn test_synthesize_embeds_analysis_without_images() {
        let provider = ScriptedProvider::new(vec![Ok(
            "<h2>Executive Summary</h2><p>Tracks sales.</p>".to_string()
        )]);
        let architect = DocumentArchitect::new(provider.clone(), &LlmConfig::default());
        let analysis = VisualAnalyst::parse(r#"{"dashboard_purpose": "Track sales"}"#);

        let doc = architect.synthesize(&analysis, "Sales").await.unwrap();
        assert_eq!(doc.title(), "Sales");
        assert!(doc.html().starts_with("<h2>Executive Summary</h2>"));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].images.is_empty());
        assert_eq!(requests[0].max_tokens, 16000);
        assert!(requests[0].prompt.contains("Track sales"));
    }

    #[tokio::test]
    async fn test_raw_analysis_passed_verbatim() {
        let provider = ScriptedProvider::new(vec![Ok("<h2>Objective</h2>".to_string())]);
        let architect = DocumentArchitect::new(provider.clone(), &LlmConfig::default());
        let analysis = AnalysisDocument::Raw("Revenue chart with region filter".to_string());

        architect.synthesize(&analysis, "Sales").await.unwrap();
        let requests = provider.requests.lock().unwrap();
        assert!(requests[0].prompt.contains("```text\nRevenue chart with region filter\n```"));
    }

    #[tokio::test]
    async fn test_failure_is_stage_two_error() {
        let provider = ScriptedProvider::new(vec![Ok(String::new())]);
        let architect = DocumentArchitect::new(provider, &LlmConfig::default());

        let err = architect
            .synthesize(&AnalysisDocument::Raw("x".to_string()), "Sales")
            .await
            .unwrap_err();
        match err {
            DocError::Stage { stage, category, .. } => {
                assert_eq!(stage, PipelineStage::DocumentSynthesis);
                assert_eq!(category, ErrorCategory::ParseError);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
