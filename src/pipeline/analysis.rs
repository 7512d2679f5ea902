//! Stage 1: Visual Analysis
//!
//! Sends every screenshot to the vision model in one request and gets back
//! a structured description of the dashboard. The reply is kept verbatim;
//! [`VisualAnalyst::parse`] turns it into an [`AnalysisDocument`] on a best
//! effort basis. A structured document holds the recovered JSON tree as-is;
//! [`DashboardAnalysis`] is a typed view derived from it on demand.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::ai::image::ImageInput;
use crate::ai::prompt::PromptTemplates;
use crate::ai::provider::{LlmRequest, SharedProvider};
use crate::ai::validation::{Recovery, recover_json};
use crate::config::LlmConfig;
use crate::constants::images as image_constants;
use crate::types::{DocError, PipelineStage, Result};

// =============================================================================
// Analysis Document
// =============================================================================

/// Output of the visual analysis stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum AnalysisDocument {
    /// The model returned (possibly repaired) JSON of the expected shape,
    /// kept exactly as recovered
    Structured(Value),
    /// Free-form text; passed to the next stage unchanged
    Raw(String),
}

impl AnalysisDocument {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Number of dashboard sections, when known
    pub fn section_count(&self) -> Option<usize> {
        match self {
            Self::Structured(tree) => Some(
                tree.get("sections")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len),
            ),
            Self::Raw(_) => None,
        }
    }

    /// Typed view of a structured analysis
    pub fn view(&self) -> Option<DashboardAnalysis> {
        match self {
            Self::Structured(tree) => serde_json::from_value(tree.clone()).ok(),
            Self::Raw(_) => None,
        }
    }

    /// Text embedded into the synthesis prompt and written to the sidecar
    pub fn prompt_text(&self) -> Result<String> {
        match self {
            Self::Structured(tree) => Ok(serde_json::to_string_pretty(tree)?),
            Self::Raw(text) => Ok(text.clone()),
        }
    }

    /// File extension for the persisted artifact
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Structured(_) => "json",
            Self::Raw(_) => "txt",
        }
    }
}

/// Structured description of a dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardAnalysis {
    #[serde(deserialize_with = "lenient_string")]
    pub dashboard_purpose: String,
    #[serde(deserialize_with = "lenient_string")]
    pub target_audience: String,
    #[serde(deserialize_with = "lenient_string")]
    pub business_value: String,
    #[serde(deserialize_with = "lenient_string")]
    pub data_freshness: String,
    #[serde(deserialize_with = "lenient_string")]
    pub update_frequency: String,
    pub sections: Vec<DashboardSection>,
    pub global_controls: Vec<InteractiveElement>,
    #[serde(deserialize_with = "lenient_strings")]
    pub data_quality_indicators: Vec<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub performance_trends: Vec<String>,
    /// Keys the model added beyond the requested shape
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSection {
    #[serde(deserialize_with = "lenient_string")]
    pub section_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub section_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub business_purpose: String,
    pub metrics: Vec<MetricObservation>,
    pub interactive_elements: Vec<InteractiveElement>,
    pub chart_details: ChartDetails,
    #[serde(deserialize_with = "lenient_string")]
    pub functionality: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub key_insights: Vec<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub actionable_items: Vec<String>,
}

/// A metric as read off a screenshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricObservation {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(deserialize_with = "lenient_string")]
    pub unit: String,
    #[serde(deserialize_with = "lenient_string")]
    pub trend: String,
    #[serde(deserialize_with = "lenient_string")]
    pub context: String,
    #[serde(deserialize_with = "lenient_string")]
    pub threshold: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveElement {
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub options: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub purpose: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartDetails {
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_string")]
    pub data_points: String,
    #[serde(deserialize_with = "lenient_string")]
    pub color_scheme: String,
    #[serde(deserialize_with = "lenient_string")]
    pub annotations: String,
    #[serde(deserialize_with = "lenient_string")]
    pub effectiveness: String,
}

/// Accept numbers, booleans and null where a string is expected
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

/// Accept a single scalar or a list of scalars
fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect(),
        other => vec![scalar_text(other)],
    })
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// =============================================================================
// Visual Analyst
// =============================================================================

/// Stage 1 agent: screenshots to analysis text
pub struct VisualAnalyst {
    provider: SharedProvider,
    max_tokens: usize,
    temperature: f32,
}

impl VisualAnalyst {
    pub fn new(provider: SharedProvider, config: &LlmConfig) -> Self {
        Self {
            provider,
            max_tokens: config.analysis_max_tokens,
            temperature: config.analysis_temperature,
        }
    }

    /// Analyze the screenshots in one model call
    ///
    /// The provider is not called when `images` is empty.
    pub async fn analyze(&self, images: &[ImageInput]) -> Result<String> {
        if images.is_empty() {
            return Err(DocError::NoValidImages);
        }

        let stage = PipelineStage::VisualAnalysis;
        let request = LlmRequest::text(
            PromptTemplates::dashboard_analysis(images.len()),
            self.max_tokens,
            self.temperature,
        )
        .with_images(images.to_vec());

        let payload = request.encoded_image_bytes();
        if payload > image_constants::PAYLOAD_WARN_BYTES {
            warn!(
                "Encoded image payload is {:.1} MB; the model may reject it",
                payload as f64 / (1024.0 * 1024.0)
            );
        }

        info!(
            "{} sending {} screenshot(s) to {}",
            stage,
            images.len(),
            self.provider.model()
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
            "{} complete: {} chars, {} tokens, {}ms",
            stage,
            response.content.len(),
            response.usage.total(),
            response.timing.total_ms
        );

        Ok(response.content)
    }

    /// Best-effort structured parse of the stage output
    pub fn parse(raw: &str) -> AnalysisDocument {
        let Some((value, recovery)) = recover_json(raw) else {
            debug!("Analysis is not JSON; keeping raw text");
            return AnalysisDocument::Raw(raw.trim().to_string());
        };

        if !value.is_object() {
            debug!("Analysis JSON is not an object; keeping raw text");
            return AnalysisDocument::Raw(raw.trim().to_string());
        }

        match DashboardAnalysis::deserialize(&value) {
            Ok(_) => {
                if recovery != Recovery::Clean {
                    info!("Analysis JSON recovered ({:?})", recovery);
                }
                AnalysisDocument::Structured(value)
            }
            Err(e) => {
                warn!("Analysis JSON has an unexpected shape ({}); keeping raw text", e);
                AnalysisDocument::Raw(raw.trim().to_string())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ai::provider::{LlmProvider, LlmResponse};
    use crate::types::ErrorCategory;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that replays canned replies and records requests
    pub(crate) struct ScriptedProvider {
        replies: Mutex<Vec<Result<String>>>,
        pub calls: AtomicUsize,
        pub requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedProvider {
        pub fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(DocError::LlmApi("no scripted reply".to_string()));
            }
            replies.remove(0).map(LlmResponse::content_only)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn screenshot(name: &str) -> ImageInput {
        ImageInput::from_bytes(name, vec![1, 2, 3]).unwrap()
    }

    #[tokio::test]
    async fn test_no_images_never_calls_provider() {
        let provider = ScriptedProvider::new(vec![Ok("{}".to_string())]);
        let analyst = VisualAnalyst::new(provider.clone(), &LlmConfig::default());

        let err = analyst.analyze(&[]).await.unwrap_err();
        assert!(matches!(err, DocError::NoValidImages));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_call_with_all_images_in_order() {
        let provider = ScriptedProvider::new(vec![Ok("{\"sections\": []}".to_string())]);
        let analyst = VisualAnalyst::new(provider.clone(), &LlmConfig::default());

        let text = analyst
            .analyze(&[screenshot("a.png"), screenshot("b.jpg")])
            .await
            .unwrap();
        assert_eq!(text, "{\"sections\": []}");
        assert_eq!(provider.calls(), 1);

        let requests = provider.requests.lock().unwrap();
        let names: Vec<_> = requests[0].images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.jpg"]);
        assert_eq!(requests[0].max_tokens, 8000);
    }

    #[tokio::test]
    async fn test_provider_failure_is_stage_error() {
        let provider = ScriptedProvider::new(vec![Err(DocError::LlmApi(
            "ExpiredTokenException: token expired".to_string(),
        ))]);
        let analyst = VisualAnalyst::new(provider, &LlmConfig::default());

        let err = analyst.analyze(&[screenshot("a.png")]).await.unwrap_err();
        match &err {
            DocError::Stage { stage, category, .. } => {
                assert_eq!(*stage, PipelineStage::VisualAnalysis);
                assert_eq!(*category, ErrorCategory::Auth);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.hint().unwrap().contains("expired"));
    }

    #[tokio::test]
    async fn test_blank_reply_is_parse_failure() {
        let provider = ScriptedProvider::new(vec![Ok("  \n".to_string())]);
        let analyst = VisualAnalyst::new(provider, &LlmConfig::default());

        let err = analyst.analyze(&[screenshot("a.png")]).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ParseError);
    }

    #[test]
    fn test_parse_structured() {
        let raw = r#"```json
{
  "dashboard_purpose": "Track support queue health",
  "sections": [{
    "section_name": "Queue Overview",
    "metrics": [{"name": "Open Tickets", "value": 1423, "trend": "up"}],
    "interactive_elements": [{"type": "dropdown", "name": "Region", "options": ["NA", "EU"]}]
  }],
  "data_quality_indicators": "Refreshed daily",
  "confidence": 0.9
}
```"#;
        let doc = VisualAnalyst::parse(raw);
        assert!(doc.is_structured());
        assert_eq!(doc.section_count(), Some(1));
        let analysis = doc.view().unwrap();
        assert_eq!(analysis.dashboard_purpose, "Track support queue health");
        let section = &analysis.sections[0];
        assert_eq!(section.metrics[0].value, "1423");
        assert_eq!(section.interactive_elements[0].kind, "dropdown");
        assert_eq!(section.interactive_elements[0].options, ["NA", "EU"]);
        assert_eq!(analysis.data_quality_indicators, ["Refreshed daily"]);
        assert!(analysis.extra.contains_key("confidence"));
    }

    #[test]
    fn test_parse_falls_back_to_raw() {
        let doc = VisualAnalyst::parse("The dashboard shows revenue by region.\n");
        assert_eq!(
            doc,
            AnalysisDocument::Raw("The dashboard shows revenue by region.".to_string())
        );
        assert_eq!(doc.extension(), "txt");
        assert_eq!(doc.section_count(), None);

        assert!(!VisualAnalyst::parse("[1, 2, 3]").is_structured());
        assert!(!VisualAnalyst::parse(r#"{"sections": "none"}"#).is_structured());
    }

    #[test]
    fn test_prompt_text_is_the_recovered_tree() {
        let doc = VisualAnalyst::parse(r#"{"dashboard_purpose": "Sales"}"#);
        assert_eq!(doc.extension(), "json");
        assert_eq!(doc.section_count(), Some(0));
        let text = doc.prompt_text().unwrap();
        assert!(text.contains("\"dashboard_purpose\": \"Sales\""));
        assert!(!text.contains("\"sections\""));
    }

    #[test]
    fn test_structured_keeps_unrequested_keys_and_types() {
        let raw = r#"{"sections": [{
            "section_name": "Queue",
            "drill_paths": ["region", "agent"],
            "chart_details": {"type": "bar", "axis": "month"},
            "metrics": [{"name": "Open", "value": 1423}]
        }]}"#;
        let doc = VisualAnalyst::parse(raw);
        let AnalysisDocument::Structured(tree) = &doc else {
            panic!("expected structured analysis");
        };
        let section = &tree["sections"][0];
        assert_eq!(section["drill_paths"][1], "agent");
        assert_eq!(section["chart_details"]["axis"], "month");
        assert_eq!(section["metrics"][0]["value"], 1423);

        let text = doc.prompt_text().unwrap();
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(&reparsed, tree);

        // the typed view still coerces for display
        assert_eq!(doc.view().unwrap().sections[0].metrics[0].value, "1423");
    }
}
