//! Prompt Builder System
//!
//! Standardized prompt construction for the documentation stages and the
//! scorecard recommendations. Sections render in insertion order.

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Ordered key-value facts
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Fenced block with language tag
    Code { language: String, content: String },
    /// Hard rules the model must follow
    Rules(Vec<String>),
    /// Anti-patterns with good/bad examples
    AntiPatterns { bad: Vec<String>, good: Vec<String> },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives(mut self, objectives: &[&str]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Add a context fact; consecutive facts share one section
    pub fn context_item(mut self, key: &str, value: impl Into<String>) -> Self {
        let item = (key.to_string(), value.into());
        match self.sections.last_mut() {
            Some(PromptSection::Context(items)) => items.push(item),
            _ => self.sections.push(PromptSection::Context(vec![item])),
        }
        self
    }

    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn rules(mut self, rules: &[&str]) -> Self {
        self.sections.push(PromptSection::Rules(
            rules.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn anti_patterns(mut self, bad: &[&str], good: &[&str]) -> Self {
        self.sections.push(PromptSection::AntiPatterns {
            bad: bad.iter().map(|s| s.to_string()).collect(),
            good: good.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!("You are an expert {} {}.\n", expertise, task));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(items) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in items {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Code { language, content } => {
                    prompt.push_str(&format!("```{}\n", language));
                    prompt.push_str(&content);
                    prompt.push_str("\n```\n\n");
                }
                PromptSection::Rules(rules) => {
                    prompt.push_str("<RULES>\n");
                    for rule in rules {
                        prompt.push_str(&format!("- {}\n", rule));
                    }
                    prompt.push_str("</RULES>\n\n");
                }
                PromptSection::AntiPatterns { bad, good } => {
                    prompt.push_str("<what_not_to_do>\n");
                    for example in bad {
                        prompt.push_str(&format!("WRONG: {}\n", example));
                    }
                    prompt.push_str("</what_not_to_do>\n\n");
                    prompt.push_str("<what_to_do>\n");
                    for example in good {
                        prompt.push_str(&format!("CORRECT: {}\n", example));
                    }
                    prompt.push_str("</what_to_do>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// Shape requested from the vision stage
const ANALYSIS_SCHEMA: &str = r#"{
  "dashboard_purpose": "string",
  "target_audience": "string",
  "business_value": "string",
  "data_freshness": "string",
  "update_frequency": "string",
  "sections": [
    {
      "section_name": "string",
      "section_type": "kpi | chart | table | filter_panel | other",
      "business_purpose": "string",
      "metrics": [
        {"name": "", "value": "", "unit": "", "trend": "", "context": "", "threshold": ""}
      ],
      "interactive_elements": [
        {"type": "", "name": "", "options": [""], "location": "", "purpose": ""}
      ],
      "chart_details": {
        "type": "", "data_points": "", "color_scheme": "", "annotations": "", "effectiveness": ""
      },
      "functionality": "string",
      "key_insights": ["string"],
      "actionable_items": ["string"]
    }
  ],
  "global_controls": [
    {"type": "", "name": "", "options": [""], "location": "", "purpose": ""}
  ],
  "data_quality_indicators": ["string"],
  "performance_trends": ["string"]
}"#;

/// Preset prompt templates
pub struct PromptTemplates;

impl PromptTemplates {
    /// Stage 1: screenshots to structured analysis
    pub fn dashboard_analysis(image_count: usize) -> String {
        PromptBuilder::new()
            .role(
                "business intelligence analyst",
                "who reads dashboard screenshots and extracts their structure",
            )
            .context_item("Screenshots", image_count.to_string())
            .objectives(&[
                "Identify the dashboard's purpose, audience and business value",
                "Break the dashboard into sections, one per visual area or tab",
                "Record every visible metric with its value, unit, trend and thresholds",
                "List every interactive element (filters, dropdowns, date pickers, drill-downs) with its options and location",
                "Describe each chart: type, data shown, colors, annotations and how well it communicates",
                "Note data freshness and data quality indicators",
            ])
            .section(
                "Output Format",
                "Respond with a single JSON object and nothing else, following this shape:",
            )
            .code("json", ANALYSIS_SCHEMA)
            .rules(&[
                "Report only what is visible in the screenshots",
                "Use empty strings or empty arrays for anything you cannot see",
                "Treat multiple screenshots as views of the same dashboard",
            ])
            .build()
    }

    /// Stage 2: structured analysis to HTML guide
    pub fn documentation(title: &str, analysis: &str, analysis_is_json: bool) -> String {
        let language = if analysis_is_json { "json" } else { "text" };

        PromptBuilder::new()
            .role(
                "technical writer",
                "who writes business-facing dashboard user guides",
            )
            .context_item("Dashboard", title)
            .section("Dashboard Analysis", "Structured analysis of the dashboard screenshots:")
            .code(language, analysis)
            .section(
                "Required Structure",
                "Write an HTML fragment (no <html>, <head> or <body>) with these sections, in order:\n\
                 <h2 style=\"font-weight: bold;\">Executive Summary</h2>: purpose, audience and business value\n\
                 <h2 style=\"font-weight: bold;\">Objective</h2>: the decisions this dashboard supports\n\
                 <h2 style=\"font-weight: bold;\">Dashboard Views</h2>: overview list of all views\n\
                 One <h3> block per analysis section, each containing a <strong>Metrics Reported</strong> list, \
                 the chart description, and the Drill-Down options available in that view\n\
                 <h2 style=\"font-weight: bold;\">Interactive Controls</h2>: every filter and control with its options\n\
                 <h2 style=\"font-weight: bold;\">How to Use This Dashboard</h2>: numbered steps (click, select, filter, navigate)\n\
                 <h2 style=\"font-weight: bold;\">Key Insights</h2>: business performance, growth and customer takeaways\n\
                 <h2 style=\"font-weight: bold;\">Data Quality and Freshness</h2>: refresh cadence and caveats",
            )
            .rules(&[
                "Use <h2>, <h3>, <strong>, <ul>/<li> and <p> only",
                "Repeat the per-view block once for every section in the analysis",
                "Never invent metrics, filters or values absent from the analysis",
                "Return only the HTML fragment",
            ])
            .anti_patterns(
                &["\"This chart shows data.\"", "Markdown headings like ## Overview"],
                &[
                    "\"The Revenue by Region bar chart compares monthly revenue against target for each region.\"",
                    "<h3>Revenue by Region</h3>",
                ],
            )
            .build()
    }

    /// Scorecard recommendations from computed statistics
    pub fn recommendations(facts: &[(&str, String)]) -> String {
        let mut builder = PromptBuilder::new().role(
            "business performance analyst",
            "who turns scorecard statistics into concrete actions",
        );
        for (key, value) in facts {
            builder = builder.context_item(key, value.clone());
        }
        builder
            .objectives(&[
                "Give 3 to 5 specific, actionable recommendations based on these figures",
                "Prioritize declining trends, volatility and underperforming regions",
            ])
            .rules(&["One recommendation per line, each starting with \"- \"", "No preamble"])
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("analyst", "who reads dashboards")
            .objectives(&["Find metrics", "Find filters"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("You are an expert analyst who reads dashboards."));
        assert!(prompt.contains("1. Find metrics"));
        assert!(prompt.contains("2. Find filters"));
    }

    #[test]
    fn test_context_items_keep_order_and_group() {
        let prompt = PromptBuilder::new()
            .context_item("Total Records", "120")
            .context_item("Trend", "increasing")
            .build();

        assert_eq!(prompt.matches("# Context").count(), 1);
        let records = prompt.find("**Total Records**: 120").unwrap();
        let trend = prompt.find("**Trend**: increasing").unwrap();
        assert!(records < trend);
    }

    #[test]
    fn test_analysis_prompt_requests_json() {
        let prompt = PromptTemplates::dashboard_analysis(3);
        assert!(prompt.contains("**Screenshots**: 3"));
        assert!(prompt.contains("```json"));
        assert!(prompt.contains("\"interactive_elements\""));
    }

    #[test]
    fn test_documentation_prompt_embeds_analysis() {
        let prompt = PromptTemplates::documentation("Sales", "{\"a\": 1}", true);
        assert!(prompt.contains("```json\n{\"a\": 1}\n```"));
        assert!(prompt.contains("Executive Summary"));
        assert!(prompt.contains("Metrics Reported"));

        let raw = PromptTemplates::documentation("Sales", "free text", false);
        assert!(raw.contains("```text\nfree text\n```"));
    }
}
