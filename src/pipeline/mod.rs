//! Documentation Pipeline
//!
//! ## Pipeline Architecture
//!
//! ```text
//! screenshots → Visual Analysis → Document Synthesis → page
//!                     ↓                                  ↓
//!              analysis sidecar              saved guide + quality report
//! ```
//!
//! Stages run strictly in order. Stage 2 starts only after Stage 1 has
//! returned a non-empty analysis; any stage failure aborts the run with a
//! [`DocError::Stage`](crate::types::DocError::Stage).

pub mod analysis;
pub mod artifacts;
pub mod synthesis;

pub use analysis::{
    AnalysisDocument, ChartDetails, DashboardAnalysis, DashboardSection, InteractiveElement,
    MetricObservation, VisualAnalyst,
};
pub use artifacts::{ArtifactStore, clean_title};
pub use synthesis::{DocumentArchitect, FormattedDocument};

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument};

use crate::ai::image::ImageInput;
use crate::ai::provider::SharedProvider;
use crate::config::Config;
use crate::quality::{DocumentValidator, QualityReport};
use crate::types::{PipelineStage, Result};

/// Everything one documentation run produced
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: String,
    pub title: String,
    pub analysis: AnalysisDocument,
    pub document: FormattedDocument,
    /// Full guide page as saved and published
    pub page: String,
    pub quality: QualityReport,
    pub analysis_path: PathBuf,
    pub document_path: PathBuf,
    pub copied_images: Vec<PathBuf>,
    pub duration_secs: u64,
}

/// Two-stage screenshot-to-guide orchestrator
pub struct DocumentationPipeline {
    analyst: VisualAnalyst,
    architect: DocumentArchitect,
    validator: DocumentValidator,
    artifacts: ArtifactStore,
}

impl DocumentationPipeline {
    pub fn new(provider: SharedProvider, config: &Config) -> Self {
        Self {
            analyst: VisualAnalyst::new(provider.clone(), &config.llm),
            architect: DocumentArchitect::new(provider, &config.llm),
            validator: DocumentValidator::new(),
            artifacts: ArtifactStore::new(&config.output),
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Run both stages, save artifacts and score the result
    #[instrument(skip(self, images), fields(images = images.len()))]
    pub async fn run(&self, images: &[ImageInput], title: &str) -> Result<PipelineResult> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let start = Instant::now();

        info!("{} ({} screenshot(s))", PipelineStage::VisualAnalysis, images.len());
        let raw = self.analyst.analyze(images).await?;
        let analysis = VisualAnalyst::parse(&raw);
        match analysis.section_count() {
            Some(count) => info!("Structured analysis with {} section(s)", count),
            None => info!("Analysis kept as raw text"),
        }
        let analysis_path = self.artifacts.save_analysis(title, &analysis)?;

        info!("{}", PipelineStage::DocumentSynthesis);
        let document = self.architect.synthesize(&analysis, title).await?;

        let image_names: Vec<String> = images.iter().map(|i| i.name.clone()).collect();
        let page = document.render_page(&image_names);
        let document_path = self.artifacts.save_document(title, &page)?;
        let copied_images = self.artifacts.copy_images(images)?;

        let quality = self.validator.validate(&page);
        info!("{}", quality.summary());

        Ok(PipelineResult {
            run_id,
            title: title.to_string(),
            analysis,
            document,
            page,
            quality,
            analysis_path,
            document_path,
            copied_images,
            duration_secs: start.elapsed().as_secs(),
        })
    }
}
