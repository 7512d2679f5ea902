//! dashdoc - Dashboard Documentation Generator
//!
//! Turns dashboard screenshots into a structured user guide with a
//! vision-capable LLM, scores the guide against a documentation rubric and
//! publishes it to Confluence. A data-direct path analyzes scorecard
//! metrics when no screenshots are available.
//!
//! ## Core Features
//!
//! - **Two-Stage Pipeline**: visual analysis, then document synthesis
//! - **Quality Rubric**: additive 0-100 score with issues and strengths
//! - **Title-Keyed Upsert**: idempotent publishing with labels and attachments
//! - **Scorecard Analytics**: summary, trend, performance and IQR outliers
//!
//! ## Quick Start
//!
//! ```ignore
//! use dashdoc::{ConfigLoader, DocumentationPipeline};
//! use dashdoc::ai::{create_provider, load_images};
//!
//! let config = ConfigLoader::load()?;
//! let provider = create_provider(&config.llm.provider_config())?;
//! let pipeline = DocumentationPipeline::new(provider, &config);
//! let batch = load_images(&["queue.png", "trend.png"]);
//! let result = pipeline.run(&batch.images, "Support Queue").await?;
//! println!("{}", result.quality.summary());
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: LLM providers, prompts, image intake, JSON recovery
//! - [`pipeline`]: Visual analysis and document synthesis stages
//! - [`quality`]: Documentation rubric
//! - [`publish`]: Confluence client and upsert logic
//! - [`scorecard`]: Metric sources and analytics
//! - [`config`]: Layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod publish;
pub mod quality;
pub mod scorecard;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, UpdateMode};

// Error Types
pub use types::error::{DocError, ErrorCategory, Result, ResultExt};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{AnalysisDocument, DocumentationPipeline, FormattedDocument, PipelineResult};
pub use quality::{Assessment, DocumentValidator, QualityReport};

// =============================================================================
// Publishing Re-exports
// =============================================================================

pub use publish::{
    ConfluenceClient, InMemoryPageStore, PageStore, PublishAction, PublishOutcome, Publisher,
};

// =============================================================================
// Analytics Re-exports
// =============================================================================

pub use scorecard::{MetricSource, Recommender, ScorecardReport};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{LlmProvider, LlmResponse, SharedProvider, create_provider};
