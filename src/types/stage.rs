//! Pipeline stage identifiers

use serde::{Deserialize, Serialize};

/// Stages of the documentation pipeline, in execution order
///
/// - 1: VisualAnalysis - screenshots to structured analysis
/// - 2: DocumentSynthesis - analysis to formatted guide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    VisualAnalysis = 1,
    DocumentSynthesis = 2,
}

impl PipelineStage {
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::VisualAnalysis => "Visual Analysis",
            Self::DocumentSynthesis => "Document Synthesis",
        }
    }

    /// Total number of stages
    pub const COUNT: usize = 2;
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}] {}", self.number(), Self::COUNT, self.name())
    }
}
