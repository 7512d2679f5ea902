pub mod error;
pub mod metric;
pub mod stage;

pub use error::{DocError, ErrorCategory, ErrorClassifier, LlmError, Result, ResultExt};
pub use metric::{Period, RawMetricRow};
pub use stage::PipelineStage;

// =============================================================================
// Domain Newtypes
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe wrapper for document store page IDs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for PageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod newtype_tests {
    use super::*;

    #[test]
    fn test_page_id() {
        let id = PageId::new("98765");
        assert_eq!(id.as_str(), "98765");
        assert_eq!(format!("{}", id), "98765");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"98765\"");
    }
}
