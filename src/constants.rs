//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Screenshot intake constants
pub mod images {
    /// Maximum size of a single image in bytes (10 MB)
    pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Combined base64 payload above which a warning is logged (20 MB)
    pub const PAYLOAD_WARN_BYTES: usize = 20 * 1024 * 1024;

    /// Supported extensions and their mime types
    pub const SUPPORTED_FORMATS: &[(&str, &str)] = &[
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("webp", "image/webp"),
        ("bmp", "image/bmp"),
    ];

    /// Subdirectory of the output dir that receives copied screenshots
    pub const OUTPUT_SUBDIR: &str = "images";
}

/// Document quality rubric
pub mod rubric {
    /// Headers every guide must contain
    pub const REQUIRED_SECTIONS: [&str; 7] = [
        "Executive Summary",
        "Objective",
        "Dashboard Views",
        "How to Use",
        "Key Insights",
        "Data Quality",
        "Interactive Controls",
    ];

    pub const BUSINESS_KEYWORDS: [&str; 6] = [
        "business",
        "revenue",
        "performance",
        "customer",
        "growth",
        "kpi",
    ];

    pub const ACTION_KEYWORDS: [&str; 5] = ["click", "select", "filter", "navigate", "drill"];

    /// Below this many characters the guide is flagged as too short
    pub const MIN_LENGTH: usize = 2000;
    /// Above this many characters the guide counts as comprehensive
    pub const COMPREHENSIVE_LENGTH: usize = 15000;

    pub const SECTIONS_POINTS: u32 = 20;
    pub const COMPREHENSIVE_POINTS: u32 = 15;
    pub const ADEQUATE_LENGTH_POINTS: u32 = 10;
    pub const METRICS_POINTS: u32 = 15;
    pub const CONTROLS_POINTS: u32 = 15;
    pub const BUSINESS_POINTS: u32 = 15;
    pub const ACTION_POINTS: u32 = 10;
    pub const FORMATTING_POINTS: u32 = 10;

    pub const MIN_BUSINESS_HITS: usize = 3;
    pub const MIN_ACTION_HITS: usize = 2;

    pub const MAX_SCORE: u32 = 100;
}

/// Scorecard analytics constants
pub mod analytics {
    /// IQR multiplier for outlier fences
    pub const IQR_MULTIPLIER: f64 = 1.5;

    /// Growth-rate standard deviation above which volatility is flagged
    pub const VOLATILITY_THRESHOLD: f64 = 0.2;

    /// Regions below this fraction of the mean regional total are flagged
    pub const UNDERPERFORM_RATIO: f64 = 0.7;

    /// Entries kept in each top-performer list
    pub const TOP_N: usize = 5;

    /// Regions named in the underperformance recommendation
    pub const UNDERPERFORMERS_NAMED: usize = 3;

    /// Regions included in the recommendation prompt
    pub const PROMPT_TOP_REGIONS: usize = 3;
}

/// Confluence publishing constants
pub mod confluence {
    /// Width of embedded screenshots in pixels
    pub const IMAGE_WIDTH: u32 = 800;

    /// Title suffix format for `always_create_new`
    pub const TITLE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}

/// Artifact naming
pub mod artifacts {
    /// Timestamp embedded in artifact file names
    pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Fallback when a title cleans down to nothing
    pub const DEFAULT_TITLE: &str = "dashboard";
}
