// Detectia Core Services

pub mod config_store;
pub mod detection;
pub mod detection_store;
pub mod extraction;
pub mod text_processor;

pub use config_store::{AppConfig, ConfigError, ConfigStore, InputLimits, StorageConfig};
pub use detection_store::{
    DetectionStore, JsonlDetectionStore, MemoryDetectionStore, NullDetectionStore, StoreError, UploadedFileMeta,
};
pub use extraction::{extract_text, DocumentKind, ExtractionError};
pub use text_processor::*;

// Re-export detection module entry points
pub use detection::{
    aggregate_indicators,
    attribute_agent,
    render_highlighted,
    DetectionEngine,
    DetectionError,
    HeuristicConfig,
    SectionScorer,
};
