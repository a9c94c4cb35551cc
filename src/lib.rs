pub mod api;
pub mod logging;
pub mod models;
pub mod services;

pub use api::{analyze_file, analyze_text, ApiError, AppContext};
pub use models::{AnalysisResult, AnalysisType, Indicator, Section, SuspicionLevel};
pub use services::detection::DetectionEngine;
