// Analysis API
// Entry points for text and file analysis: validation, engine run, persistence

pub mod error;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::models::{AnalysisResult, AnalysisType, AnalyzeTextRequest, FileAnalysisResponse, FileUpload};
use crate::services::config_store::{AppConfig, InputLimits};
use crate::services::detection::{DetectionEngine, DetectionError};
use crate::services::detection_store::{
    DetectionStore, JsonlDetectionStore, NullDetectionStore, StoreError, UploadedFileMeta,
};
use crate::services::extraction::{extract_text, DocumentKind, ExtractionError};
use crate::services::text_processor::normalize_punctuation;

pub use error::{ApiError, ErrorResponse, RequestKind, ValidationError};

/// Everything an analysis request needs; cheap to share between tasks.
#[derive(Clone)]
pub struct AppContext {
    pub engine: Arc<DetectionEngine>,
    pub store: Arc<dyn DetectionStore>,
    pub limits: InputLimits,
}

impl AppContext {
    pub fn new(engine: Arc<DetectionEngine>, store: Arc<dyn DetectionStore>, limits: InputLimits) -> Self {
        Self { engine, store, limits }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, DetectionError> {
        let engine = DetectionEngine::new(Arc::new(config.heuristics.clone()))?;
        let store: Arc<dyn DetectionStore> = if config.storage.enabled {
            let dir = config.storage.resolved_data_dir();
            info!("[API] Detections stored in {}", dir.display());
            Arc::new(JsonlDetectionStore::new(dir))
        } else {
            info!("[API] Storage disabled");
            Arc::new(NullDetectionStore)
        };
        Ok(Self::new(Arc::new(engine), store, config.limits.clone()))
    }
}

// ============ Validation ============

pub fn validate_text<'a>(text: Option<&'a str>, limits: &InputLimits) -> Result<&'a str, ValidationError> {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return Err(ValidationError::MissingText),
    };

    if text.trim().chars().count() < limits.min_text_chars {
        return Err(ValidationError::TextTooShort {
            min: limits.min_text_chars,
        });
    }
    if text.chars().count() > limits.max_text_chars {
        return Err(ValidationError::TextTooLong {
            max: limits.max_text_chars,
        });
    }
    Ok(text)
}

pub fn parse_analysis_type(value: Option<&str>) -> Result<AnalysisType, ValidationError> {
    let raw = value.unwrap_or("");
    AnalysisType::parse(raw).ok_or_else(|| ValidationError::InvalidAnalysisType(raw.to_string()))
}

pub fn validate_upload(upload: &FileUpload, limits: &InputLimits) -> Result<DocumentKind, ValidationError> {
    if upload.bytes.is_empty() {
        return Err(ValidationError::MissingFile);
    }
    if upload.bytes.len() as u64 > limits.max_file_bytes {
        return Err(ValidationError::FileTooLarge {
            max_bytes: limits.max_file_bytes,
        });
    }
    DocumentKind::from_mime(&upload.mime_type)
        .ok_or_else(|| ValidationError::UnsupportedFileType(upload.mime_type.clone()))
}

// ============ Entry Points ============

async fn run_engine(
    ctx: &AppContext,
    text: String,
    analysis_type: AnalysisType,
    kind: RequestKind,
) -> Result<AnalysisResult, ApiError> {
    let engine = ctx.engine.clone();
    tokio::task::spawn_blocking(move || engine.analyze(&text, analysis_type))
        .await
        .map_err(|e| ApiError::internal(kind, format!("analysis task failed: {}", e)))?
        .map_err(|e| ApiError::detection(kind, e))
}

/// Hand the result to the store; a storage failure leaves the result without id
async fn persist(ctx: &AppContext, mut result: AnalysisResult, file: Option<UploadedFileMeta>) -> AnalysisResult {
    let store = ctx.store.clone();
    let snapshot = result.clone();
    let outcome = tokio::task::spawn_blocking(move || store.persist(&snapshot, file.as_ref())).await;

    match outcome {
        Ok(Ok(id)) => result.id = Some(id),
        Ok(Err(StoreError::Disabled)) => debug!("[API] Storage disabled, result not persisted"),
        Ok(Err(e)) => warn!("[API] Failed to persist detection: {}", e),
        Err(e) => warn!("[API] Persistence task failed: {}", e),
    }
    result
}

pub async fn analyze_text(ctx: &AppContext, request: AnalyzeTextRequest) -> Result<AnalysisResult, ApiError> {
    let text = validate_text(request.text.as_deref(), &ctx.limits)?;
    let analysis_type = parse_analysis_type(request.analysis_type.as_deref())?;

    info!(
        "[API] {} analysis of a text of {} characters",
        analysis_type,
        text.chars().count()
    );

    let result = run_engine(ctx, text.to_string(), analysis_type, RequestKind::Text).await?;
    Ok(persist(ctx, result, None).await)
}

pub async fn analyze_file(ctx: &AppContext, upload: FileUpload) -> Result<FileAnalysisResponse, ApiError> {
    let kind = RequestKind::File;
    let analysis_type = match upload.analysis_type.as_deref() {
        None => AnalysisType::Quick,
        Some(raw) => parse_analysis_type(Some(raw))?,
    };
    validate_upload(&upload, &ctx.limits)?;

    let FileUpload {
        file_name,
        mime_type,
        bytes,
        ..
    } = upload;
    let file_size = bytes.len() as u64;

    info!(
        "[API] File analysis: {} ({}, {} bytes), type: {}",
        file_name, mime_type, file_size, analysis_type
    );

    let mime = mime_type.clone();
    let raw = tokio::task::spawn_blocking(move || extract_text(&mime, &bytes))
        .await
        .map_err(|e| ApiError::internal(kind, format!("extraction task failed: {}", e)))??;

    let extracted_chars = raw.trim().chars().count();
    if extracted_chars < ctx.limits.min_text_chars {
        return Err(ExtractionError::InsufficientText(extracted_chars).into());
    }

    let text = normalize_punctuation(&raw);
    validate_text(Some(&text), &ctx.limits)?;

    let result = run_engine(ctx, text.clone(), analysis_type, kind).await?;
    let extracted_text_length = text.chars().count();
    let meta = UploadedFileMeta {
        file_name: file_name.clone(),
        mime_type,
        file_size,
        extracted_text: text,
    };
    let result = persist(ctx, result, Some(meta)).await;

    Ok(FileAnalysisResponse {
        result,
        file_name,
        file_size,
        extracted_text_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::detection::{HeuristicConfig, IndicatorWeights};
    use crate::services::detection_store::MemoryDetectionStore;
    use crate::services::extraction::MIME_TXT;

    const SAMPLE: &str = "Premièrement, il est important de noter que le climat change. \
        Cependant, les solutions existent. Enfin, chacun peut agir à son niveau.";

    struct FailingStore;

    impl DetectionStore for FailingStore {
        fn persist(&self, _: &AnalysisResult, _: Option<&UploadedFileMeta>) -> Result<String, StoreError> {
            Err(StoreError::Unavailable("database offline".to_string()))
        }
    }

    fn context(store: Arc<dyn DetectionStore>) -> AppContext {
        let engine = DetectionEngine::with_defaults().unwrap();
        AppContext::new(Arc::new(engine), store, InputLimits::default())
    }

    fn text_request(text: &str, analysis_type: &str) -> AnalyzeTextRequest {
        AnalyzeTextRequest {
            text: Some(text.to_string()),
            analysis_type: Some(analysis_type.to_string()),
        }
    }

    fn txt_upload(text: &str) -> FileUpload {
        FileUpload {
            file_name: "essai.txt".to_string(),
            mime_type: MIME_TXT.to_string(),
            bytes: text.as_bytes().to_vec(),
            analysis_type: None,
        }
    }

    #[test]
    fn test_validate_text_bounds() {
        let limits = InputLimits::default();
        assert_eq!(validate_text(None, &limits), Err(ValidationError::MissingText));
        assert_eq!(validate_text(Some(""), &limits), Err(ValidationError::MissingText));
        assert_eq!(
            validate_text(Some("   court    "), &limits),
            Err(ValidationError::TextTooShort { min: 10 })
        );
        assert!(validate_text(Some("  dix lettre  "), &limits).is_ok());

        let long = "a".repeat(50_001);
        assert_eq!(
            validate_text(Some(&long), &limits),
            Err(ValidationError::TextTooLong { max: 50_000 })
        );
        assert!(validate_text(Some(&long[..50_000]), &limits).is_ok());
    }

    #[test]
    fn test_analysis_type_is_required_and_strict() {
        assert_eq!(parse_analysis_type(Some("advanced")), Ok(AnalysisType::Advanced));
        assert!(matches!(
            parse_analysis_type(None),
            Err(ValidationError::InvalidAnalysisType(_))
        ));
        assert!(matches!(
            parse_analysis_type(Some("deep")),
            Err(ValidationError::InvalidAnalysisType(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_text_persists_and_sets_id() {
        let store = Arc::new(MemoryDetectionStore::new());
        let ctx = context(store.clone());

        let result = analyze_text(&ctx, text_request(SAMPLE, "quick")).await.unwrap();

        assert_eq!(result.indicators.len(), 8);
        let tables = store.snapshot();
        assert_eq!(tables.detections.len(), 1);
        assert_eq!(result.id.as_deref(), Some(tables.detections[0].id.as_str()));
        assert_eq!(tables.indicators.len(), 8);
        assert_eq!(tables.sections.len(), result.sections.len());
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_the_result() {
        let ctx = context(Arc::new(FailingStore));
        let result = analyze_text(&ctx, text_request(SAMPLE, "advanced")).await.unwrap();
        assert!(result.id.is_none());
        assert_eq!(result.indicators.len(), 15);
    }

    #[tokio::test]
    async fn test_disabled_storage_keeps_the_result() {
        let ctx = context(Arc::new(NullDetectionStore));
        let result = analyze_text(&ctx, text_request(SAMPLE, "quick")).await.unwrap();
        assert!(result.id.is_none());
    }

    #[tokio::test]
    async fn test_invalid_request_runs_nothing() {
        let store = Arc::new(MemoryDetectionStore::new());
        let ctx = context(store.clone());

        let err = analyze_text(&ctx, text_request(SAMPLE, "deep")).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.user_message(), "Type d'analyse invalide");

        let err = analyze_text(&ctx, text_request("court", "quick")).await.unwrap_err();
        assert_eq!(err.user_message(), "Le texte doit contenir au moins 10 caractères");

        assert!(store.snapshot().detections.is_empty());
    }

    #[test]
    fn test_invalid_heuristics_rejected_at_startup() {
        let mut config = AppConfig::default();
        config.storage.enabled = false;
        config.heuristics.weights = IndicatorWeights {
            sentence_length: -9.0,
            ..IndicatorWeights::default()
        };
        assert!(matches!(
            AppContext::from_config(&config),
            Err(DetectionError::InvalidConfig(_))
        ));

        let mut config = AppConfig::default();
        config.storage.enabled = false;
        config.heuristics = HeuristicConfig {
            chaining_marker: String::new(),
            ..HeuristicConfig::default()
        };
        assert!(AppContext::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_analyze_txt_file() {
        let store = Arc::new(MemoryDetectionStore::new());
        let ctx = context(store.clone());

        let response = analyze_file(&ctx, txt_upload(SAMPLE)).await.unwrap();

        assert_eq!(response.file_name, "essai.txt");
        assert_eq!(response.file_size, SAMPLE.len() as u64);
        assert_eq!(response.extracted_text_length, SAMPLE.chars().count());
        assert_eq!(response.result.analysis_type, AnalysisType::Quick);
        assert_eq!(response.result.original_text, SAMPLE);
        for section in &response.result.sections {
            assert_eq!(
                &response.result.original_text[section.start_position..section.end_position],
                section.text
            );
        }

        let tables = store.snapshot();
        assert_eq!(tables.files.len(), 1);
        assert_eq!(tables.files[0].filename, "essai.txt");
        assert_eq!(tables.files[0].file_type, MIME_TXT);
    }

    #[tokio::test]
    async fn test_file_analysis_is_deterministic() {
        let ctx = context(Arc::new(NullDetectionStore));
        let first = analyze_file(&ctx, txt_upload(SAMPLE)).await.unwrap();
        let second = analyze_file(&ctx, txt_upload(SAMPLE)).await.unwrap();
        assert_eq!(first.result.ai_probability, second.result.ai_probability);
        let scores = |r: &FileAnalysisResponse| r.result.indicators.iter().map(|i| i.score).collect::<Vec<_>>();
        assert_eq!(scores(&first), scores(&second));
    }

    #[tokio::test]
    async fn test_file_matches_text_analysis() {
        let ctx = context(Arc::new(NullDetectionStore));
        let from_file = analyze_file(&ctx, txt_upload(SAMPLE)).await.unwrap();
        let from_text = analyze_text(&ctx, text_request(SAMPLE, "quick")).await.unwrap();
        assert_eq!(from_file.result.ai_probability, from_text.ai_probability);
        assert_eq!(from_file.result.sections, from_text.sections);
    }

    #[tokio::test]
    async fn test_file_validation() {
        let ctx = AppContext::new(
            Arc::new(DetectionEngine::with_defaults().unwrap()),
            Arc::new(NullDetectionStore),
            InputLimits {
                max_file_bytes: 16,
                ..InputLimits::default()
            },
        );

        let err = analyze_file(&ctx, txt_upload(SAMPLE)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::FileTooLarge { .. })));

        let mut image = txt_upload("0123456789");
        image.mime_type = "image/png".to_string();
        let err = analyze_file(&ctx, image).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(matches!(err, ApiError::Validation(ValidationError::UnsupportedFileType(_))));

        let err = analyze_file(&ctx, txt_upload("")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::MissingFile)));
    }

    #[tokio::test]
    async fn test_file_without_enough_text() {
        let ctx = context(Arc::new(NullDetectionStore));
        let err = analyze_file(&ctx, txt_upload("  abc \n ")).await.unwrap_err();
        assert!(matches!(err, ApiError::Extraction(ExtractionError::InsufficientText(3))));
        assert_eq!(err.user_message(), "Impossible d'extraire le texte du fichier");
    }
}
