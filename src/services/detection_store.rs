// Detection Store
// Persists analysis results as four append-only record streams:
// detections, indicators, sections and uploaded files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::AnalysisResult;

pub const DETECTIONS_FILE: &str = "ai_detections.jsonl";
pub const INDICATORS_FILE: &str = "detection_indicators.jsonl";
pub const SECTIONS_FILE: &str = "text_sections.jsonl";
pub const UPLOADED_FILES_FILE: &str = "uploaded_files.jsonl";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage is disabled")]
    Disabled,
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Metadata of a file-origin analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileMeta {
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
    pub extracted_text: String,
}

pub trait DetectionStore: Send + Sync {
    /// Store the result and return the generated detection id.
    fn persist(&self, result: &AnalysisResult, file: Option<&UploadedFileMeta>) -> Result<String, StoreError>;
}

// ============ Records ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: String,
    pub original_text: String,
    pub analysis_type: String,
    pub ai_probability: f64,
    pub suspected_ai_agent: Option<String>,
    pub overall_score: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub id: String,
    pub detection_id: String,
    pub indicator_name: String,
    pub score: f64,
    pub description: String,
    pub weight: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: String,
    pub detection_id: String,
    pub section_text: String,
    pub start_position: usize,
    pub end_position: usize,
    pub suspicion_level: String,
    pub ai_probability: u8,
    pub reasoning: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFileRecord {
    pub id: String,
    pub detection_id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: u64,
    pub extracted_text: String,
    pub created_at: String,
}

/// Every row produced by one analysis, keyed by a fresh detection id
#[derive(Debug, Clone)]
pub struct DetectionRecords {
    pub detection: DetectionRecord,
    pub indicators: Vec<IndicatorRecord>,
    pub sections: Vec<SectionRecord>,
    pub file: Option<UploadedFileRecord>,
}

impl DetectionRecords {
    pub fn build(result: &AnalysisResult, file: Option<&UploadedFileMeta>) -> Self {
        let detection_id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();

        let indicators = result
            .indicators
            .iter()
            .map(|i| IndicatorRecord {
                id: Uuid::new_v4().to_string(),
                detection_id: detection_id.clone(),
                indicator_name: i.name.clone(),
                score: i.score,
                description: i.description.clone(),
                weight: i.weight,
                created_at: created_at.clone(),
            })
            .collect();

        let sections = result
            .sections
            .iter()
            .map(|s| SectionRecord {
                id: Uuid::new_v4().to_string(),
                detection_id: detection_id.clone(),
                section_text: s.text.clone(),
                start_position: s.start_position,
                end_position: s.end_position,
                suspicion_level: s.suspicion_level.as_str().to_string(),
                ai_probability: s.ai_probability,
                reasoning: s.reasoning.clone(),
                created_at: created_at.clone(),
            })
            .collect();

        let file = file.map(|f| UploadedFileRecord {
            id: Uuid::new_v4().to_string(),
            detection_id: detection_id.clone(),
            filename: f.file_name.clone(),
            file_type: f.mime_type.clone(),
            file_size: f.file_size,
            extracted_text: f.extracted_text.clone(),
            created_at: created_at.clone(),
        });

        let detection = DetectionRecord {
            id: detection_id,
            original_text: result.original_text.clone(),
            analysis_type: result.analysis_type.as_str().to_string(),
            ai_probability: result.ai_probability,
            suspected_ai_agent: result.suspected_agent.clone(),
            overall_score: result.ai_probability,
            created_at,
        };

        Self {
            detection,
            indicators,
            sections,
            file,
        }
    }
}

// ============ JSON Lines Store ============

pub struct JsonlDetectionStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlDetectionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn append<T: Serialize>(&self, file_name: &str, rows: &[T]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        for row in rows {
            serde_json::to_writer(&mut buf, row)?;
            buf.push(b'\n');
        }

        let path = self.dir.join(file_name);
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        file.write_all(&buf).map_err(io_err)
    }
}

impl DetectionStore for JsonlDetectionStore {
    fn persist(&self, result: &AnalysisResult, file: Option<&UploadedFileMeta>) -> Result<String, StoreError> {
        let records = DetectionRecords::build(result, file);

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("write lock poisoned".to_string()))?;

        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // Children first: a detection row implies its children were written
        self.append(INDICATORS_FILE, &records.indicators)?;
        self.append(SECTIONS_FILE, &records.sections)?;
        if let Some(ref f) = records.file {
            self.append(UPLOADED_FILES_FILE, std::slice::from_ref(f))?;
        }
        self.append(DETECTIONS_FILE, std::slice::from_ref(&records.detection))?;

        info!(
            "[STORE] Detection {} stored ({} indicators, {} sections)",
            records.detection.id,
            records.indicators.len(),
            records.sections.len()
        );
        Ok(records.detection.id)
    }
}

// ============ In-memory Store ============

#[derive(Debug, Default, Clone)]
pub struct MemoryTables {
    pub detections: Vec<DetectionRecord>,
    pub indicators: Vec<IndicatorRecord>,
    pub sections: Vec<SectionRecord>,
    pub files: Vec<UploadedFileRecord>,
}

#[derive(Default)]
pub struct MemoryDetectionStore {
    tables: Mutex<MemoryTables>,
}

impl MemoryDetectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MemoryTables {
        match self.tables.lock() {
            Ok(tables) => tables.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DetectionStore for MemoryDetectionStore {
    fn persist(&self, result: &AnalysisResult, file: Option<&UploadedFileMeta>) -> Result<String, StoreError> {
        let records = DetectionRecords::build(result, file);
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))?;

        tables.indicators.extend(records.indicators);
        tables.sections.extend(records.sections);
        tables.files.extend(records.file);
        let id = records.detection.id.clone();
        tables.detections.push(records.detection);
        Ok(id)
    }
}

/// Used when storage is turned off in the configuration.
pub struct NullDetectionStore;

impl DetectionStore for NullDetectionStore {
    fn persist(&self, _result: &AnalysisResult, _file: Option<&UploadedFileMeta>) -> Result<String, StoreError> {
        Err(StoreError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisType, Indicator, IndicatorKind, Section, SuspicionLevel};

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            id: None,
            ai_probability: 61.5,
            suspected_agent: Some("ChatGPT/GPT-4".to_string()),
            attribution: None,
            indicators: vec![
                Indicator::new(IndicatorKind::SentenceLength, 40.0, 1.2),
                Indicator::new(IndicatorKind::Transitions, 80.0, 1.3),
            ],
            sections: vec![Section {
                text: "Enfin il pleut".to_string(),
                start_position: 0,
                end_position: 14,
                suspicion_level: SuspicionLevel::Low,
                ai_probability: 25,
                reasoning: "Structure artificielle".to_string(),
            }],
            original_text: "Enfin il pleut.".to_string(),
            analysis_type: AnalysisType::Quick,
        }
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_jsonl_store_writes_all_streams() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlDetectionStore::new(dir.path().join("data"));
        let file = UploadedFileMeta {
            file_name: "essai.txt".to_string(),
            mime_type: "text/plain".to_string(),
            file_size: 15,
            extracted_text: "Enfin il pleut.".to_string(),
        };

        let id = store.persist(&sample_result(), Some(&file)).unwrap();

        let detections = read_lines(&store.dir().join(DETECTIONS_FILE));
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0]["id"], id.as_str());
        assert_eq!(detections[0]["suspected_ai_agent"], "ChatGPT/GPT-4");
        assert_eq!(detections[0]["analysis_type"], "quick");

        let indicators = read_lines(&store.dir().join(INDICATORS_FILE));
        assert_eq!(indicators.len(), 2);
        assert!(indicators.iter().all(|r| r["detection_id"] == id.as_str()));
        assert_eq!(indicators[0]["indicator_name"], "Longueur des phrases");

        let sections = read_lines(&store.dir().join(SECTIONS_FILE));
        assert_eq!(sections[0]["section_text"], "Enfin il pleut");
        assert_eq!(sections[0]["suspicion_level"], "low");

        let files = read_lines(&store.dir().join(UPLOADED_FILES_FILE));
        assert_eq!(files[0]["filename"], "essai.txt");
        assert_eq!(files[0]["file_size"], 15);
    }

    #[test]
    fn test_jsonl_store_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlDetectionStore::new(dir.path().to_path_buf());
        let first = store.persist(&sample_result(), None).unwrap();
        let second = store.persist(&sample_result(), None).unwrap();
        assert_ne!(first, second);
        assert_eq!(read_lines(&dir.path().join(DETECTIONS_FILE)).len(), 2);
        assert_eq!(read_lines(&dir.path().join(INDICATORS_FILE)).len(), 4);
        assert!(!dir.path().join(UPLOADED_FILES_FILE).exists());
    }

    #[test]
    fn test_memory_store_links_children() {
        let store = MemoryDetectionStore::new();
        let id = store.persist(&sample_result(), None).unwrap();
        let tables = store.snapshot();
        assert_eq!(tables.detections.len(), 1);
        assert_eq!(tables.detections[0].overall_score, 61.5);
        assert!(tables.indicators.iter().all(|r| r.detection_id == id));
        assert_eq!(tables.sections.len(), 1);
        assert!(tables.files.is_empty());
    }

    #[test]
    fn test_null_store_is_disabled() {
        assert!(matches!(
            NullDetectionStore.persist(&sample_result(), None),
            Err(StoreError::Disabled)
        ));
    }
}
