// API Errors
// Boundary error type and the user-facing messages it maps to

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::services::detection::DetectionError;
use crate::services::extraction::ExtractionError;

/// Rejected input; the message is shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Le texte est requis et doit être une chaîne de caractères")]
    MissingText,
    #[error("Le texte doit contenir au moins {min} caractères")]
    TextTooShort { min: usize },
    #[error("Le texte ne peut pas dépasser {} caractères", group_thousands(.max))]
    TextTooLong { max: usize },
    #[error("Type d'analyse invalide")]
    InvalidAnalysisType(String),
    #[error("Aucun fichier fourni")]
    MissingFile,
    #[error("Le fichier ne peut pas dépasser {}MB", .max_bytes / (1024 * 1024))]
    FileTooLarge { max_bytes: u64 },
    #[error("Type de fichier non supporté. Utilisez PDF, DOCX, DOC ou TXT.")]
    UnsupportedFileType(String),
}

/// French digit grouping: 50000 -> "50 000"
fn group_thousands(n: impl std::fmt::Display) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Which entry point failed; picks the generic message for internal errors
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Text,
    File,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Analysis error: {source}")]
    Detection {
        kind: RequestKind,
        #[source]
        source: DetectionError,
    },

    #[error("Internal error: {message}")]
    Internal { kind: RequestKind, message: String },
}

/// Serialized error body, `{"error": "..."}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn detection(kind: RequestKind, source: DetectionError) -> Self {
        Self::Detection { kind, source }
    }

    pub fn internal(kind: RequestKind, message: impl Into<String>) -> Self {
        Self::Internal {
            kind,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) | ApiError::Extraction(_) => 400,
            ApiError::Detection { .. } | ApiError::Internal { .. } => 500,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Extraction(_) => "extraction_error",
            ApiError::Detection { .. } => "analysis_error",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Message safe to show to the user; internal failures never leak details
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::Extraction(_) => "Impossible d'extraire le texte du fichier".to_string(),
            ApiError::Detection { kind, .. } | ApiError::Internal { kind, .. } => match kind {
                RequestKind::Text => "Erreur interne du serveur".to_string(),
                RequestKind::File => "Erreur lors du traitement du fichier".to_string(),
            },
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        error!(
            error_type = self.error_type(),
            status = self.status_code(),
            message = %self,
            "API error"
        );
        ErrorResponse {
            error: self.user_message(),
        }
    }
}
